use clap::Parser;

use crate::gateway::DEFAULT_SYSTEM_PROMPT;
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Interface the HTTP server binds to.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[arg(long, env = "PORT", default_value = "3001")]
    pub port: u16,

    // --- Chat LLM Provider Args ---
    /// API key for the OpenAI chat completion API.
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL for the chat completion API (e.g., https://api.openai.com or a compatible proxy)
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub chat_base_url: String,

    /// Model name for chat completion.
    #[arg(long, env = "CHAT_MODEL", default_value = DEFAULT_MODEL)]
    pub chat_model: String,

    /// Token cap for each reply.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1000")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Directive prepended to every conversation.
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    // --- TLS Args ---
    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: Some(self.openai_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: Some(self.chat_model.clone()),
            base_url: Some(self.chat_base_url.clone()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal chat client for a chatpad server", long_about = None)]
pub struct ClientArgs {
    /// Base URL of the chatpad server.
    #[arg(long, env = "CHATPAD_SERVER_URL", default_value = "http://localhost:3001")]
    pub server_url: String,
}
