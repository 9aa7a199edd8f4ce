use crate::llm::chat::ChatClient;
use crate::llm::CompletionError;
use crate::models::chat::{ ChatRequest, ChatResponse, PromptMessage };

use log::{ info, error };
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Message is required")]
    Validation,

    #[error("Invalid OpenAI API key")]
    Auth,

    #[error("{0}")]
    Upstream(String),
}

impl From<CompletionError> for GatewayError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Auth => GatewayError::Auth,
            other => GatewayError::Upstream(other.to_string()),
        }
    }
}

/// Stateless front of the completion provider. Every call is independent;
/// the only memory is the history the caller sends along.
#[derive(Clone)]
pub struct CompletionGateway {
    chat_client: Arc<dyn ChatClient>,
    system_prompt: String,
}

impl CompletionGateway {
    pub fn new(chat_client: Arc<dyn ChatClient>, system_prompt: impl Into<String>) -> Self {
        Self { chat_client, system_prompt: system_prompt.into() }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, GatewayError> {
        let message = match request.message {
            Some(m) if !m.is_empty() => m,
            _ => return Err(GatewayError::Validation),
        };
        let history = request.messages.unwrap_or_default();
        info!("Chat request: {} history messages", history.len());

        let prompt = build_prompt(&self.system_prompt, history, message);
        let completion = self.chat_client.complete(&prompt).await.map_err(|e| {
            error!("Error calling OpenAI API: {}", e);
            GatewayError::from(e)
        })?;

        Ok(ChatResponse { message: completion.text, usage: completion.usage })
    }
}

/// System directive, then caller history verbatim, then the new user turn.
pub fn build_prompt(
    system_prompt: &str,
    history: Vec<PromptMessage>,
    message: String
) -> Vec<PromptMessage> {
    let mut prompt = Vec::with_capacity(history.len() + 2);
    prompt.push(PromptMessage::system(system_prompt));
    prompt.extend(history);
    prompt.push(PromptMessage::user(message));
    prompt
}
