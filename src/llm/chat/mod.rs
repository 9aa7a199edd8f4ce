pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ Completion, CompletionError, LlmConfig };
use self::openai::OpenAIChatClient;
use crate::models::chat::PromptMessage;

/// A chat-completion provider. One call per prompt sequence, no retries.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<Completion, CompletionError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, CompletionError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_requires_api_key() {
        let err = new_client(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, CompletionError::MissingApiKey));
    }

    #[test]
    fn new_client_applies_defaults() {
        let config = LlmConfig { api_key: Some("sk-test".into()), ..LlmConfig::default() };
        let client = new_client(&config).unwrap();
        assert_eq!(client.get_model(), "gpt-3.5-turbo");
        assert_eq!(client.get_base_url().as_deref(), Some("https://api.openai.com"));
    }
}
