use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, StatusCode, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};

use super::ChatClient;
use crate::llm::{Completion, CompletionError, LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::models::chat::{PromptMessage, Usage};

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorPayload {
    error: Option<OpenAIApiError>,
}

#[derive(Deserialize)]
struct OpenAIApiError {
    message: String,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, CompletionError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| CompletionError::InvalidHeader(e.to_string()))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
            max_tokens,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.max_tokens,
            config.temperature,
        )
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }
}

/// Maps a non-success provider response to the gateway's error taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> CompletionError {
    if status == StatusCode::UNAUTHORIZED {
        return CompletionError::Auth;
    }
    let detail = serde_json::from_str::<OpenAIErrorPayload>(body)
        .ok()
        .and_then(|p| p.error)
        .map(|e| e.message);
    match detail {
        Some(message) => CompletionError::Upstream(format!("{} {}", status.as_u16(), message)),
        None => CompletionError::Upstream(format!("{} status code (no body)", status.as_u16())),
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<Completion, CompletionError> {
        let url = self.completions_url();
        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        debug!("POST {} with {} prompt messages", url, messages.len());

        let resp = self.http.post(&url).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(error_from_response(status, &body));
        }

        let resp = resp.json::<OpenAIResponse>().await?;
        let usage = resp.usage;
        let text = resp.choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Upstream("No response from OpenAI API".to_string()))?
            .message.content
            .unwrap_or_default();

        Ok(Completion { text, usage })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_partial_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn client_for(server: &MockServer) -> OpenAIChatClient {
        OpenAIChatClient::new("sk-test".into(), None, Some(server.uri()), 1000, 0.7).unwrap()
    }

    #[test]
    fn builds_completions_url_from_any_base() {
        let c = |base: &str| {
            OpenAIChatClient::new("k".into(), None, Some(base.into()), 1, 0.0).unwrap().completions_url()
        };
        assert_eq!(c("https://api.openai.com"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(c("https://api.openai.com/v1/"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(c("http://proxy/v1/chat/completions"), "http://proxy/v1/chat/completions");
    }

    #[tokio::test]
    async fn sends_fixed_parameters_and_reads_top_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1000,
                "temperature": 0.7,
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Hello!" } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
            })))
            .expect(1)
            .mount(&server).await;

        let prompt = vec![
            PromptMessage::system("You are a helpful assistant."),
            PromptMessage::user("hi"),
        ];
        let completion = client_for(&server).complete(&prompt).await.unwrap();

        assert_eq!(completion.text, "Hello!");
        assert_eq!(
            completion.usage,
            Some(Usage { prompt_tokens: 12, completion_tokens: 3, total_tokens: 15 })
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided: sk-test" }
            })))
            .mount(&server).await;

        let err = client_for(&server).complete(&[PromptMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, CompletionError::Auth));
    }

    #[tokio::test]
    async fn other_failures_carry_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached" }
            })))
            .mount(&server).await;

        let err = client_for(&server).complete(&[PromptMessage::user("hi")]).await.unwrap_err();
        match err {
            CompletionError::Upstream(msg) => assert_eq!(msg, "429 Rate limit reached"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server).await;

        let err = client_for(&server).complete(&[PromptMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, CompletionError::Upstream(ref m) if m == "No response from OpenAI API"));
    }
}
