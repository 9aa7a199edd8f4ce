pub mod store;
pub mod terminal;

use async_trait::async_trait;
use log::error;
use reqwest::Client as HttpClient;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::models::chat::{ ChatResponse, ErrorBody, HealthResponse, PromptMessage };

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Message cannot be empty")]
    EmptyInput,

    /// Non-2xx answer; `message` is the server's `error` field when it sent one.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Where the conversation store sends its turns.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(
        &self,
        message: &str,
        history: &[PromptMessage]
    ) -> Result<ChatResponse, ClientError>;
}

#[derive(Serialize)]
struct OutgoingChat<'a> {
    message: &'a str,
    messages: &'a [PromptMessage],
}

/// HTTP client for the `/api` endpoints of a chatpad server.
#[derive(Clone)]
pub struct ChatApi {
    http: HttpClient,
    api_base: Url,
}

impl ChatApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http: HttpClient::new(), api_base: base.join("api/")? })
    }

    pub fn endpoint(&self, name: &str) -> Result<Url, ClientError> {
        Ok(self.api_base.join(name)?)
    }

    pub async fn health_check(&self) -> Result<HealthResponse, ClientError> {
        let result = self.fetch_health().await;
        if let Err(e) = &result {
            error!("Health check error: {}", e);
        }
        result
    }

    async fn fetch_health(&self) -> Result<HealthResponse, ClientError> {
        let resp = self.http.get(self.endpoint("health")?).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(ClientError::Server {
                status,
                message: format!("HTTP error! status: {}", status),
            });
        }
        Ok(resp.json::<HealthResponse>().await?)
    }

    async fn post_chat(
        &self,
        message: &str,
        history: &[PromptMessage]
    ) -> Result<ChatResponse, ClientError> {
        let resp = self.http
            .post(self.endpoint("chat")?)
            .json(&(OutgoingChat { message, messages: history }))
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<ErrorBody>().await.ok();
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: body
                    .map(|b| b.error)
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16())),
            });
        }
        Ok(resp.json::<ChatResponse>().await?)
    }
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn send_message(
        &self,
        message: &str,
        history: &[PromptMessage]
    ) -> Result<ChatResponse, ClientError> {
        let result = self.post_chat(message, history).await;
        if let Err(e) = &result {
            error!("Chat API error: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    #[test]
    fn endpoints_resolve_under_api_prefix() {
        let api = ChatApi::new("http://localhost:3001").unwrap();
        assert_eq!(api.endpoint("chat").unwrap().as_str(), "http://localhost:3001/api/chat");

        let nested = ChatApi::new("https://example.com/chatpad").unwrap();
        assert_eq!(nested.endpoint("health").unwrap().as_str(), "https://example.com/chatpad/api/health");
    }

    #[test]
    fn rejects_unparseable_server_url() {
        assert!(matches!(ChatApi::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn posts_message_with_role_content_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "message": "and you?",
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "fine" })))
            .expect(1)
            .mount(&server).await;

        let api = ChatApi::new(&server.uri()).unwrap();
        let history = vec![PromptMessage::user("hi"), PromptMessage::assistant("hello")];
        let resp = api.send_message("and you?", &history).await.unwrap();
        assert_eq!(resp, ChatResponse { message: "fine".into(), usage: None });
    }

    #[tokio::test]
    async fn surfaces_server_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid OpenAI API key" })))
            .mount(&server).await;

        let err = ChatApi::new(&server.uri()).unwrap().send_message("hi", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid OpenAI API key");
        assert!(matches!(err, ClientError::Server { status: 401, .. }));
    }

    #[tokio::test]
    async fn falls_back_to_status_text_without_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server).await;

        let err = ChatApi::new(&server.uri()).unwrap().send_message("hi", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }

    #[tokio::test]
    async fn health_check_reads_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK", "timestamp": "2026-01-01T00:00:00.000Z"
            })))
            .mount(&server).await;

        let health = ChatApi::new(&server.uri()).unwrap().health_check().await.unwrap();
        assert_eq!(health.status, "OK");
    }
}
