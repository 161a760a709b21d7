use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::message::Message;

/// Failure categories a completion call can end in. Everything the transport
/// or the server can throw collapses into one of these three.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("invalid or rejected API key: {0}")]
    Auth(String),
    #[error("could not reach the API: {0}")]
    Connection(String),
    #[error("{0}")]
    Other(String),
}

/// The remote completion boundary: the full transcript in, one reply out.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        if config.api_key.trim().is_empty() {
            return Err(CompletionError::Auth("empty API key".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CompletionError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionApi for GroqClient {
    async fn complete(&self, messages: &[Message], model: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest { model, messages };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Auth(format!(
                "server returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Other(format!(
                "server returned {status}: {body}"
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Other(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Other("response contained no reply text".to_string()))
    }
}

fn classify_transport(err: reqwest::Error) -> CompletionError {
    if err.is_connect() || err.is_timeout() {
        CompletionError::Connection(err.to_string())
    } else {
        CompletionError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn request_body_matches_wire_format() {
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("Hello"),
        ];
        let request = ChatRequest {
            model: "llama3-8b-8192",
            messages: &messages,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn response_body_parses_reply_text() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content);
        assert_eq!(reply.as_deref(), Some("Hi there!"));
    }

    #[test]
    fn new_rejects_an_empty_key() {
        let config = Config::with_api_key("   ");
        assert!(matches!(
            GroqClient::new(&config),
            Err(CompletionError::Auth(_))
        ));
    }

    #[test]
    fn roundtrip_roles_serialize_lowercase() {
        let msg = Message::assistant("ok");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back.role, Role::Assistant);
    }
}
