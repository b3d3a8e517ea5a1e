use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ChatError;

/// Request body for the chat endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
}

/// Response body from the chat endpoint. The `response` field is optional on
/// purpose: a success without it is benign, the caller substitutes a fallback.
#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    response: Option<String>,
}

/// The outbound seam of the request dispatcher. One call per accepted prompt;
/// `Ok(None)` means the server answered but omitted the reply field.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, ChatError>;
}

/// HTTP client for the assistant's completion server.
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    /// Create a new chat client for the given server.
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long generations
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, ChatError> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, body = %body, "chat endpoint returned an error");
            return Err(ChatError::Status { status, body });
        }

        let reply: ChatReply = serde_json::from_str(&body)?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_field_is_optional() {
        let full: ChatReply = serde_json::from_str(r#"{"response":"hi there"}"#).unwrap();
        assert_eq!(full.response.as_deref(), Some("hi there"));

        let empty: ChatReply = serde_json::from_str("{}").unwrap();
        assert!(empty.response.is_none());
    }

    #[test]
    fn request_serializes_single_prompt_field() {
        let body = serde_json::to_value(ChatRequest { prompt: "hello" }).unwrap();
        assert_eq!(body, serde_json::json!({ "prompt": "hello" }));
    }
}
