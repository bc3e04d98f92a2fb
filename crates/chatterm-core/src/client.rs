use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{ChatBackend, ExchangeReply};
use crate::error::ChatError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the chat service's `/reset` and `/chat` endpoints
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn reset(&self) -> Result<(), ChatError> {
        let url = format!("{}/reset", self.base_url);

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status().as_u16()));
        }

        Ok(())
    }

    async fn exchange(&self, message: &str) -> Result<ExchangeReply, ChatError> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        // The service reports failures in the body, so the status is only logged.
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, "chat service answered with non-success status");
        }

        let body = response.text().await?;
        parse_reply(&body)
    }
}

/// Interpret a `/chat` body. An `error` field wins over `response`.
fn parse_reply(body: &str) -> Result<ExchangeReply, ChatError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::MalformedReply(e.to_string()))?;

    match (parsed.error, parsed.response) {
        (Some(error), _) if !error.is_empty() => Ok(ExchangeReply::Failed(error)),
        (_, Some(response)) => Ok(ExchangeReply::Reply(response)),
        _ => Err(ChatError::MalformedReply(
            "reply has neither `response` nor `error`".to_string(),
        )),
    }
}
