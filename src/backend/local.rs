//! Unauthenticated backend for a local inference server.
//!
//! Speaks the same minimal chat shape as the cloud backend against an
//! Ollama-style endpoint. No credentials involved.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatBackend, ChatMessage};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";

pub struct LocalBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl LocalBackend {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn send(&self, transcript: &[ChatMessage]) -> Result<String> {
        let body = ApiRequest {
            model: &self.model,
            messages: transcript,
            stream: false,
        };

        let resp = self.client.post(self.chat_url()).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("local backend error ({status}): {text}");
        }

        let api_resp: ApiResponse = resp.json().await?;
        Ok(api_resp.message.content)
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}
