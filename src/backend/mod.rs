pub mod cloud;
pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who said what in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language-model backend the REPL can route a conversation to.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short name for the banner and `/whoami`.
    fn name(&self) -> &str;

    /// Send the transcript, newest message last, and return the
    /// assistant's reply.
    async fn send(&self, transcript: &[ChatMessage]) -> Result<String>;
}
