//! The hosted Parley Cloud backend.
//!
//! Every request carries a bearer token obtained from the auth
//! session; an expired token is refreshed transparently by
//! [`AuthSession::bearer_token`] before the request goes out.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthSession};

use super::{ChatBackend, ChatMessage};

const API_URL: &str = "https://api.parley.chat/v1/chat";
pub const DEFAULT_MODEL: &str = "parley-1";

pub struct CloudBackend {
    session: Arc<AuthSession>,
    model: String,
    api_url: String,
    client: reqwest::Client,
}

impl CloudBackend {
    pub fn new(session: Arc<AuthSession>, model: Option<String>) -> Self {
        Self {
            session,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for CloudBackend {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn send(&self, transcript: &[ChatMessage]) -> Result<String> {
        let token = match self.session.bearer_token().await {
            Ok(token) => token,
            Err(AuthError::AuthenticationRequired) => {
                bail!("not signed in to parley cloud — run /login")
            }
            Err(e) => bail!("could not get a bearer token: {e}"),
        };

        let body = ApiRequest {
            model: &self.model,
            messages: transcript,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("cloud backend error ({status}): {text}");
        }

        let api_resp: ApiResponse = resp.json().await?;
        if api_resp.message.content.is_empty() {
            bail!("cloud backend returned an empty reply");
        }
        Ok(api_resp.message.content)
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ApiResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}
