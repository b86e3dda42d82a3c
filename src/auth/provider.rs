//! Wire boundary to the identity provider.
//!
//! [`IdentityProvider`] is a seam: the coordinator and session talk to
//! the trait, production uses [`HttpIdentityProvider`], and tests drop
//! in a scripted double that counts invocations.

use async_trait::async_trait;

use super::AuthError;
use super::credential::{ProfileInfo, TokenResponse};

/// Identity-provider endpoints and client registration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_uri: String,
    /// Space-delimited scope list.
    pub scopes: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::parley_cloud()
    }
}

impl ProviderConfig {
    /// Registration for the hosted Parley Cloud backend.
    pub fn parley_cloud() -> Self {
        Self {
            client_id: "4c1c8b1e-52f0-4f6e-9d3a-b8a7f0d2c955".to_string(),
            authorize_url: "https://id.parley.chat/oauth/authorize".to_string(),
            token_url: "https://id.parley.chat/oauth/token".to_string(),
            userinfo_url: "https://id.parley.chat/oauth/userinfo".to_string(),
            redirect_uri: "parley://oauth/callback".to_string(),
            scopes: "openid profile email chat:inference".to_string(),
        }
    }

    /// URL scheme the provider redirects back on (`parley` for the
    /// default `parley://oauth/callback`).
    pub fn redirect_scheme(&self) -> &str {
        self.redirect_uri
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .unwrap_or(&self.redirect_uri)
    }
}

/// The identity provider's three remote operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for tokens
    /// (`grant_type=authorization_code`).
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse, AuthError>;

    /// Trade a refresh token for fresh tokens
    /// (`grant_type=refresh_token`).
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    /// Fetch profile metadata with a bearer token.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileInfo, AuthError>;
}

/// Production implementation posting form-encoded grants over HTTPS.
pub struct HttpIdentityProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let resp = self
            .client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchangeFailed(format!("{status}: {text}")));
        }

        resp.json()
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(format!("bad token response: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
            ("client_id", &self.config.client_id),
            ("code_verifier", verifier),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.config.client_id),
        ])
        .await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProfileInfo, AuthError> {
        let resp = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Other(format!("userinfo request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::Other(format!("userinfo returned {status}")));
        }

        resp.json()
            .await
            .map_err(|e| AuthError::Other(format!("bad userinfo response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_parley_cloud() {
        let config = ProviderConfig::default();
        assert!(config.authorize_url.contains("id.parley.chat"));
        assert!(!config.client_id.is_empty());
    }

    #[test]
    fn redirect_scheme_from_custom_uri() {
        let config = ProviderConfig::parley_cloud();
        assert_eq!(config.redirect_scheme(), "parley");
    }

    #[test]
    fn scopes_are_space_delimited() {
        let config = ProviderConfig::parley_cloud();
        assert!(config.scopes.split(' ').count() > 1);
    }
}
