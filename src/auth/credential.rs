//! The persisted credential record and the identity provider's wire types.

use serde::{Deserialize, Serialize};

/// Safety margin before the real expiry during which a token is already
/// treated as stale. A token reported valid stays usable for at least
/// this long.
pub const EXPIRY_MARGIN_MS: u64 = 5 * 60 * 1000;

/// Bearer credentials obtained from a code exchange or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    /// Absent for tokens that cannot be refreshed.
    pub refresh_token: Option<String>,
    /// Real expiry timestamp in milliseconds since epoch.
    pub expires_at: u64,
}

impl Credential {
    /// Build a credential from a token-endpoint response.
    ///
    /// If the provider omits a new refresh token, `prior_refresh` is
    /// retained so the credential stays refreshable.
    pub fn from_response(resp: TokenResponse, prior_refresh: Option<String>) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token.or(prior_refresh),
            expires_at: now_ms() + resp.expires_in * 1000,
        }
    }

    /// Whether the token is still usable: strictly before expiry minus
    /// the safety margin.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_ms())
    }

    /// Validity at an explicit clock reading, for boundary tests.
    pub fn is_valid_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at.saturating_sub(EXPIRY_MARGIN_MS)
    }
}

/// JSON body returned by the token endpoint for both grant types.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Non-secret profile metadata from the userinfo endpoint.
///
/// Re-fetched once per sign-in or startup with a valid token; never
/// persisted alongside the credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(expires_at: u64) -> Credential {
        Credential {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at,
        }
    }

    #[test]
    fn invalid_exactly_at_margin() {
        let c = cred(1_000_000_000);
        assert!(!c.is_valid_at(1_000_000_000 - EXPIRY_MARGIN_MS));
    }

    #[test]
    fn valid_one_second_before_margin() {
        let c = cred(1_000_000_000);
        assert!(c.is_valid_at(1_000_000_000 - EXPIRY_MARGIN_MS - 1000));
    }

    #[test]
    fn invalid_after_expiry() {
        let c = cred(1_000_000_000);
        assert!(!c.is_valid_at(1_000_000_001));
    }

    #[test]
    fn small_expiry_does_not_underflow() {
        let c = cred(1000);
        assert!(!c.is_valid_at(0));
    }

    #[test]
    fn from_response_keeps_new_refresh_token() {
        let resp = TokenResponse {
            access_token: "AT2".to_string(),
            refresh_token: Some("RT2".to_string()),
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };
        let c = Credential::from_response(resp, Some("RT1".to_string()));
        assert_eq!(c.refresh_token.as_deref(), Some("RT2"));
    }

    #[test]
    fn from_response_retains_prior_refresh_token_when_omitted() {
        let resp = TokenResponse {
            access_token: "AT2".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };
        let c = Credential::from_response(resp, Some("RT1".to_string()));
        assert_eq!(c.refresh_token.as_deref(), Some("RT1"));
    }

    #[test]
    fn from_response_fresh_token_is_valid() {
        let resp = TokenResponse {
            access_token: "AT1".to_string(),
            refresh_token: None,
            expires_in: 3600,
            token_type: "Bearer".to_string(),
        };
        assert!(Credential::from_response(resp, None).is_valid());
    }

    #[test]
    fn profile_decodes_with_optional_fields_missing() {
        let profile: ProfileInfo = serde_json::from_str(r#"{"sub": "user-1"}"#).unwrap();
        assert_eq!(profile.sub, "user-1");
        assert!(profile.name.is_none());
        assert!(profile.email.is_none());
    }
}
