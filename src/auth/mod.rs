//! Credential lifecycle management for the cloud backend.
//!
//! The pieces, leaf-first: [`pkce`] generates the verifier/challenge
//! pair, [`storage`] keeps one credential record per account at rest,
//! [`provider`] is the wire boundary to the identity provider,
//! [`presenter`] hands the authorization URL to the user and captures
//! the redirect, [`coordinator`] owns the in-flight flow state and the
//! token cache, and [`session`] is the facade the rest of the app talks
//! to (`sign_in` / `sign_out` / `bearer_token`).

pub mod coordinator;
pub mod credential;
pub mod pkce;
pub mod presenter;
pub mod provider;
pub mod session;
pub mod storage;

pub use coordinator::OAuthFlowCoordinator;
pub use credential::{Credential, ProfileInfo, TokenResponse};
pub use presenter::{AuthorizationPresenter, BrowserPresenter, PresentOutcome};
pub use provider::{HttpIdentityProvider, IdentityProvider, ProviderConfig};
pub use session::AuthSession;
pub use storage::{MemoryStore, SecretStore, SqliteStore};

/// Errors produced by the auth subsystem.
///
/// `Clone` so a single shared refresh outcome can be handed to every
/// concurrent waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// No valid credential and no way to get one without the user.
    #[error("authentication required — run /login")]
    AuthenticationRequired,

    /// The user dismissed the authorization surface. Never shown as a
    /// failure message.
    #[error("authorization cancelled")]
    Cancelled,

    /// Redirect was missing the code or carried a mismatched state.
    #[error("invalid authorization callback: {0}")]
    InvalidCallback(String),

    /// The authorization surface could not be started at all.
    #[error("authorization session failed to start: {0}")]
    SessionFailedToStart(String),

    /// `exchange_code` without a live verifier (stale or duplicate
    /// exchange attempt).
    #[error("no pending authorization to exchange")]
    MissingCodeVerifier,

    /// Non-2xx from the token endpoint, for exchange and refresh alike.
    #[error("token request failed: {0}")]
    TokenExchangeFailed(String),

    /// Secure-storage I/O or decode failure.
    #[error("credential store error: {0}")]
    Store(String),

    /// Anything else worth showing to the user.
    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Store(e.to_string())
    }
}
