//! PKCE verifier/challenge generation and the per-attempt CSRF state.
//!
//! Pure functions over the process RNG. The verifier is single-use:
//! [`crate::auth::coordinator::OAuthFlowCoordinator`] holds it between
//! `authenticate` and `exchange_code` and consumes it exactly once.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Generate a code verifier: 32 cryptographically random bytes,
/// base64url-encoded without padding.
pub fn generate_verifier() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Derive the S256 code challenge for a verifier: SHA-256 over the
/// verifier's UTF-8 bytes, base64url-encoded without padding.
pub fn derive_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate an unguessable `state` value for CSRF protection.
pub fn generate_state() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Check that a challenge matches a verifier.
pub fn verify_challenge(verifier: &str, challenge: &str) -> bool {
    derive_challenge(verifier) == challenge
}
