//! The authorization surface.
//!
//! The coordinator only needs "show this URL, give me the redirect
//! back". How the consent screen is hosted is someone else's problem;
//! [`BrowserPresenter`] is the terminal rendition.

use std::io::{self, Write};

use async_trait::async_trait;

use super::AuthError;

/// How a presented authorization attempt ended.
#[derive(Debug, Clone)]
pub enum PresentOutcome {
    /// The provider redirected back; carries the full redirect URL.
    Redirect(String),
    /// The user dismissed the surface without completing consent.
    Cancelled,
}

/// Presents an authorization URL and captures the redirect.
#[async_trait]
pub trait AuthorizationPresenter: Send + Sync {
    /// Show `url` to the user and wait for the provider to redirect to
    /// `redirect_scheme://…`, or for the user to give up.
    ///
    /// Returns [`AuthError::SessionFailedToStart`] only when the
    /// surface itself could not be brought up.
    async fn present(
        &self,
        url: &str,
        redirect_scheme: &str,
    ) -> Result<PresentOutcome, AuthError>;
}

/// Opens the system browser and reads the pasted redirect URL from the
/// terminal. Pressing enter on an empty line cancels.
pub struct BrowserPresenter;

#[async_trait]
impl AuthorizationPresenter for BrowserPresenter {
    async fn present(
        &self,
        url: &str,
        redirect_scheme: &str,
    ) -> Result<PresentOutcome, AuthError> {
        // Try to open the browser, silently ignore failures (headless/SSH).
        let _ = open::that(url);

        println!("Open this URL to authenticate:\n");
        println!("  {url}\n");
        print!("Paste the {redirect_scheme}:// redirect URL (empty line to cancel): ");
        io::stdout()
            .flush()
            .map_err(|e| AuthError::SessionFailedToStart(e.to_string()))?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .map_err(|e| AuthError::SessionFailedToStart(e.to_string()))?;

        let line = line.trim();
        if line.is_empty() {
            return Ok(PresentOutcome::Cancelled);
        }
        Ok(PresentOutcome::Redirect(line.to_string()))
    }
}
