//! The user-facing credential session.
//!
//! Wraps the coordinator with the two things the rest of the app
//! cares about: observable UI state (authenticated flag, profile,
//! last error) and persistence hooks. The secret itself stays with
//! the coordinator and the store; this type only projects it.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::AuthError;
use super::coordinator::OAuthFlowCoordinator;
use super::credential::ProfileInfo;
use super::provider::IdentityProvider;
use super::storage::SecretStore;

#[derive(Default)]
struct UiState {
    authenticated: bool,
    profile: Option<ProfileInfo>,
    last_error: Option<String>,
}

/// Session facade: `sign_in` / `sign_out` / `bearer_token`, plus the
/// observable state the REPL renders.
pub struct AuthSession {
    coordinator: Arc<OAuthFlowCoordinator>,
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn SecretStore>,
    account_id: String,
    ui: Mutex<UiState>,
}

impl AuthSession {
    pub fn new(
        coordinator: Arc<OAuthFlowCoordinator>,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn SecretStore>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            coordinator,
            provider,
            store,
            account_id: account_id.into(),
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn authenticated(&self) -> bool {
        self.ui.lock().unwrap().authenticated
    }

    pub fn profile(&self) -> Option<ProfileInfo> {
        self.ui.lock().unwrap().profile.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.ui.lock().unwrap().last_error.clone()
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Run the full interactive sign-in: authorize, exchange, persist,
    /// fetch profile.
    ///
    /// Cancellation returns [`AuthError::Cancelled`] with the session
    /// state untouched — callers must not render it as a failure. Any
    /// other error lands in `last_error` and leaves the session
    /// signed out.
    pub async fn sign_in(&self) -> Result<(), AuthError> {
        let code = match self.coordinator.authenticate().await {
            Ok(code) => code,
            Err(AuthError::Cancelled) => return Err(AuthError::Cancelled),
            Err(e) => return Err(self.record_failure(e)),
        };

        let credential = match self.coordinator.exchange_code(&code).await {
            Ok(credential) => credential,
            Err(e) => return Err(self.record_failure(e)),
        };

        if let Err(e) = self.store.store(&self.account_id, &credential) {
            return Err(self.record_failure(e));
        }

        let profile = self.fetch_profile(&credential.access_token).await;
        {
            let mut ui = self.ui.lock().unwrap();
            ui.authenticated = true;
            ui.profile = profile;
            ui.last_error = None;
        }
        info!(account = %self.account_id, "signed in");
        Ok(())
    }

    /// Delete the stored credential (best effort) and drop all session
    /// state.
    pub async fn sign_out(&self) {
        if let Err(e) = self.store.delete(&self.account_id) {
            warn!("could not delete stored credential: {e}");
        }
        self.coordinator.clear().await;
        let mut ui = self.ui.lock().unwrap();
        ui.authenticated = false;
        ui.profile = None;
        ui.last_error = None;
        info!(account = %self.account_id, "signed out");
    }

    /// A bearer token usable right now.
    ///
    /// Serves the cached token when valid, otherwise runs the
    /// (single-flight) refresh and persists its result. Refresh
    /// failure — including "no refresh token" — demotes the session to
    /// signed out and surfaces [`AuthError::AuthenticationRequired`];
    /// the caller prompts for re-login rather than retrying.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        match self.coordinator.valid_token().await {
            Ok(credential) => Ok(credential.access_token),
            Err(AuthError::AuthenticationRequired) => match self.coordinator.refresh().await {
                Ok(credential) => {
                    if let Err(e) = self.store.store(&self.account_id, &credential) {
                        // Cache stays authoritative; the next refresh
                        // retries the write.
                        warn!("could not persist refreshed credential: {e}");
                    }
                    self.ui.lock().unwrap().authenticated = true;
                    Ok(credential.access_token)
                }
                Err(_) => {
                    self.ui.lock().unwrap().authenticated = false;
                    Err(AuthError::AuthenticationRequired)
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Restore a persisted credential at startup.
    ///
    /// Never fails past this boundary: a missing, undecodable, or
    /// useless record means starting signed out, and broken records
    /// are deleted on the way.
    pub async fn load_stored_credential(&self) {
        let record = match self.store.retrieve(&self.account_id) {
            Ok(record) => record,
            Err(e) => {
                warn!("stored credential unreadable, discarding: {e}");
                if let Err(e) = self.store.delete(&self.account_id) {
                    warn!("could not delete broken credential record: {e}");
                }
                return;
            }
        };

        let Some(credential) = record else {
            debug!("no stored credential");
            return;
        };

        let valid = credential.is_valid();
        if !valid && credential.refresh_token.is_none() {
            debug!("stored credential expired and unrefreshable, discarding");
            if let Err(e) = self.store.delete(&self.account_id) {
                warn!("could not delete expired credential record: {e}");
            }
            return;
        }

        // Expired-but-refreshable records stay seeded so the first
        // bearer_token call can run the refresh.
        let access_token = credential.access_token.clone();
        self.coordinator.restore(credential).await;

        if valid {
            let profile = self.fetch_profile(&access_token).await;
            let mut ui = self.ui.lock().unwrap();
            ui.authenticated = true;
            ui.profile = profile;
            info!(account = %self.account_id, "restored session");
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Option<ProfileInfo> {
        match self.provider.fetch_profile(access_token).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("profile fetch failed: {e}");
                None
            }
        }
    }

    fn record_failure(&self, e: AuthError) -> AuthError {
        let mut ui = self.ui.lock().unwrap();
        ui.authenticated = false;
        ui.last_error = Some(e.to_string());
        e
    }
}
