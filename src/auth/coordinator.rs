//! The OAuth flow coordinator.
//!
//! Owns the three pieces of state that must never be touched
//! concurrently: the in-memory token cache, the single-slot PKCE
//! verifier for an in-flight authorization, and the pending-refresh
//! handle. All of it lives behind one `tokio::sync::Mutex`; the
//! interactive authorize flow has its own gate so waiting on the
//! browser never holds the state lock.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use super::AuthError;
use super::credential::Credential;
use super::pkce;
use super::presenter::{AuthorizationPresenter, PresentOutcome};
use super::provider::{IdentityProvider, ProviderConfig};

type SharedRefresh = Shared<BoxFuture<'static, Result<Credential, AuthError>>>;

#[derive(Default)]
struct FlowState {
    /// Cache serving `valid_token`. Overwritten by exchange/refresh.
    cached: Option<Credential>,
    /// Live verifier between `authenticate` and `exchange_code`.
    pending_verifier: Option<String>,
    /// At most one outstanding refresh; concurrent callers attach here.
    pending_refresh: Option<SharedRefresh>,
}

/// Serialized-access owner of the credential flow.
pub struct OAuthFlowCoordinator {
    config: ProviderConfig,
    provider: Arc<dyn IdentityProvider>,
    presenter: Arc<dyn AuthorizationPresenter>,
    state: Arc<Mutex<FlowState>>,
    /// Held across the whole interactive authorize flow: a second
    /// `authenticate` queues behind the first instead of interleaving
    /// with the single-slot verifier.
    flow_gate: Mutex<()>,
}

impl OAuthFlowCoordinator {
    pub fn new(
        config: ProviderConfig,
        provider: Arc<dyn IdentityProvider>,
        presenter: Arc<dyn AuthorizationPresenter>,
    ) -> Self {
        Self {
            config,
            provider,
            presenter,
            state: Arc::new(Mutex::new(FlowState::default())),
            flow_gate: Mutex::new(()),
        }
    }

    /// Run the interactive authorization step and return the code.
    ///
    /// On success the verifier is armed for the matching
    /// [`exchange_code`](Self::exchange_code) call; on any failure —
    /// cancellation included — the slot is left empty.
    pub async fn authenticate(&self) -> Result<String, AuthError> {
        let _flow = self.flow_gate.lock().await;

        let verifier = pkce::generate_verifier();
        let challenge = pkce::derive_challenge(&verifier);
        let state_value = pkce::generate_state();
        let url = build_authorize_url(&self.config, &challenge, &state_value)?;

        self.state.lock().await.pending_verifier = Some(verifier);

        let outcome = self
            .presenter
            .present(&url, self.config.redirect_scheme())
            .await;

        match outcome {
            Ok(PresentOutcome::Redirect(redirect)) => {
                match parse_redirect(&redirect, self.config.redirect_scheme(), &state_value) {
                    Ok(code) => {
                        tracing::debug!("authorization redirect accepted");
                        Ok(code)
                    }
                    Err(e) => {
                        self.state.lock().await.pending_verifier = None;
                        Err(e)
                    }
                }
            }
            Ok(PresentOutcome::Cancelled) => {
                tracing::debug!("authorization cancelled by user");
                self.state.lock().await.pending_verifier = None;
                Err(AuthError::Cancelled)
            }
            Err(e) => {
                self.state.lock().await.pending_verifier = None;
                Err(e)
            }
        }
    }

    /// Exchange an authorization code for a credential.
    ///
    /// Consumes the verifier armed by the immediately preceding
    /// `authenticate` — it is gone after this call whether the exchange
    /// succeeds or not, so a duplicate attempt fails deterministically.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, AuthError> {
        let verifier = self
            .state
            .lock()
            .await
            .pending_verifier
            .take()
            .ok_or(AuthError::MissingCodeVerifier)?;

        let resp = self.provider.exchange_code(code, &verifier).await?;
        let credential = Credential::from_response(resp, None);

        self.state.lock().await.cached = Some(credential.clone());
        tracing::info!("authorization code exchanged");
        Ok(credential)
    }

    /// Refresh the cached credential, de-duplicating concurrent calls.
    ///
    /// The first caller spawns the network call on its own task and
    /// parks a shared handle; everyone else attaches to that handle and
    /// observes the same outcome. The task itself clears the handle and
    /// updates the cache, so an awaiting caller being cancelled cannot
    /// leave either inconsistent.
    pub async fn refresh(&self) -> Result<Credential, AuthError> {
        let pending = {
            let mut state = self.state.lock().await;
            if let Some(pending) = state.pending_refresh.clone() {
                pending
            } else {
                let refresh_token = state
                    .cached
                    .as_ref()
                    .and_then(|c| c.refresh_token.clone())
                    .ok_or(AuthError::AuthenticationRequired)?;

                let provider = Arc::clone(&self.provider);
                let state_handle = Arc::clone(&self.state);
                let task = tokio::spawn(async move {
                    let result = match provider.refresh(&refresh_token).await {
                        Ok(resp) => Ok(Credential::from_response(resp, Some(refresh_token))),
                        Err(e) => {
                            tracing::warn!("token refresh failed: {e}");
                            Err(e)
                        }
                    };
                    let mut state = state_handle.lock().await;
                    state.pending_refresh = None;
                    if let Ok(credential) = &result {
                        state.cached = Some(credential.clone());
                        tracing::info!("access token refreshed");
                    }
                    result
                });

                let pending: SharedRefresh = async move {
                    task.await
                        .unwrap_or_else(|e| Err(AuthError::Other(format!("refresh task: {e}"))))
                }
                .boxed()
                .shared();

                state.pending_refresh = Some(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// Return the cached credential if still valid; attach to a
    /// pending refresh if one is in flight; otherwise the caller must
    /// re-authenticate. Never starts a refresh on its own.
    pub async fn valid_token(&self) -> Result<Credential, AuthError> {
        let pending = {
            let state = self.state.lock().await;
            if let Some(credential) = &state.cached
                && credential.is_valid()
            {
                return Ok(credential.clone());
            }
            state.pending_refresh.clone()
        };

        match pending {
            Some(pending) => pending.await,
            None => Err(AuthError::AuthenticationRequired),
        }
    }

    /// Seed the cache with a credential restored from storage.
    pub async fn restore(&self, credential: Credential) {
        self.state.lock().await.cached = Some(credential);
    }

    /// Drop all in-memory flow state (sign-out).
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.cached = None;
        state.pending_verifier = None;
        state.pending_refresh = None;
    }
}

/// Build the provider's authorization URL with PKCE parameters.
fn build_authorize_url(
    config: &ProviderConfig,
    challenge: &str,
    state: &str,
) -> Result<String, AuthError> {
    let mut url = reqwest::Url::parse(&config.authorize_url)
        .map_err(|e| AuthError::Other(format!("bad authorize URL: {e}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scopes)
        .append_pair("code_challenge", challenge)
        .append_pair("code_challenge_method", "S256")
        .append_pair("state", state);
    Ok(url.to_string())
}

/// Validate a redirect URL and extract the authorization code.
fn parse_redirect(
    redirect: &str,
    expected_scheme: &str,
    expected_state: &str,
) -> Result<String, AuthError> {
    let url = reqwest::Url::parse(redirect)
        .map_err(|_| AuthError::InvalidCallback("unparseable redirect URL".to_string()))?;

    if url.scheme() != expected_scheme {
        return Err(AuthError::InvalidCallback(format!(
            "unexpected scheme {:?}",
            url.scheme()
        )));
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    match state {
        Some(s) if s == expected_state => {}
        _ => return Err(AuthError::InvalidCallback("state mismatch".to_string())),
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing code".to_string()))
}
