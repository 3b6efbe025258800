// ── Session manager ──
//
// Sole owner and writer of the `Credential`. Readers take an `Arc`
// snapshot via `credential()` and keep using it for the whole operation,
// so a concurrent refresh can never hand them half of a token pair.

use std::sync::Arc;

use arc_swap::ArcSwap;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use millheat_api::MillClient;

use crate::error::CoreError;
use crate::lifecycle::Lifecycle;
use crate::model::{Credential, TokenAction};

/// Result of applying the refresh policy once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The current access token is still valid.
    Unchanged(Arc<Credential>),
    /// A refresh succeeded; use this credential from now on.
    Refreshed(Arc<Credential>),
    /// No session was ever established. No network call was made.
    Unauthenticated,
    /// The refresh call failed; the credential is now marked as such.
    /// The next tick tries again while the refresh window is open.
    RefreshFailed,
    /// The refresh token itself has lapsed. Only a new login helps.
    WindowExpired,
}

impl Freshness {
    /// The credential to use for this tick, if the session is usable.
    pub fn credential(&self) -> Option<&Arc<Credential>> {
        match self {
            Self::Unchanged(c) | Self::Refreshed(c) => Some(c),
            Self::Unauthenticated | Self::RefreshFailed | Self::WindowExpired => None,
        }
    }

    /// Whether only a new login can make the session usable again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::WindowExpired)
    }

    /// Whether the stored credential was rewritten and needs persisting.
    pub fn changed_credential(&self) -> bool {
        matches!(self, Self::Refreshed(_) | Self::RefreshFailed)
    }
}

/// Owns the token pair and the policy that keeps it fresh.
pub struct SessionManager {
    client: MillClient,
    credential: ArcSwap<Credential>,
    lifecycle: Lifecycle,
}

impl SessionManager {
    /// Start from a previously persisted credential (or `Credential::default()`).
    pub fn new(client: MillClient, credential: Credential, lifecycle: Lifecycle) -> Self {
        Self {
            client,
            credential: ArcSwap::from_pointee(credential),
            lifecycle,
        }
    }

    /// Snapshot of the current credential.
    pub fn credential(&self) -> Arc<Credential> {
        self.credential.load_full()
    }

    pub fn client(&self) -> &MillClient {
        &self.client
    }

    /// Obtain an authorization code with the keys issued at API registration.
    pub async fn request_authorization_code(
        &self,
        access_key: &SecretString,
        secret_token: &SecretString,
    ) -> Result<String, CoreError> {
        self.lifecycle.mark_auth_in_progress();
        self.client
            .apply_auth_code(access_key, secret_token)
            .await
            .map_err(|e| {
                error!(error = %e, "could not obtain an authorization code");
                self.lifecycle.mark_auth_failed();
                CoreError::Authorization {
                    message: e.to_string(),
                }
            })
    }

    /// Exchange an authorization code plus account credentials for a
    /// fresh credential, and make it current.
    pub async fn authorize(
        &self,
        auth_code: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Arc<Credential>, CoreError> {
        self.lifecycle.mark_auth_in_progress();
        match self
            .client
            .apply_access_token(auth_code, username, password)
            .await
        {
            Ok(grant) => {
                let credential = Arc::new(Credential::from_grant(grant));
                self.credential.store(Arc::clone(&credential));
                self.lifecycle.mark_authenticated();
                self.lifecycle.mark_connected();
                info!(
                    expire_time = credential.expire_time,
                    refresh_expire_time = credential.refresh_expire_time,
                    "authorized with the Mill API"
                );
                Ok(credential)
            }
            Err(e) => {
                error!(error = %e, username, "authorization with the Mill API failed");
                self.lifecycle.mark_auth_failed();
                Err(CoreError::Authorization {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Exchange a refresh token for a new credential. Does not store it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential, CoreError> {
        self.client
            .refresh_token(refresh_token)
            .await
            .map(Credential::from_grant)
            .map_err(|e| CoreError::Refresh {
                message: e.to_string(),
            })
    }

    /// Apply the refresh policy at `now_ms` (epoch milliseconds).
    ///
    /// At most one refresh call is made. Connection and auth state on
    /// the lifecycle are updated to match the outcome.
    pub async fn ensure_fresh(&self, now_ms: i64) -> Freshness {
        let current = self.credential();

        match current.action_at(now_ms) {
            TokenAction::Unauthenticated => {
                debug!("no session established; skipping token check");
                Freshness::Unauthenticated
            }
            TokenAction::Keep => {
                debug!(expire_time = current.expire_time, "access token still valid");
                Freshness::Unchanged(current)
            }
            TokenAction::Refresh => {
                debug!(
                    expire_time = current.expire_time,
                    status = %current.status,
                    "access token expired; refreshing"
                );
                match self.refresh(&current.refresh_token).await {
                    Ok(fresh) => {
                        let fresh = Arc::new(fresh);
                        self.credential.store(Arc::clone(&fresh));
                        self.lifecycle.mark_authenticated();
                        self.lifecycle.mark_connected();
                        info!(expire_time = fresh.expire_time, "access token refreshed");
                        Freshness::Refreshed(fresh)
                    }
                    Err(e) => {
                        warn!(error = %e, "token refresh failed; will retry next tick");
                        self.credential.store(Arc::new(current.refresh_failed()));
                        self.lifecycle.mark_disconnected();
                        Freshness::RefreshFailed
                    }
                }
            }
            TokenAction::WindowLapsed => {
                let err = CoreError::RefreshWindowExpired {
                    expired_at_ms: current.refresh_expire_time,
                };
                error!(
                    error = %err,
                    "refresh token has expired; restart the adapter or run `millheat login`"
                );
                self.lifecycle.mark_unauthenticated();
                Freshness::WindowExpired
            }
        }
    }
}
