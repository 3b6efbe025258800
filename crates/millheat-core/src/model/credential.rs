// ── Session credential ──
//
// The access/refresh token pair and its expiry bookkeeping. Expiry
// timestamps are epoch milliseconds as issued by the vendor. Session
// health is an explicit status instead of a magic expiry value.

use std::fmt;

use millheat_api::TokenGrant;
use serde::{Deserialize, Serialize};

/// Where the credential stands, independent of the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TokenStatus {
    /// No token pair was ever issued.
    #[default]
    NeverAuthenticated,
    /// The last exchange succeeded.
    Valid,
    /// The last refresh attempt was rejected; the access token is unusable
    /// until a later refresh succeeds.
    RefreshFailed,
}

/// What the refresh policy says to do with a credential at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// No session exists; nothing to refresh.
    Unauthenticated,
    /// Access token still good.
    Keep,
    /// Access token lapsed (or a refresh failed) inside the refresh window.
    Refresh,
    /// The refresh window itself has closed. Only a new login can recover.
    WindowLapsed,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, epoch ms. `0` until the first exchange.
    pub expire_time: i64,
    /// Refresh token expiry, epoch ms.
    pub refresh_expire_time: i64,
    #[serde(default)]
    pub status: TokenStatus,
}

impl Credential {
    /// A credential freshly issued by the vendor.
    pub fn from_grant(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expire_time: grant.expire_time,
            refresh_expire_time: grant.refresh_expire_time,
            status: TokenStatus::Valid,
        }
    }

    /// The same tokens, marked as failed to refresh.
    pub fn refresh_failed(&self) -> Self {
        Self {
            status: TokenStatus::RefreshFailed,
            ..self.clone()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status != TokenStatus::NeverAuthenticated && self.expire_time != 0
    }

    /// Apply the refresh policy at `now_ms`.
    ///
    /// Boundaries: the access token is good through `expire_time`
    /// inclusive; refresh is only attempted strictly before
    /// `refresh_expire_time`.
    pub fn action_at(&self, now_ms: i64) -> TokenAction {
        if !self.is_authenticated() {
            return TokenAction::Unauthenticated;
        }
        if self.status == TokenStatus::Valid && now_ms <= self.expire_time {
            return TokenAction::Keep;
        }
        if now_ms < self.refresh_expire_time {
            TokenAction::Refresh
        } else {
            TokenAction::WindowLapsed
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expire_time", &self.expire_time)
            .field("refresh_expire_time", &self.refresh_expire_time)
            .field("status", &self.status)
            .finish()
    }
}
