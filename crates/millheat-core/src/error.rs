// ── Core error types ──
//
// Errors surfaced by the session, fetch and control paths. Callers never
// see HTTP status codes or JSON parse failures directly; the
// `From<millheat_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authorization failed: {message}")]
    Authorization { message: String },

    #[error("Token refresh rejected: {message}")]
    Refresh { message: String },

    #[error("Refresh token expired at {expired_at_ms} ms; re-authorization required")]
    RefreshWindowExpired { expired_at_ms: i64 },

    #[error("No authenticated session")]
    NotAuthenticated,

    // ── Fetch / control errors ───────────────────────────────────────
    #[error("Inventory fetch failed: {message}")]
    Fetch { message: String },

    #[error("Setpoint change for device {device_id} failed: {message}")]
    Control { device_id: i64, message: String },

    // ── Transport errors (wrapped, not exposed raw) ──────────────────
    #[error("Cannot reach the Mill API: {reason}")]
    ConnectionFailed { reason: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// The vendor `errorCode`, when the envelope carried one.
        code: Option<i64>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("State persistence failed: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that need an operator to re-run the login flow.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::Authorization { .. } | Self::RefreshWindowExpired { .. } | Self::NotAuthenticated
        )
    }
}

/// A fact could not be handed to the bus transport.
#[derive(Debug, Error)]
#[error("Publish failed: {0}")]
pub struct PublishError(pub String);

// ── Conversion from transport-layer errors ───────────────────────────

impl From<millheat_api::Error> for CoreError {
    fn from(err: millheat_api::Error) -> Self {
        match err {
            millheat_api::Error::Authentication { message } => CoreError::Authorization { message },
            millheat_api::Error::Transport(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            millheat_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            millheat_api::Error::ClientSetup(message) => CoreError::Config { message },
            millheat_api::Error::Http { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {body}"),
                code: None,
                status: Some(status),
            },
            millheat_api::Error::Api { code, message } => CoreError::Api {
                message,
                code: Some(code),
                status: None,
            },
            millheat_api::Error::MissingData { endpoint } => CoreError::Api {
                message: format!("{endpoint} returned no data"),
                code: None,
                status: None,
            },
            millheat_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
