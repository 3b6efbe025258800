use thiserror::Error;

/// Top-level error type for the `millheat-api` crate.
///
/// Covers every failure mode of a single vendor call: transport,
/// HTTP status, envelope decoding and vendor-reported error codes.
/// `millheat-core` maps these into session, fetch and control errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The vendor rejected the token or the account credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// Non-200 status from the vendor.
    #[error("Unexpected HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    // ── Vendor envelope ─────────────────────────────────────────────
    /// `errorCode` in the `{errorCode, message, ...}` envelope was non-zero.
    #[error("Mill API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Envelope decoded but the endpoint's `data` payload was absent.
    #[error("Response from {endpoint} carried no data")]
    MissingData { endpoint: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the vendor refused our credentials or token.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying on a later tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Extract the vendor error code, if available.
    pub fn api_error_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
