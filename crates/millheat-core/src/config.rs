// ── Runtime bridge configuration ──
//
// These types describe how to reach the vendor and how often to poll.
// They carry credential data but never touch disk: `millheat-config`
// builds them and hands them in.

use std::time::Duration;

use secrecy::SecretString;

/// Vendor account material used by the login flow.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    /// Mill app account username.
    pub username: String,
    /// Mill app account password.
    pub password: SecretString,
    /// Access key issued at API registration.
    pub access_key: SecretString,
    /// Secret token issued at API registration.
    pub secret_token: SecretString,
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Vendor API root (e.g. `https://api.millheat.com/`).
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Period between poll ticks.
    pub poll_interval: Duration,
}

impl BridgeConfig {
    /// Build a config polling every `minutes` minutes (at least one).
    pub fn with_poll_minutes(mut self, minutes: u64) -> Self {
        self.poll_interval = Duration::from_secs(minutes.max(1) * 60);
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: millheat_api::DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5 * 60),
        }
    }
}
