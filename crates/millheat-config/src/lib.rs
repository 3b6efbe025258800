//! Configuration for the Mill heater bridge.
//!
//! TOML file plus environment overrides, secret resolution (env var,
//! keyring, plaintext), translation to `millheat_core::BridgeConfig`,
//! and the file-backed state store the daemon persists into.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use millheat_core::{AccountCredentials, BridgeConfig};

pub mod state;

pub use state::{FileStateStore, PersistedState};

/// Keyring service name for every stored secret.
const KEYRING_SERVICE: &str = "millheat";

pub const CONFIG_FILE: &str = "config.toml";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no value configured for {field}")]
    Missing { field: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("state file is not valid JSON: {0}")]
    State(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Minutes between poll ticks. Values below 1 are raised to 1.
    #[serde(default = "default_poll_minutes")]
    pub poll_minutes: u64,

    #[serde(default)]
    pub account: Account,

    #[serde(default)]
    pub mqtt: Mqtt,

    #[serde(default)]
    pub log: Log,

    #[serde(default)]
    pub api: Api,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_minutes: default_poll_minutes(),
            account: Account::default(),
            mqtt: Mqtt::default(),
            log: Log::default(),
            api: Api::default(),
        }
    }
}

fn default_poll_minutes() -> u64 {
    5
}

/// Mill account and API registration keys.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Account {
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Access key issued at API registration.
    pub access_key: Option<String>,

    /// Secret token issued at API registration.
    pub secret_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Mqtt {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    pub username: Option<String>,

    pub password: Option<String>,

    #[serde(default = "default_client_id")]
    pub client_id: String,
}

impl Default for Mqtt {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            username: None,
            password: None,
            client_id: default_client_id(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "millheat_ad".into()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Log {
    /// Default level directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Also write logs to this file.
    pub file: Option<PathBuf>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Api {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    BridgeConfig::default().api_url
}
fn default_timeout() -> u64 {
    30
}

// ── Paths ───────────────────────────────────────────────────────────

/// Default working directory via XDG / platform conventions.
pub fn default_work_dir() -> PathBuf {
    ProjectDirs::from("com", "thingsplex", "millheat")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.config_dir().to_path_buf())
}

pub fn config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CONFIG_FILE)
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load config from `<work_dir>/config.toml` and `MILLHEAT_*` env vars.
///
/// A missing file is not an error; defaults apply. Nested keys use a
/// double underscore, e.g. `MILLHEAT_ACCOUNT__USERNAME`.
pub fn load_config(work_dir: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path(work_dir)))
        .merge(Env::prefixed("MILLHEAT_").split("__"))
        .extract()?;
    Ok(config)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve one secret: named env var, then keyring, then plaintext.
fn resolve_secret(
    env_name: Option<&str>,
    keyring_user: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    // 1. Env var
    if let Some(name) = env_name {
        if let Ok(val) = std::env::var(name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, keyring_user) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    plaintext.map(|s| SecretString::from(s.to_owned()))
}

fn required(field: &str, value: Option<SecretString>) -> Result<SecretString, ConfigError> {
    value.ok_or_else(|| ConfigError::Missing {
        field: field.into(),
    })
}

/// Resolve the account material the login flow needs.
pub fn account_credentials(config: &Config) -> Result<AccountCredentials, ConfigError> {
    let account = &config.account;
    let username = account
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            field: "account.username".into(),
        })?;

    let password = required(
        "account.password",
        resolve_secret(
            account.password_env.as_deref(),
            &format!("{username}/password"),
            account.password.as_deref(),
        ),
    )?;
    let access_key = required(
        "account.access_key",
        resolve_secret(
            None,
            &format!("{username}/access-key"),
            account.access_key.as_deref(),
        ),
    )?;
    let secret_token = required(
        "account.secret_token",
        resolve_secret(
            None,
            &format!("{username}/secret-token"),
            account.secret_token.as_deref(),
        ),
    )?;

    Ok(AccountCredentials {
        username,
        password,
        access_key,
        secret_token,
    })
}

/// The MQTT broker password, if one is configured anywhere.
pub fn mqtt_password(config: &Config) -> Option<SecretString> {
    let user = config.mqtt.username.as_deref()?;
    resolve_secret(None, &format!("mqtt/{user}"), config.mqtt.password.as_deref())
}

/// Build the core runtime config.
pub fn to_bridge_config(config: &Config) -> Result<BridgeConfig, ConfigError> {
    let url: url::Url = config
        .api
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api.base_url".into(),
            reason: format!("invalid URL: {}", config.api.base_url),
        })?;
    if config.api.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            field: "api.timeout_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    Ok(BridgeConfig {
        api_url: url.to_string(),
        timeout: Duration::from_secs(config.api.timeout_secs),
        ..BridgeConfig::default()
    }
    .with_poll_minutes(config.poll_minutes))
}
