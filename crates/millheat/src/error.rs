//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use millheat_config::ConfigError;
use millheat_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Could not reach the Mill API")]
    #[diagnostic(
        code(millheat::connection_failed),
        help("Check network access to the Mill cloud and api.base_url in config.toml.")
    )]
    ConnectionFailed { reason: String },

    #[error("Authorization with the Mill API failed: {message}")]
    #[diagnostic(
        code(millheat::auth_failed),
        help(
            "Verify account.username, the password and the API keys issued at registration.\n\
             Then run: millheat login"
        )
    )]
    AuthFailed { message: String },

    #[error("Missing configuration: {field}")]
    #[diagnostic(
        code(millheat::missing_config),
        help(
            "Set it in {path}, or via MILLHEAT_{env} in the environment.\n\
             Secrets may also live in the system keyring under service 'millheat'."
        )
    )]
    Missing {
        field: String,
        env: String,
        path: String,
    },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(millheat::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(millheat::config))]
    Config(ConfigError),

    #[error("Could not persist bridge state: {message}")]
    #[diagnostic(code(millheat::state), help("Check that the work directory is writable."))]
    State { message: String },

    #[error(transparent)]
    #[diagnostic(code(millheat::core))]
    Core(CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Missing { .. } | Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::State { .. } | Self::Core(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }

    pub fn from_config(err: ConfigError, path: &std::path::Path) -> Self {
        match err {
            ConfigError::Missing { field } => Self::Missing {
                env: field.replace('.', "__").to_uppercase(),
                field,
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authorization { message } | CoreError::Refresh { message } => {
                CliError::AuthFailed { message }
            }
            err @ (CoreError::RefreshWindowExpired { .. } | CoreError::NotAuthenticated) => {
                CliError::AuthFailed {
                    message: err.to_string(),
                }
            }
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::Store { message } => CliError::State { message },
            CoreError::Config { message } => CliError::Validation {
                field: "api".into(),
                reason: message,
            },
            other => CliError::Core(other),
        }
    }
}
