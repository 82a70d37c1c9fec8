//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hotstate_config::ConfigError;
use hotstate_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Operations ───────────────────────────────────────────────────

    #[error("Sign-in rejected: {message}")]
    #[diagnostic(
        code(hotstate::auth_rejected),
        help("The demo auth service only accepts the account in [demo] email.\n\
              Run: hotstate config show")
    )]
    Rejected { message: String },

    #[error("Registration rejected: {message}")]
    #[diagnostic(
        code(hotstate::registration_rejected),
        help("The account in [demo] email already exists; register a different email.")
    )]
    RegistrationRejected { message: String },

    #[error("{operation} failed: {message}")]
    #[diagnostic(code(hotstate::operation_failed))]
    OperationFailed { operation: String, message: String },

    #[error("State stream ended: {message}")]
    #[diagnostic(code(hotstate::upstream))]
    Upstream { message: String },

    #[error("Screen was closed before it settled")]
    #[diagnostic(code(hotstate::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hotstate::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(hotstate::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(hotstate::config),
        help("Check the config file with: hotstate config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to encode output: {0}")]
    #[diagnostic(code(hotstate::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode config: {0}")]
    #[diagnostic(code(hotstate::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } | Self::RegistrationRejected { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Upstream(failure) => CliError::Upstream {
                message: failure.message().to_owned(),
            },
            CoreError::Cancelled => CliError::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use hotstate_core::Failure;

    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let rejected = CliError::Rejected {
            message: "bad password".into(),
        };
        assert_eq!(rejected.exit_code(), exit_code::AUTH);
        let taken = CliError::RegistrationRejected {
            message: "an account with this email already exists".into(),
        };
        assert_eq!(taken.exit_code(), exit_code::AUTH);

        let invalid = CliError::Validation {
            field: "email".into(),
            reason: "Email Not Valid".into(),
        };
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
        assert_eq!(CliError::Cancelled.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn core_errors_map_to_cli_errors() {
        let err = CliError::from(CoreError::Upstream(Failure::new("store offline")));
        assert_eq!(err.to_string(), "State stream ended: store offline");
        assert!(matches!(
            CliError::from(CoreError::Cancelled),
            CliError::Cancelled
        ));
    }
}
