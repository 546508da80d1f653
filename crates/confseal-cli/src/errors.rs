//! CLI error types for structured error handling.
//!
//! Handlers return these inside `anyhow::Error`; `main` downcasts to pick
//! the exit code.

use std::fmt;

use confseal_core::{Direction, SealError};

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config file, config directory)
    NotFound { message: String, hint: String },

    /// No usable passphrase
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// Verification found sealed files that disagree with the plaintext
    IntegrityFailed { mismatched: usize, total: usize },

    /// Some files in a batch failed
    PartialFailure {
        direction: Direction,
        failed: usize,
        total: usize,
    },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::IntegrityFailed { mismatched, total } => {
                write!(f, "{} of {} sealed files did not verify", mismatched, total)
            }
            CliError::PartialFailure {
                direction,
                failed,
                total,
            } => write!(f, "Failed to {} {} of {} files", direction, failed, total),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::IntegrityFailed { .. } => exit_codes::INTEGRITY_FAILED,
            CliError::PartialFailure { .. } => exit_codes::PARTIAL_FAILURE,
        }
    }
}

/// Exit code for an error bubbling out of `run`.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(cli_error) = error.downcast_ref::<CliError>() {
        return cli_error.exit_code();
    }
    if let Some(seal_error) = error.downcast_ref::<SealError>() {
        return match seal_error {
            SealError::DirectoryNotFound(_) => exit_codes::NOT_FOUND,
            SealError::PassphraseUnavailable(_) | SealError::IncorrectPassphrase => {
                exit_codes::AUTH_FAILED
            }
            SealError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            _ => 1,
        };
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_partial_failure_message_and_code() {
        let err = CliError::PartialFailure {
            direction: Direction::Decrypt,
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "Failed to decrypt 1 of 3 files");
        assert_eq!(err.exit_code(), exit_codes::PARTIAL_FAILURE);
    }

    #[test]
    fn test_exit_code_for_wrapped_errors() {
        let err = anyhow::Error::new(CliError::not_found("missing", "Hint: create it"));
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);

        let err = anyhow::Error::new(SealError::DirectoryNotFound(PathBuf::from("config")));
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
