//! Shared passphrase handling.
//!
//! The workflow never stores the passphrase. It asks a [`PassphraseProvider`]
//! once per batch and hands the result to the cipher.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Result, SealError};

/// Environment variable read by [`EnvPassphrase::default`].
pub const PASSPHRASE_ENV: &str = "CONFSEAL_PASSPHRASE";

/// A passphrase for one batch.
pub enum Passphrase {
    /// Supplied by the caller and passed to the cipher
    Provided(SecretString),
    /// Left to the cipher tool, which prompts on the terminal itself
    Delegated,
}

impl Passphrase {
    /// Wrap a caller-supplied passphrase after validating it.
    pub fn provided(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_passphrase(&value)?;
        Ok(Self::Provided(SecretString::from(value)))
    }

    /// The secret, if one was supplied.
    pub fn secret(&self) -> Option<&str> {
        match self {
            Self::Provided(secret) => Some(secret.expose_secret()),
            Self::Delegated => None,
        }
    }

    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Delegated)
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provided(_) => write!(f, "Passphrase::Provided([REDACTED])"),
            Self::Delegated => write!(f, "Passphrase::Delegated"),
        }
    }
}

/// Reject passphrases the cipher tools would silently misuse.
///
/// Empty or whitespace-only values are refused, as are values containing a
/// newline (they are piped to external tools line-wise).
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(SealError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }
    if passphrase.contains('\n') || passphrase.contains('\r') {
        return Err(SealError::InvalidInput(
            "Passphrase cannot contain line breaks".to_string(),
        ));
    }
    Ok(())
}

/// Source of the shared passphrase.
pub trait PassphraseProvider {
    /// Obtain the passphrase for one batch.
    fn passphrase(&self) -> Result<Passphrase>;

    /// Short description for diagnostics, e.g. `env:CONFSEAL_PASSPHRASE`.
    fn describe(&self) -> String;
}

/// Reads the passphrase from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvPassphrase {
    var: String,
}

impl EnvPassphrase {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Value of the variable if set and non-blank.
    pub fn lookup(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

impl Default for EnvPassphrase {
    fn default() -> Self {
        Self::new(PASSPHRASE_ENV)
    }
}

impl PassphraseProvider for EnvPassphrase {
    fn passphrase(&self) -> Result<Passphrase> {
        let value = self.lookup().ok_or_else(|| {
            SealError::PassphraseUnavailable(format!("{} is not set", self.var))
        })?;
        Passphrase::provided(value)
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// A passphrase known up front (library callers, tests).
pub struct FixedPassphrase {
    value: SecretString,
}

impl FixedPassphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
        }
    }
}

impl PassphraseProvider for FixedPassphrase {
    fn passphrase(&self) -> Result<Passphrase> {
        Passphrase::provided(self.value.expose_secret().to_string())
    }

    fn describe(&self) -> String {
        "fixed".to_string()
    }
}

/// Lets the cipher tool ask the operator directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatedPassphrase;

impl PassphraseProvider for DelegatedPassphrase {
    fn passphrase(&self) -> Result<Passphrase> {
        Ok(Passphrase::Delegated)
    }

    fn describe(&self) -> String {
        "tool".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_passphrase() {
        assert!(validate_passphrase("correct horse").is_ok());
        assert!(validate_passphrase("").is_err());
        assert!(validate_passphrase("   ").is_err());
        assert!(validate_passphrase("two\nlines").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let passphrase = Passphrase::provided("hunter2-secret").unwrap();
        let debug = format!("{:?}", passphrase);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_fixed_provider() {
        let provider = FixedPassphrase::new("shared-secret");
        let passphrase = provider.passphrase().unwrap();
        assert_eq!(passphrase.secret(), Some("shared-secret"));
    }

    #[test]
    fn test_fixed_provider_rejects_blank() {
        let provider = FixedPassphrase::new("  ");
        assert!(matches!(
            provider.passphrase(),
            Err(SealError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_env_provider_missing_variable() {
        let provider = EnvPassphrase::new("CONFSEAL_TEST_UNSET_VARIABLE_7F3A");
        assert!(matches!(
            provider.passphrase(),
            Err(SealError::PassphraseUnavailable(_))
        ));
        assert_eq!(provider.describe(), "env:CONFSEAL_TEST_UNSET_VARIABLE_7F3A");
    }

    #[test]
    fn test_delegated_provider() {
        let passphrase = DelegatedPassphrase.passphrase().unwrap();
        assert!(passphrase.is_delegated());
        assert_eq!(passphrase.secret(), None);
    }
}
