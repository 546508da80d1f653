//! Passphrase acquisition for the CLI.
//!
//! The core library only sees a [`PassphraseProvider`]; this module decides
//! which one to build from the configured source.

use std::path::Path;

use dialoguer::Password;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use confseal_core::{
    DelegatedPassphrase, Direction, EnvPassphrase, Passphrase, PassphraseProvider, SealError,
};

use crate::config::PassphraseSource;
use crate::security::{keychain_account, keychain_clear, keychain_get, keychain_set};

/// Environment variable first, then a hidden interactive prompt.
pub struct PromptPassphrase {
    env_var: String,
    interactive: bool,
    confirm: bool,
}

impl PromptPassphrase {
    pub fn new(env_var: impl Into<String>, interactive: bool, confirm: bool) -> Self {
        Self {
            env_var: env_var.into(),
            interactive,
            confirm,
        }
    }
}

impl PassphraseProvider for PromptPassphrase {
    fn passphrase(&self) -> confseal_core::Result<Passphrase> {
        if let Some(value) = EnvPassphrase::new(&self.env_var).lookup() {
            debug!(var = %self.env_var, "using passphrase from environment");
            return Passphrase::provided(value);
        }
        if !self.interactive {
            return Err(SealError::PassphraseUnavailable(format!(
                "No passphrase provided and no TTY available. Set {}.",
                self.env_var
            )));
        }

        let mut prompt = Password::new().with_prompt("Shared passphrase");
        if self.confirm {
            prompt = prompt.with_confirmation("Confirm passphrase", "Passphrases do not match");
        }
        let value = Zeroizing::new(prompt.interact().map_err(|e| {
            SealError::PassphraseUnavailable(format!("Failed to read passphrase: {}", e))
        })?);
        Passphrase::provided(value.as_str())
    }

    fn describe(&self) -> String {
        format!("prompt (or env:{})", self.env_var)
    }
}

/// Remembered in the OS keychain; asks once through the prompt otherwise.
pub struct KeychainPassphrase {
    account: String,
    fallback: PromptPassphrase,
}

impl KeychainPassphrase {
    pub fn new(config_dir: &Path, fallback: PromptPassphrase) -> Self {
        Self {
            account: keychain_account(config_dir),
            fallback,
        }
    }
}

impl PassphraseProvider for KeychainPassphrase {
    fn passphrase(&self) -> confseal_core::Result<Passphrase> {
        match keychain_get(&self.account) {
            Ok(Some(value)) => {
                let value = Zeroizing::new(value);
                debug!(account = %self.account, "using passphrase from keychain");
                return Passphrase::provided(value.as_str());
            }
            Ok(None) => {}
            Err(err) => warn!("{}", err),
        }

        let passphrase = self.fallback.passphrase()?;
        if let Some(secret) = passphrase.secret() {
            if let Err(err) = keychain_set(&self.account, secret) {
                warn!("{}", err);
            }
        }
        Ok(passphrase)
    }

    fn describe(&self) -> String {
        format!("keychain:{}", self.account)
    }
}

/// Provider for one run, plus the keychain handle when one is involved.
pub struct PassphrasePlan {
    pub provider: Box<dyn PassphraseProvider>,
    pub keychain: Option<KeychainAccount>,
}

/// Keychain entry that a failed decrypt may invalidate.
pub struct KeychainAccount(String);

impl KeychainAccount {
    /// Drop the remembered passphrase, e.g. after it failed to decrypt.
    pub fn forget(&self) -> anyhow::Result<()> {
        keychain_clear(&self.0)
    }
}

/// Build the provider for `source`.
///
/// Prompts ask for confirmation when encrypting, since a typo there would
/// seal files nobody can open.
pub fn passphrase_plan(
    source: PassphraseSource,
    env_var: &str,
    config_dir: &Path,
    direction: Option<Direction>,
    interactive: bool,
) -> PassphrasePlan {
    let confirm = matches!(direction, Some(Direction::Encrypt));
    match source {
        PassphraseSource::Prompt => PassphrasePlan {
            provider: Box::new(PromptPassphrase::new(env_var, interactive, confirm)),
            keychain: None,
        },
        PassphraseSource::Env => PassphrasePlan {
            provider: Box::new(EnvPassphrase::new(env_var)),
            keychain: None,
        },
        PassphraseSource::Keychain => {
            let provider = KeychainPassphrase::new(
                config_dir,
                PromptPassphrase::new(env_var, interactive, confirm),
            );
            let account = KeychainAccount(provider.account.clone());
            PassphrasePlan {
                provider: Box::new(provider),
                keychain: Some(account),
            }
        }
        PassphraseSource::Tool => PassphrasePlan {
            provider: Box::new(DelegatedPassphrase),
            keychain: None,
        },
    }
}
