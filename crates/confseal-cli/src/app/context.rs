//! Application context for the confseal CLI.
//!
//! Provides a unified context that combines CLI arguments with the
//! lazily-loaded config file.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;

use confseal_core::{AgeCipher, Cipher, ConfigCodec, ConfigLayout, Direction, ExternalCipher};

use crate::cli::{BackendArg, Cli};
use crate::config::{CipherBackend, PassphraseSource};
use crate::errors::CliError;
use crate::ui::UiContext;

use super::passphrase::{passphrase_plan, PassphrasePlan};
use super::resolver::{load_config, missing_dir_error, resolve_config_dir, LoadedConfig};

/// Codec over whichever backend the config selects.
pub type DynCodec = ConfigCodec<Box<dyn Cipher>>;

/// Application context that bundles CLI args with the loaded config.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<LoadedConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Get the CLI arguments.
    pub fn cli(&self) -> &Cli {
        self.cli
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Prompts are allowed only with a terminal on stdin and no `--no-input`.
    pub fn interactive(&self) -> bool {
        !self.cli.no_input && std::io::stdin().is_terminal()
    }

    /// Build the UI context for a command.
    pub fn ui_context(&self, json: bool) -> UiContext {
        UiContext::from_env(json, self.cli.no_color, self.cli.ascii)
    }

    /// Get the config, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&LoadedConfig> {
        self.config.get_or_try_init(|| load_config(self.cli))
    }

    /// The config directory, whether or not it exists.
    pub fn config_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(resolve_config_dir(self.cli, self.config()?))
    }

    /// Layout for the config directory; fails when the directory is missing.
    pub fn layout(&self) -> anyhow::Result<ConfigLayout> {
        let dir = self.config_dir()?;
        if !dir.is_dir() {
            return Err(missing_dir_error(&dir).into());
        }
        let section = &self.config()?.config.layout;
        let layout = ConfigLayout::new(dir)
            .with_suffixes(&section.plaintext_suffix, &section.ciphertext_suffix)?
            .with_exclude(section.exclude.iter().cloned());
        Ok(layout)
    }

    pub fn backend(&self) -> anyhow::Result<CipherBackend> {
        Ok(match self.cli.backend {
            Some(BackendArg::External) => CipherBackend::External,
            Some(BackendArg::Age) => CipherBackend::Age,
            None => self.config()?.config.cipher.backend,
        })
    }

    pub fn cipher(&self) -> anyhow::Result<Box<dyn Cipher>> {
        let cipher: Box<dyn Cipher> = match self.backend()? {
            CipherBackend::External => Box::new(ExternalCipher::new(
                self.config()?.config.cipher.external_settings(),
            )?),
            CipherBackend::Age => Box::new(AgeCipher::new()),
        };
        Ok(cipher)
    }

    pub fn codec(&self) -> anyhow::Result<DynCodec> {
        let validate = self.config()?.config.layout.validate_plaintext;
        Ok(ConfigCodec::new(self.layout()?, self.cipher()?).with_plaintext_validation(validate))
    }

    pub fn passphrase_source(&self) -> anyhow::Result<PassphraseSource> {
        Ok(match self.cli.passphrase_source {
            Some(source) => source.into(),
            None => self.config()?.config.passphrase.source,
        })
    }

    /// Who operators should ask for the passphrase.
    pub fn contact(&self) -> anyhow::Result<&str> {
        Ok(self.config()?.config.passphrase.contact.as_str())
    }

    /// Passphrase provider for a run in `direction` (`None` for verify).
    pub fn passphrase_plan(&self, direction: Option<Direction>) -> anyhow::Result<PassphrasePlan> {
        let source = self.passphrase_source()?;
        if source == PassphraseSource::Tool && self.backend()? == CipherBackend::Age {
            return Err(CliError::invalid_input(
                "The age backend cannot ask for the passphrase itself; use the prompt, env, or keychain source",
            )
            .into());
        }
        let env_var = &self.config()?.config.passphrase.env_var;
        Ok(passphrase_plan(
            source,
            env_var,
            &self.config_dir()?,
            direction,
            self.interactive(),
        ))
    }
}
