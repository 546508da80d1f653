use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use confseal_core::layout::{
    DEFAULT_CIPHERTEXT_SUFFIX, DEFAULT_DIR, DEFAULT_EXCLUDE, DEFAULT_PLAINTEXT_SUFFIX,
};
use confseal_core::passphrase::PASSPHRASE_ENV;
use confseal_core::ExternalCipherSettings;

/// Default value for `passphrase.contact`.
pub const DEFAULT_CONTACT: &str = "the repository maintainers";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfsealConfig {
    pub layout: LayoutSection,
    pub cipher: CipherSection,
    pub passphrase: PassphraseSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    /// Relative paths resolve against the directory holding the config file.
    pub dir: String,
    pub plaintext_suffix: String,
    pub ciphertext_suffix: String,
    pub exclude: Vec<String>,
    pub validate_plaintext: bool,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            dir: DEFAULT_DIR.to_string(),
            plaintext_suffix: DEFAULT_PLAINTEXT_SUFFIX.to_string(),
            ciphertext_suffix: DEFAULT_CIPHERTEXT_SUFFIX.to_string(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            validate_plaintext: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherSection {
    pub backend: CipherBackend,
    pub program: String,
    pub encrypt_args: Vec<String>,
    pub decrypt_args: Vec<String>,
    pub passphrase_args: Vec<String>,
    pub version_args: Vec<String>,
    /// Added for OpenSSL 3, which keeps CAST5 in the legacy provider
    pub legacy_provider_args: Vec<String>,
}

impl Default for CipherSection {
    fn default() -> Self {
        let settings = ExternalCipherSettings::default();
        Self {
            backend: CipherBackend::External,
            program: settings.program,
            encrypt_args: settings.encrypt_args,
            decrypt_args: settings.decrypt_args,
            passphrase_args: settings.passphrase_args,
            version_args: settings.version_args,
            legacy_provider_args: settings.legacy_provider_args,
        }
    }
}

impl CipherSection {
    pub fn external_settings(&self) -> ExternalCipherSettings {
        ExternalCipherSettings {
            program: self.program.clone(),
            encrypt_args: self.encrypt_args.clone(),
            decrypt_args: self.decrypt_args.clone(),
            passphrase_args: self.passphrase_args.clone(),
            version_args: self.version_args.clone(),
            legacy_provider_args: self.legacy_provider_args.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseSection {
    pub source: PassphraseSource,
    pub env_var: String,
    /// Who to ask for the passphrase; printed before every run.
    pub contact: String,
}

impl Default for PassphraseSection {
    fn default() -> Self {
        Self {
            source: PassphraseSource::Prompt,
            env_var: PASSPHRASE_ENV.to_string(),
            contact: DEFAULT_CONTACT.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CipherBackend {
    #[default]
    External,
    Age,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PassphraseSource {
    /// Environment variable first, then an interactive prompt
    #[default]
    Prompt,
    /// Environment variable only
    Env,
    /// OS keychain, prompting once and remembering
    Keychain,
    /// Let the cipher tool ask for each file
    Tool,
}

impl PassphraseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Env => "env",
            Self::Keychain => "keychain",
            Self::Tool => "tool",
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<ConfsealConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &ConfsealConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("confseal"));
        }
    }
    Ok(home_dir()?.join(".config").join("confseal"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
