//! Path resolution for the config file and the config directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, ConfsealConfig};
use crate::constants::LOCAL_CONFIG_FILE;
use crate::errors::CliError;

/// Settings plus the file they came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: ConfsealConfig,
}

/// Find the config file: `--config`/`CONFSEAL_CONFIG`, then
/// `./confseal.toml`, then the XDG location. `None` means built-in defaults.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = cli.config.clone() {
        if !path.is_file() {
            return Err(CliError::not_found(
                format!("No config file at {}", path.display()),
                "Hint: Run `confseal init <PATH>` to create one, or unset CONFSEAL_CONFIG.",
            )
            .into());
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    // No HOME just means no user-level config.
    if let Ok(user) = default_config_path() {
        if user.is_file() {
            return Ok(Some(user));
        }
    }

    Ok(None)
}

pub fn load_config(cli: &Cli) -> anyhow::Result<LoadedConfig> {
    let path = resolve_config_path(cli)?;
    let config = match &path {
        Some(path) => read_config(path)?,
        None => ConfsealConfig::default(),
    };
    debug!(config = ?path, "loaded settings");
    Ok(LoadedConfig { path, config })
}

/// The directory to operate on: `--dir`/`CONFSEAL_DIR`, else `layout.dir`
/// relative to the config file's directory (or the working directory).
pub fn resolve_config_dir(cli: &Cli, loaded: &LoadedConfig) -> PathBuf {
    if let Some(dir) = cli.dir.clone() {
        return dir;
    }
    layout_dir_for(loaded.path.as_deref(), &loaded.config.layout.dir)
}

/// Where a `layout.dir` value lands for a config file at `config_path`.
pub fn layout_dir_for(config_path: Option<&Path>, dir: &str) -> PathBuf {
    let dir = PathBuf::from(dir);
    if dir.is_absolute() {
        return dir;
    }
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(dir),
        _ => dir,
    }
}

/// Error for a config directory that does not exist.
pub fn missing_dir_error(dir: &Path) -> CliError {
    CliError::not_found(
        format!("No config directory at {}", dir.display()),
        "Hint: Run from the repository root, pass --dir, or set layout.dir in confseal.toml.",
    )
}
