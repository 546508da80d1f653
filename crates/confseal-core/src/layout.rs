//! Config directory layout: which files are plaintext, which are sealed,
//! and how the two are paired.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SealError};
use crate::fs::is_staging_name;

/// Default configuration directory, relative to the working directory.
pub const DEFAULT_DIR: &str = "config";
/// Default plaintext suffix.
pub const DEFAULT_PLAINTEXT_SUFFIX: &str = ".json";
/// Default ciphertext suffix.
pub const DEFAULT_CIPHERTEXT_SUFFIX: &str = ".cast5";
/// Template files that are never encrypted.
pub const DEFAULT_EXCLUDE: [&str; 2] = ["base.json", "test.json"];

/// Direction of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    /// Verb used in progress lines.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypting",
            Self::Decrypt => "Decrypting",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encrypt => write!(f, "encrypt"),
            Self::Decrypt => write!(f, "decrypt"),
        }
    }
}

/// One planned transform: read `source`, write `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileJob {
    pub direction: Direction,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Sync state of a plaintext/ciphertext pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    /// Both sides exist and the ciphertext is not older than the plaintext
    Sealed,
    /// Plaintext modified after the ciphertext was written
    Stale,
    /// Plaintext exists but was never encrypted
    PlaintextOnly,
    /// Ciphertext exists but has not been decrypted here
    CiphertextOnly,
    /// Template file that the encrypt direction skips
    Excluded,
}

impl PairState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sealed => "sealed",
            Self::Stale => "stale",
            Self::PlaintextOnly => "plaintext only",
            Self::CiphertextOnly => "ciphertext only",
            Self::Excluded => "excluded",
        }
    }
}

/// A plaintext name and whatever exists of it on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePair {
    /// Plaintext file name, e.g. `main.json`
    pub name: String,
    pub plaintext: Option<PathBuf>,
    pub ciphertext: Option<PathBuf>,
    pub state: PairState,
}

/// Naming conventions of a config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayout {
    dir: PathBuf,
    plaintext_suffix: String,
    ciphertext_suffix: String,
    exclude: Vec<String>,
}

impl Default for ConfigLayout {
    fn default() -> Self {
        Self::new(DEFAULT_DIR)
    }
}

impl ConfigLayout {
    /// Layout with the default suffixes and exclusion list.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            plaintext_suffix: DEFAULT_PLAINTEXT_SUFFIX.to_string(),
            ciphertext_suffix: DEFAULT_CIPHERTEXT_SUFFIX.to_string(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Override the plaintext and ciphertext suffixes.
    ///
    /// # Errors
    ///
    /// Returns `SealError::InvalidInput` if a suffix is empty or both are equal.
    pub fn with_suffixes(
        mut self,
        plaintext_suffix: impl Into<String>,
        ciphertext_suffix: impl Into<String>,
    ) -> Result<Self> {
        let plaintext_suffix = plaintext_suffix.into();
        let ciphertext_suffix = ciphertext_suffix.into();
        if plaintext_suffix.is_empty() || ciphertext_suffix.is_empty() {
            return Err(SealError::InvalidInput(
                "File suffixes cannot be empty".to_string(),
            ));
        }
        if plaintext_suffix == ciphertext_suffix {
            return Err(SealError::InvalidInput(format!(
                "Plaintext and ciphertext suffix are both \"{}\"",
                plaintext_suffix
            )));
        }
        self.plaintext_suffix = plaintext_suffix;
        self.ciphertext_suffix = ciphertext_suffix;
        Ok(self)
    }

    /// Replace the exclusion list (file names, not paths).
    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plaintext_suffix(&self) -> &str {
        &self.plaintext_suffix
    }

    pub fn ciphertext_suffix(&self) -> &str {
        &self.ciphertext_suffix
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Whether a plaintext file name is on the exclusion list.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|excluded| excluded == name)
    }

    /// `main.json` -> `<dir>/main.json.cast5`
    pub fn ciphertext_path_for(&self, plaintext: &Path) -> PathBuf {
        let mut name = plaintext.as_os_str().to_os_string();
        name.push(&self.ciphertext_suffix);
        PathBuf::from(name)
    }

    /// `main.json.cast5` -> `main.json`; `None` if the suffix is absent.
    pub fn plaintext_path_for(&self, ciphertext: &Path) -> Option<PathBuf> {
        let name = ciphertext.file_name()?.to_str()?;
        let stem = name.strip_suffix(&self.ciphertext_suffix)?;
        if stem.is_empty() {
            return None;
        }
        Some(ciphertext.with_file_name(stem))
    }

    /// Plaintext files eligible for encryption, sorted by name.
    pub fn plaintext_files(&self) -> Result<Vec<PathBuf>> {
        let files = self
            .list_with_suffix(&self.plaintext_suffix)?
            .into_iter()
            .filter(|(name, _)| !self.is_excluded(name))
            .map(|(_, path)| path)
            .collect::<Vec<_>>();
        debug!(dir = %self.dir.display(), count = files.len(), "enumerated plaintext files");
        Ok(files)
    }

    /// Ciphertext files, sorted by name.
    pub fn ciphertext_files(&self) -> Result<Vec<PathBuf>> {
        let files = self
            .list_with_suffix(&self.ciphertext_suffix)?
            .into_iter()
            .map(|(_, path)| path)
            .collect::<Vec<_>>();
        debug!(dir = %self.dir.display(), count = files.len(), "enumerated ciphertext files");
        Ok(files)
    }

    /// Jobs for encrypt-all.
    pub fn plan_encrypt(&self) -> Result<Vec<FileJob>> {
        Ok(self
            .plaintext_files()?
            .into_iter()
            .map(|source| FileJob {
                direction: Direction::Encrypt,
                target: self.ciphertext_path_for(&source),
                source,
            })
            .collect())
    }

    /// Jobs for decrypt-all.
    pub fn plan_decrypt(&self) -> Result<Vec<FileJob>> {
        let mut jobs = Vec::new();
        for source in self.ciphertext_files()? {
            if let Some(target) = self.plaintext_path_for(&source) {
                jobs.push(FileJob {
                    direction: Direction::Decrypt,
                    source,
                    target,
                });
            }
        }
        Ok(jobs)
    }

    /// Every plaintext name known from either side, with its state.
    pub fn pairs(&self) -> Result<Vec<FilePair>> {
        let mut names: Vec<String> = self
            .list_with_suffix(&self.plaintext_suffix)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        for cipher in self.ciphertext_files()? {
            if let Some(plain) = self.plaintext_path_for(&cipher) {
                if let Some(name) = plain.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names.dedup();

        Ok(names
            .into_iter()
            .map(|name| {
                let plain_path = self.dir.join(&name);
                let cipher_path = self.ciphertext_path_for(&plain_path);
                let plaintext = plain_path.is_file().then_some(plain_path);
                let ciphertext = cipher_path.is_file().then_some(cipher_path);
                let state = pair_state(
                    self.is_excluded(&name),
                    plaintext.as_deref(),
                    ciphertext.as_deref(),
                );
                FilePair {
                    name,
                    plaintext,
                    ciphertext,
                    state,
                }
            })
            .collect())
    }

    fn list_with_suffix(&self, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
        if !self.dir.is_dir() {
            return Err(SealError::DirectoryNotFound(self.dir.clone()));
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            // Follows symlinks, like a shell glob.
            if !entry.path().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_staging_name(&name) || name.len() <= suffix.len() || !name.ends_with(suffix) {
                continue;
            }
            found.push((name, entry.path()));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }
}

fn pair_state(excluded: bool, plaintext: Option<&Path>, ciphertext: Option<&Path>) -> PairState {
    if excluded && ciphertext.is_none() {
        return PairState::Excluded;
    }
    match (plaintext, ciphertext) {
        (Some(plain), Some(cipher)) => match (modified(plain), modified(cipher)) {
            (Some(plain_time), Some(cipher_time)) if plain_time > cipher_time => PairState::Stale,
            _ => PairState::Sealed,
        },
        (Some(_), None) => PairState::PlaintextOnly,
        _ => PairState::CiphertextOnly,
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "{}").unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_plaintext_files_skip_templates() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "base.json");
        touch(dir.path(), "test.json");
        touch(dir.path(), "main.json");

        let layout = ConfigLayout::new(dir.path());
        let files = layout.plaintext_files().unwrap();

        assert_eq!(names(&files), vec!["main.json"]);
    }

    #[test]
    fn test_plaintext_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "zeta.json");
        touch(dir.path(), "alpha.json");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "alpha.json.cast5");
        touch(dir.path(), ".json");
        touch(dir.path(), ".confseal-alpha.json.1.2.tmp");
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let layout = ConfigLayout::new(dir.path());

        assert_eq!(
            names(&layout.plaintext_files().unwrap()),
            vec!["alpha.json", "zeta.json"]
        );
        assert_eq!(
            names(&layout.ciphertext_files().unwrap()),
            vec!["alpha.json.cast5"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_listed() {
        let dir = tempdir().unwrap();
        let shared = tempdir().unwrap();
        fs::write(shared.path().join("shared.json"), "{}").unwrap();
        std::os::unix::fs::symlink(
            shared.path().join("shared.json"),
            dir.path().join("linked.json"),
        )
        .unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("nested.json")).unwrap();

        let layout = ConfigLayout::new(dir.path());
        assert_eq!(
            layout.plaintext_files().unwrap(),
            vec![dir.path().join("linked.json")]
        );
    }

    #[test]
    fn test_path_mapping() {
        let layout = ConfigLayout::new("config");
        let cipher = layout.ciphertext_path_for(Path::new("config/main.json"));
        assert_eq!(cipher, PathBuf::from("config/main.json.cast5"));
        assert_eq!(
            layout.plaintext_path_for(&cipher),
            Some(PathBuf::from("config/main.json"))
        );
        assert_eq!(layout.plaintext_path_for(Path::new("config/main.json")), None);
        assert_eq!(layout.plaintext_path_for(Path::new("config/.cast5")), None);
    }

    #[test]
    fn test_plan_decrypt_targets_strip_suffix() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "main.json.cast5");
        touch(dir.path(), "base.json.cast5");

        let layout = ConfigLayout::new(dir.path());
        let jobs = layout.plan_decrypt().unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].target, dir.path().join("base.json"));
        assert_eq!(jobs[1].target, dir.path().join("main.json"));
        assert!(jobs.iter().all(|j| j.direction == Direction::Decrypt));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let layout = ConfigLayout::new(dir.path().join("absent"));
        assert!(matches!(
            layout.plaintext_files(),
            Err(SealError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_custom_suffixes_and_exclusions() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "app.toml");
        touch(dir.path(), "base.json");
        touch(dir.path(), "local.toml");

        let layout = ConfigLayout::new(dir.path())
            .with_suffixes(".toml", ".enc")
            .unwrap()
            .with_exclude(["local.toml"]);

        assert_eq!(names(&layout.plaintext_files().unwrap()), vec!["app.toml"]);
        assert!(ConfigLayout::new("x").with_suffixes(".a", ".a").is_err());
        assert!(ConfigLayout::new("x").with_suffixes("", ".a").is_err());
    }

    #[test]
    fn test_pairs_report_states() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "base.json");
        touch(dir.path(), "fresh.json");
        touch(dir.path(), "remote.json.cast5");
        touch(dir.path(), "both.json");
        touch(dir.path(), "both.json.cast5");

        let layout = ConfigLayout::new(dir.path());
        let pairs = layout.pairs().unwrap();
        let states: Vec<(&str, PairState)> =
            pairs.iter().map(|p| (p.name.as_str(), p.state)).collect();

        assert_eq!(
            states,
            vec![
                ("base.json", PairState::Excluded),
                ("both.json", PairState::Sealed),
                ("fresh.json", PairState::PlaintextOnly),
                ("remote.json", PairState::CiphertextOnly),
            ]
        );
    }
}
