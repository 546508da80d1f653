//! Filesystem helpers for staged, atomic replacement of config files.
//!
//! Every transform writes into a sibling temp file first. The temp file only
//! replaces the real target once the cipher reports success, so a failed
//! invocation leaves whatever was at the target untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Prefix of every staging file. Layout enumeration ignores these.
pub const STAGING_PREFIX: &str = ".confseal-";

/// A temp file next to its final destination, removed on drop unless committed.
#[derive(Debug)]
pub struct StagedFile {
    temp_path: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Reserve a staging path in the destination's directory.
    ///
    /// The file itself is not created; the cipher is expected to create it.
    pub fn for_destination(destination: &Path) -> io::Result<Self> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = destination
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid destination filename: {}", destination.display()),
                )
            })?;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| io::Error::other(format!("System time error: {}", e)))?
            .as_nanos();
        let temp_path = parent.join(format!(
            "{}{}.{}.{}.tmp",
            STAGING_PREFIX,
            filename,
            std::process::id(),
            nanos
        ));

        Ok(Self {
            temp_path,
            destination: destination.to_path_buf(),
            committed: false,
        })
    }

    /// Path the cipher should write to.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Final destination of this staged file.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Move the staged file over its destination.
    pub fn commit(mut self) -> io::Result<()> {
        rename_with_fallback(&self.temp_path, &self.destination)?;
        debug!(
            temp = %self.temp_path.display(),
            destination = %self.destination.display(),
            "committed staged file"
        );
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        // Windows refuses to rename over an existing file.
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Limit a recovered plaintext to its owner (no-op off unix).
pub fn restrict_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Whether a directory entry name is one of our staging files.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(".tmp")
}
