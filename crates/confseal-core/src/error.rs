//! Error types for confseal core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for confseal operations.
pub type Result<T> = std::result::Result<T, SealError>;

/// Core error type for confseal operations.
#[derive(Debug, Error)]
pub enum SealError {
    /// Incorrect passphrase during decryption
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// No passphrase could be obtained from the configured source
    #[error("Passphrase unavailable: {0}")]
    PassphraseUnavailable(String),

    /// The external cipher program could not be started
    #[error("Cipher tool not found: {0}")]
    ToolNotFound(String),

    /// The external cipher program exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Source file missing or unreadable
    #[error("Cannot read {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// Output location not writable
    #[error("Cannot write {}: {reason}", path.display())]
    OutputUnwritable { path: PathBuf, reason: String },

    /// Decrypted bytes failed plaintext validation
    #[error("Decrypted {} is not valid plaintext: {reason}", path.display())]
    InvalidPlaintext { path: PathBuf, reason: String },

    /// Configuration directory not found
    #[error("Config directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// In-process encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Invalid user input or settings
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
