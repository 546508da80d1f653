//! Constants used throughout the CLI.

/// Binary name used in hints and completions.
pub const BIN_NAME: &str = "confseal";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "confseal.toml";

/// Keychain service name for remembered passphrases.
pub const KEYCHAIN_SERVICE: &str = "confseal";

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config file, config directory).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, arguments, or config values.
    pub const INVALID_INPUT: i32 = 4;

    /// No passphrase could be obtained.
    pub const AUTH_FAILED: i32 = 5;

    /// A sealed file does not match the plaintext on disk.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// At least one file in a batch failed; the rest were processed.
    pub const PARTIAL_FAILURE: i32 = 7;
}
