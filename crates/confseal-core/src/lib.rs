//! # confseal core
//!
//! Core library for confseal - batch encryption of configuration files at
//! rest, with a shared passphrase held by people rather than by the repo.
//!
//! ## Architecture
//!
//! - **layout**: Which files in the config directory are plaintext or
//!   ciphertext, exclusions, and pairing by name
//! - **cipher**: The `Cipher` seam with external-tool and age backends
//! - **codec**: Encrypt-all / decrypt-all / verify over a layout
//! - **report**: Per-file outcomes collected into a batch report
//! - **passphrase**: Passphrase value and pluggable providers
//! - **fs**: Staged writes with atomic replacement

pub mod cipher;
pub mod codec;
pub mod error;
pub mod fs;
pub mod layout;
pub mod passphrase;
pub mod report;

pub use cipher::{AgeCipher, Cipher, ExternalCipher, ExternalCipherSettings};
pub use codec::{BatchEvent, ConfigCodec};
pub use error::{Result, SealError};
pub use layout::{ConfigLayout, Direction, FileJob, FilePair, PairState};
pub use passphrase::{
    DelegatedPassphrase, EnvPassphrase, FixedPassphrase, Passphrase, PassphraseProvider,
};
pub use report::{BatchReport, FailureKind, FileOutcome, FileResult, VerifyOutcome, VerifyResult};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
