//! Cipher backends.
//!
//! The workflow treats the block cipher as an opaque collaborator behind the
//! [`Cipher`] trait. Two backends exist:
//! - **external**: shells out to a command-line tool (`openssl` by default)
//! - **age**: in-process passphrase encryption with the age format

mod age_file;
mod external;

use std::path::Path;

use crate::error::Result;
use crate::passphrase::Passphrase;

pub use age_file::AgeCipher;
pub use external::{ExternalCipher, ExternalCipherSettings, IN_PLACEHOLDER, OUT_PLACEHOLDER};

/// A file-to-file symmetric cipher.
///
/// Implementations write `output` in full or report an error; the caller
/// takes care of staging and replacing the real target.
pub trait Cipher {
    /// Short backend name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Encrypt `input` into `output`.
    fn encrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()>;

    /// Decrypt `input` into `output`.
    ///
    /// # Errors
    ///
    /// Returns `SealError::IncorrectPassphrase` when the backend can tell the
    /// passphrase was wrong.
    fn decrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()>;

    /// Whether a wrong passphrase always fails `decrypt_file` instead of
    /// producing output. Unauthenticated block ciphers return `false`.
    fn authenticates(&self) -> bool {
        false
    }

    /// Check the backend is usable on this machine; returns a version or
    /// description string.
    fn probe(&self) -> Result<String>;
}

impl<C: Cipher + ?Sized> Cipher for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn encrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        (**self).encrypt_file(input, output, passphrase)
    }

    fn decrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        (**self).decrypt_file(input, output, passphrase)
    }

    fn authenticates(&self) -> bool {
        (**self).authenticates()
    }

    fn probe(&self) -> Result<String> {
        (**self).probe()
    }
}
