//! In-process backend using age passphrase encryption.
//!
//! Age uses scrypt internally for passphrase-based encryption, and its
//! authenticated payload means a wrong passphrase can never produce output.

use std::io::{Read, Write};
use std::iter;
use std::path::Path;

use secrecy::SecretString;
use tracing::debug;

use super::Cipher;
use crate::error::{Result, SealError};
use crate::passphrase::Passphrase;

/// Age-format file cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeCipher;

impl AgeCipher {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt bytes with a passphrase.
    pub fn encrypt_bytes(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        let encryptor =
            age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_string()));

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| SealError::Crypto(format!("Failed to create encryptor: {}", e)))?;
        writer
            .write_all(data)
            .map_err(|e| SealError::Crypto(format!("Encryption write failed: {}", e)))?;
        writer
            .finish()
            .map_err(|e| SealError::Crypto(format!("Encryption finish failed: {}", e)))?;

        Ok(encrypted)
    }

    /// Decrypt bytes produced by [`AgeCipher::encrypt_bytes`].
    ///
    /// # Errors
    ///
    /// Returns `SealError::IncorrectPassphrase` if the passphrase does not
    /// match, `SealError::Crypto` for malformed or tampered input.
    pub fn decrypt_bytes(encrypted: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        let decryptor = age::Decryptor::new(encrypted)
            .map_err(|e| SealError::Crypto(format!("Failed to create decryptor: {}", e)))?;

        let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
        let mut reader = decryptor
            .decrypt(iter::once(&identity as &dyn age::Identity))
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys
                | age::DecryptError::DecryptionFailed
                | age::DecryptError::KeyDecryptionFailed => SealError::IncorrectPassphrase,
                _ => SealError::Crypto(format!("Decryption failed: {}", e)),
            })?;

        let mut decrypted = Vec::new();
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| SealError::Crypto(format!("Failed to read decrypted data: {}", e)))?;
        Ok(decrypted)
    }

    fn require_secret(passphrase: &Passphrase) -> Result<&str> {
        passphrase.secret().ok_or_else(|| {
            SealError::PassphraseUnavailable(
                "the age backend cannot prompt; choose a passphrase source other than \"tool\""
                    .to_string(),
            )
        })
    }
}

impl Cipher for AgeCipher {
    fn name(&self) -> &str {
        "age"
    }

    fn encrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        let secret = Self::require_secret(passphrase)?;
        let data = read_source(input)?;
        let encrypted = Self::encrypt_bytes(&data, secret)?;
        write_output(output, &encrypted)?;
        debug!(input = %input.display(), bytes = data.len(), "age encrypted");
        Ok(())
    }

    fn decrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        let secret = Self::require_secret(passphrase)?;
        let encrypted = read_source(input)?;
        let decrypted = zeroize::Zeroizing::new(Self::decrypt_bytes(&encrypted, secret)?);
        write_output(output, &decrypted)?;
        debug!(input = %input.display(), bytes = decrypted.len(), "age decrypted");
        Ok(())
    }

    fn authenticates(&self) -> bool {
        true
    }

    fn probe(&self) -> Result<String> {
        Ok("built-in age (scrypt passphrase)".to_string())
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| SealError::SourceUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| SealError::OutputUnwritable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
