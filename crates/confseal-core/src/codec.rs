//! Batch encrypt/decrypt over a config directory.
//!
//! Files are processed one at a time, in name order, each by a blocking
//! cipher call. A failing file is recorded in the report and the batch moves
//! on; nothing aborts the remaining files.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cipher::Cipher;
use crate::error::{Result, SealError};
use crate::fs::{restrict_permissions, StagedFile};
use crate::layout::{ConfigLayout, Direction, FileJob};
use crate::passphrase::Passphrase;
use crate::report::{
    BatchReport, FailureKind, FileOutcome, FileResult, VerifyOutcome, VerifyResult,
};

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// About to transform `job` (1-based `index` of `total`)
    Started {
        job: &'a FileJob,
        index: usize,
        total: usize,
    },
    /// Finished `job`, successfully or not
    Finished {
        job: &'a FileJob,
        result: &'a FileResult,
    },
}

/// Encrypts and decrypts the files of one [`ConfigLayout`] with one [`Cipher`].
pub struct ConfigCodec<C> {
    layout: ConfigLayout,
    cipher: C,
    validate_plaintext: bool,
}

impl<C: Cipher> ConfigCodec<C> {
    pub fn new(layout: ConfigLayout, cipher: C) -> Self {
        Self {
            layout,
            cipher,
            validate_plaintext: true,
        }
    }

    /// Toggle the text check on decrypted plaintext (on by default).
    pub fn with_plaintext_validation(mut self, enabled: bool) -> Self {
        self.validate_plaintext = enabled;
        self
    }

    pub fn layout(&self) -> &ConfigLayout {
        &self.layout
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Encrypt every eligible plaintext file.
    ///
    /// # Errors
    ///
    /// Only enumeration failures (e.g. missing directory) are returned as
    /// `Err`; per-file failures land in the report.
    pub fn encrypt_all<F>(&self, passphrase: &Passphrase, observer: F) -> Result<BatchReport>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let jobs = self.layout.plan_encrypt()?;
        Ok(self.run_jobs(Direction::Encrypt, &jobs, passphrase, observer))
    }

    /// Decrypt every ciphertext file next to itself.
    ///
    /// # Errors
    ///
    /// Only enumeration failures are returned as `Err`.
    pub fn decrypt_all<F>(&self, passphrase: &Passphrase, observer: F) -> Result<BatchReport>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let jobs = self.layout.plan_decrypt()?;
        Ok(self.run_jobs(Direction::Decrypt, &jobs, passphrase, observer))
    }

    /// Run an explicit job list. Jobs whose direction differs from
    /// `direction` are run in their own direction.
    pub fn run_jobs<F>(
        &self,
        direction: Direction,
        jobs: &[FileJob],
        passphrase: &Passphrase,
        mut observer: F,
    ) -> BatchReport
    where
        F: FnMut(BatchEvent<'_>),
    {
        info!(%direction, files = jobs.len(), cipher = self.cipher.name(), "starting batch");
        let mut report = BatchReport::new(direction);
        let total = jobs.len();

        for (i, job) in jobs.iter().enumerate() {
            observer(BatchEvent::Started {
                job,
                index: i + 1,
                total,
            });
            let result = match self.transform(job, passphrase) {
                Ok(()) => FileResult::Written,
                Err(err) => {
                    warn!(source = %job.source.display(), error = %err, "transform failed");
                    FileResult::from_error(&err)
                }
            };
            observer(BatchEvent::Finished {
                job,
                result: &result,
            });
            report.push(FileOutcome::new(job, result));
        }

        info!(
            %direction,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );
        report
    }

    /// Decrypt every ciphertext into a scratch file and compare it with the
    /// plaintext on disk. The plaintext set is never written.
    pub fn verify_all<F>(
        &self,
        passphrase: &Passphrase,
        mut observer: F,
    ) -> Result<Vec<VerifyOutcome>>
    where
        F: FnMut(&FileJob),
    {
        let jobs = self.layout.plan_decrypt()?;
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in &jobs {
            observer(job);
            let result = match self.verify_one(job, passphrase) {
                Ok(result) => result,
                Err(err) => VerifyResult::Failed {
                    kind: FailureKind::from_error(&err),
                    message: err.to_string(),
                },
            };
            debug!(ciphertext = %job.source.display(), ?result, "verified");
            outcomes.push(VerifyOutcome {
                ciphertext: job.source.clone(),
                plaintext: job.target.clone(),
                result,
            });
        }
        Ok(outcomes)
    }

    fn transform(&self, job: &FileJob, passphrase: &Passphrase) -> Result<()> {
        let staged = stage(&job.target)?;
        debug!(
            source = %job.source.display(),
            staged = %staged.path().display(),
            "invoking cipher"
        );

        match job.direction {
            Direction::Encrypt => {
                self.cipher
                    .encrypt_file(&job.source, staged.path(), passphrase)?;
            }
            Direction::Decrypt => {
                self.cipher
                    .decrypt_file(&job.source, staged.path(), passphrase)?;
                self.check_plaintext(staged.path(), &job.target)?;
                restrict_permissions(staged.path()).map_err(|e| SealError::OutputUnwritable {
                    path: job.target.clone(),
                    reason: e.to_string(),
                })?;
            }
        }

        staged
            .commit()
            .map_err(|e| SealError::OutputUnwritable {
                path: job.target.clone(),
                reason: e.to_string(),
            })
    }

    fn verify_one(&self, job: &FileJob, passphrase: &Passphrase) -> Result<VerifyResult> {
        let staged = stage(&job.target)?;
        self.cipher
            .decrypt_file(&job.source, staged.path(), passphrase)?;
        self.check_plaintext(staged.path(), &job.target)?;

        let recovered = fs::read(staged.path())?;
        match fs::read(&job.target) {
            Ok(current) if current == recovered => Ok(VerifyResult::Match),
            Ok(_) => Ok(VerifyResult::Differs),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(VerifyResult::PlaintextMissing)
            }
            Err(err) => Err(SealError::SourceUnreadable {
                path: job.target.clone(),
                reason: err.to_string(),
            }),
        }
    }

    /// Reject recovered plaintext that is not text. Only applies to targets
    /// named with the plaintext suffix, and only for ciphers that cannot
    /// detect a wrong passphrase themselves: those sometimes pass their
    /// padding check and emit random bytes.
    fn check_plaintext(&self, staged: &Path, target: &Path) -> Result<()> {
        if !self.validate_plaintext || self.cipher.authenticates() {
            return Ok(());
        }
        let named_as_plaintext = target
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(self.layout.plaintext_suffix()));
        if !named_as_plaintext {
            return Ok(());
        }

        let bytes = fs::read(staged)?;
        if let Some(reason) = not_text(&bytes) {
            return Err(SealError::InvalidPlaintext {
                path: target.to_path_buf(),
                reason: format!("{} (wrong passphrase?)", reason),
            });
        }
        Ok(())
    }
}

/// Why `bytes` cannot be a text config file, if it cannot. Comments,
/// trailing commas and empty files all pass; only encoding is checked.
fn not_text(bytes: &[u8]) -> Option<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => return Some(format!("not UTF-8 at byte {}", err.valid_up_to())),
    };
    text.char_indices()
        .find(|&(_, c)| c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{c}'))
        .map(|(at, c)| format!("control character {:?} at byte {}", c, at))
}

fn stage(target: &Path) -> Result<StagedFile> {
    StagedFile::for_destination(target).map_err(|e| SealError::OutputUnwritable {
        path: target.to_path_buf(),
        reason: e.to_string(),
    })
}
