//! Per-file outcomes of a batch run.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::SealError;
use crate::layout::{Direction, FileJob};

/// Failure categories surfaced to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Wrong or missing passphrase
    Passphrase,
    /// Cipher tool not installed or not on PATH
    ToolMissing,
    /// Source file missing or unreadable
    SourceUnreadable,
    /// Target location not writable
    OutputUnwritable,
    /// Decryption produced bytes that are not valid plaintext
    InvalidPlaintext,
    /// Any other cipher failure
    CipherFailed,
}

impl FailureKind {
    pub fn from_error(err: &SealError) -> Self {
        match err {
            SealError::IncorrectPassphrase | SealError::PassphraseUnavailable(_) => {
                Self::Passphrase
            }
            SealError::ToolNotFound(_) => Self::ToolMissing,
            SealError::SourceUnreadable { .. } => Self::SourceUnreadable,
            SealError::OutputUnwritable { .. } => Self::OutputUnwritable,
            SealError::InvalidPlaintext { .. } => Self::InvalidPlaintext,
            _ => Self::CipherFailed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passphrase => "passphrase",
            Self::ToolMissing => "tool missing",
            Self::SourceUnreadable => "source unreadable",
            Self::OutputUnwritable => "output unwritable",
            Self::InvalidPlaintext => "invalid plaintext",
            Self::CipherFailed => "cipher failed",
        }
    }
}

/// Result of one file transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileResult {
    Written,
    Failed { kind: FailureKind, message: String },
}

impl FileResult {
    pub fn from_error(err: &SealError) -> Self {
        Self::Failed {
            kind: FailureKind::from_error(err),
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Written)
    }
}

/// One line of a batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(flatten)]
    pub result: FileResult,
}

impl FileOutcome {
    pub fn new(job: &FileJob, result: FileResult) -> Self {
        Self {
            source: job.source.clone(),
            target: job.target.clone(),
            result,
        }
    }
}

/// Outcome of encrypt-all or decrypt-all, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub direction: Direction,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// True when every attempted file was written (vacuously true when empty).
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.result.is_ok())
    }
}

/// Comparison of a ciphertext's content with the plaintext on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyResult {
    /// Decrypts to exactly the current plaintext
    Match,
    /// Decrypts fine but the plaintext on disk differs
    Differs,
    /// Decrypts fine; there is no plaintext to compare with
    PlaintextMissing,
    Failed { kind: FailureKind, message: String },
}

/// One line of a verify run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOutcome {
    pub ciphertext: PathBuf,
    pub plaintext: PathBuf,
    #[serde(flatten)]
    pub result: VerifyResult,
}

impl VerifyOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self.result, VerifyResult::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> FileJob {
        FileJob {
            direction: Direction::Decrypt,
            source: PathBuf::from(format!("config/{}.cast5", name)),
            target: PathBuf::from(format!("config/{}", name)),
        }
    }

    #[test]
    fn test_counts() {
        let mut report = BatchReport::new(Direction::Decrypt);
        assert!(report.is_success());

        report.push(FileOutcome::new(&job("a.json"), FileResult::Written));
        report.push(FileOutcome::new(
            &job("b.json"),
            FileResult::from_error(&SealError::IncorrectPassphrase),
        ));

        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        let failed: Vec<_> = report.failures().map(|o| o.target.clone()).collect();
        assert_eq!(failed, vec![PathBuf::from("config/b.json")]);
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            FailureKind::from_error(&SealError::ToolNotFound("openssl".into())),
            FailureKind::ToolMissing
        );
        assert_eq!(
            FailureKind::from_error(&SealError::Crypto("x".into())),
            FailureKind::CipherFailed
        );
    }

    #[test]
    fn test_report_serializes_flat_outcomes() {
        let mut report = BatchReport::new(Direction::Encrypt);
        report.push(FileOutcome::new(&job("a.json"), FileResult::Written));
        report.push(FileOutcome::new(
            &job("b.json"),
            FileResult::from_error(&SealError::ToolNotFound("openssl".into())),
        ));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["direction"], "encrypt");
        assert_eq!(value["outcomes"][0]["status"], "written");
        assert_eq!(value["outcomes"][1]["status"], "failed");
        assert_eq!(value["outcomes"][1]["kind"], "tool_missing");
    }
}
