//! Backend that shells out to a command-line block cipher.
//!
//! Each file is one blocking invocation. Argument templates carry `{in}` and
//! `{out}` placeholders; the defaults drive `openssl enc` with CAST5-CBC.
//! OpenSSL 3 only ships CAST5 in its legacy provider, so the provider flags
//! are added when the tool reports a 3.x or later version.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use once_cell::unsync::OnceCell;
use tracing::debug;
use zeroize::Zeroizing;

use super::Cipher;
use crate::error::{Result, SealError};
use crate::passphrase::Passphrase;

/// Placeholder replaced with the input path.
pub const IN_PLACEHOLDER: &str = "{in}";
/// Placeholder replaced with the output path.
pub const OUT_PLACEHOLDER: &str = "{out}";

/// Program and argument templates for an external cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCipherSettings {
    pub program: String,
    pub encrypt_args: Vec<String>,
    pub decrypt_args: Vec<String>,
    /// Appended when a passphrase is piped on stdin
    pub passphrase_args: Vec<String>,
    /// Used by [`Cipher::probe`] and the OpenSSL version check
    pub version_args: Vec<String>,
    /// Appended when the tool reports OpenSSL 3 or later
    pub legacy_provider_args: Vec<String>,
}

impl Default for ExternalCipherSettings {
    fn default() -> Self {
        fn args(values: &[&str]) -> Vec<String> {
            values.iter().map(|s| s.to_string()).collect()
        }
        Self {
            program: "openssl".to_string(),
            encrypt_args: args(&["enc", "-cast5-cbc", "-salt", "-in", "{in}", "-out", "{out}"]),
            decrypt_args: args(&["enc", "-d", "-cast5-cbc", "-in", "{in}", "-out", "{out}"]),
            passphrase_args: args(&["-pass", "stdin"]),
            version_args: args(&["version"]),
            legacy_provider_args: args(&["-provider", "legacy", "-provider", "default"]),
        }
    }
}

/// Command-line cipher invoked once per file.
#[derive(Debug, Clone)]
pub struct ExternalCipher {
    settings: ExternalCipherSettings,
    needs_legacy_provider: OnceCell<bool>,
}

impl ExternalCipher {
    /// Build from settings, checking the templates are usable.
    ///
    /// # Errors
    ///
    /// Returns `SealError::InvalidInput` if the program is blank or a mode
    /// template lacks the `{in}` or `{out}` placeholder.
    pub fn new(settings: ExternalCipherSettings) -> Result<Self> {
        if settings.program.trim().is_empty() {
            return Err(SealError::InvalidInput(
                "Cipher program cannot be empty".to_string(),
            ));
        }
        for (mode, template) in [
            ("encrypt", &settings.encrypt_args),
            ("decrypt", &settings.decrypt_args),
        ] {
            for placeholder in [IN_PLACEHOLDER, OUT_PLACEHOLDER] {
                if !template.iter().any(|arg| arg.contains(placeholder)) {
                    return Err(SealError::InvalidInput(format!(
                        "{} arguments must contain {}",
                        mode, placeholder
                    )));
                }
            }
        }
        Ok(Self {
            settings,
            needs_legacy_provider: OnceCell::new(),
        })
    }

    pub fn settings(&self) -> &ExternalCipherSettings {
        &self.settings
    }

    fn invoke(
        &self,
        template: &[String],
        input: &Path,
        output: &Path,
        passphrase: &Passphrase,
        decrypting: bool,
    ) -> Result<()> {
        std::fs::metadata(input).map_err(|e| SealError::SourceUnreadable {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut args = expand_args(template, input, output);
        if self.needs_legacy_provider() {
            args.extend(self.settings.legacy_provider_args.iter().cloned());
        }
        let mut command = Command::new(&self.settings.program);
        command.args(&args);

        let secret = passphrase.secret();
        if secret.is_some() {
            command
                .args(&self.settings.passphrase_args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
        } else {
            // The tool owns the terminal and prompts the operator itself.
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }

        debug!(program = %self.settings.program, ?args, "spawning cipher");
        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;

        if let (Some(secret), Some(mut stdin)) = (secret, child.stdin.take()) {
            let line = Zeroizing::new(format!("{}\n", secret));
            if let Err(err) = stdin.write_all(line.as_bytes()) {
                // The tool may exit before reading; its status tells the story.
                if err.kind() != ErrorKind::BrokenPipe {
                    return Err(SealError::Io { source: err });
                }
            }
        }

        let result = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();

        if result.status.success() {
            if !output.exists() {
                return Err(SealError::ToolFailed {
                    program: self.settings.program.clone(),
                    status: "exit code 0".to_string(),
                    stderr: format!("no output written to {}", output.display()),
                });
            }
            return Ok(());
        }

        let status = match result.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "a signal".to_string(),
        };
        Err(classify_failure(
            &self.settings.program,
            status,
            stderr,
            output,
            decrypting,
        ))
    }

    /// Asked once per cipher; a tool that cannot report a version gets no
    /// extra flags.
    fn needs_legacy_provider(&self) -> bool {
        if self.settings.legacy_provider_args.is_empty() {
            return false;
        }
        *self.needs_legacy_provider.get_or_init(|| {
            let needed = self
                .version_line()
                .is_ok_and(|line| is_openssl_3_or_later(&line));
            debug!(program = %self.settings.program, needed, "legacy provider check");
            needed
        })
    }

    fn version_line(&self) -> Result<String> {
        let result = Command::new(&self.settings.program)
            .args(&self.settings.version_args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        let stdout = String::from_utf8_lossy(&result.stdout);
        Ok(stdout.lines().next().unwrap_or("").trim().to_string())
    }

    fn spawn_error(&self, err: std::io::Error) -> SealError {
        if err.kind() == ErrorKind::NotFound {
            SealError::ToolNotFound(self.settings.program.clone())
        } else {
            SealError::ToolFailed {
                program: self.settings.program.clone(),
                status: "not started".to_string(),
                stderr: err.to_string(),
            }
        }
    }
}

impl Cipher for ExternalCipher {
    fn name(&self) -> &str {
        &self.settings.program
    }

    fn encrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        self.invoke(&self.settings.encrypt_args, input, output, passphrase, false)
    }

    fn decrypt_file(&self, input: &Path, output: &Path, passphrase: &Passphrase) -> Result<()> {
        self.invoke(&self.settings.decrypt_args, input, output, passphrase, true)
    }

    fn probe(&self) -> Result<String> {
        let line = self.version_line()?;
        if line.is_empty() {
            Ok(self.settings.program.clone())
        } else {
            Ok(line)
        }
    }
}

/// `OpenSSL 3.0.13 30 Jan 2024` and later; LibreSSL and OpenSSL 1.x keep
/// CAST5 in their default set.
fn is_openssl_3_or_later(version_line: &str) -> bool {
    version_line
        .strip_prefix("OpenSSL ")
        .and_then(|rest| rest.split('.').next())
        .and_then(|major| major.parse::<u32>().ok())
        .is_some_and(|major| major >= 3)
}

/// Substitute `{in}` and `{out}` inside every argument.
pub(crate) fn expand_args(template: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();
    template
        .iter()
        .map(|arg| {
            arg.replace(IN_PLACEHOLDER, &input)
                .replace(OUT_PLACEHOLDER, &output)
        })
        .collect()
}

fn classify_failure(
    program: &str,
    status: String,
    stderr: String,
    output: &Path,
    decrypting: bool,
) -> SealError {
    let lower = stderr.to_lowercase();
    if decrypting && (lower.contains("bad decrypt") || lower.contains("bad password")) {
        return SealError::IncorrectPassphrase;
    }
    let output_name = output.to_string_lossy();
    if !stderr.is_empty() && stderr.contains(output_name.as_ref()) {
        return SealError::OutputUnwritable {
            path: output.to_path_buf(),
            reason: stderr,
        };
    }
    SealError::ToolFailed {
        program: program.to_string(),
        status,
        stderr: if stderr.is_empty() {
            "see the tool's output above".to_string()
        } else {
            stderr
        },
    }
}
