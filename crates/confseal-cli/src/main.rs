//! confseal CLI - Keep configuration files encrypted at rest
//!
//! This is the command-line interface for confseal. It provides the
//! `encrypt` / `decrypt` workflow over a config directory plus status,
//! verification, and diagnostics on top of the core library.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod security;
mod ui;

use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use confseal_core::{Direction, VERSION};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{doctor, init, misc, seal, status, verify};
use crate::errors::exit_code_for;
use crate::ui::print_error;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context(false);

        let error_msg = format!("{}", e);
        let (message, hint) = split_error_hint(&error_msg);

        print_error(&ui_ctx, message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Split an explicit "Hint:" line off the error, or provide a contextual
/// hint for common error patterns.
fn split_error_hint(error: &str) -> (&str, Option<String>) {
    if let Some(idx) = error.find("\nHint:") {
        let hint = error[idx + "\nHint:".len()..].trim();
        return (&error[..idx], Some(hint.to_string()));
    }
    (error, extract_error_hint(error))
}

fn extract_error_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("failed to parse config") {
        return Some(
            "Check the TOML syntax; `confseal init --force` writes a fresh default."
                .to_string(),
        );
    }

    if error_lower.contains("failed to decrypt") {
        return Some(
            "Fix the failing files and rerun; files that succeeded are already written."
                .to_string(),
        );
    }

    if error_lower.contains("failed to encrypt") {
        return Some(
            "Run `confseal doctor` to check the cipher tool, then rerun.".to_string(),
        );
    }

    if error_lower.contains("did not verify") {
        return Some(
            "Run `confseal encrypt` after checking the plaintext changes are intended."
                .to_string(),
        );
    }

    if error_lower.contains("arguments must contain") || error_lower.contains("suffix") {
        return Some("Check the [cipher] and [layout] sections of confseal.toml.".to_string());
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Decrypt(args)) => {
            seal::handle_seal(ctx, Direction::Decrypt, args)?;
        }
        Some(Commands::Encrypt(args)) => {
            seal::handle_seal(ctx, Direction::Encrypt, args)?;
        }
        Some(Commands::Status(args)) => {
            status::handle_status(ctx, args)?;
        }
        Some(Commands::Verify(args)) => {
            verify::handle_verify(ctx, args)?;
        }
        Some(Commands::Doctor) => {
            doctor::handle_doctor(ctx)?;
        }
        Some(Commands::Init(args)) => {
            init::handle_init(ctx, args)?;
        }
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args)?;
        }
        None => {
            println!("confseal v{}", VERSION);
            println!("\nQuickstart:");
            println!("  confseal decrypt     # after a fresh clone");
            println!("  confseal status");
            println!("  confseal encrypt     # before committing config changes");
            println!("\nRun `confseal --help` for full usage.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_explicit_hint() {
        let (message, hint) = split_error_hint("No config directory at x\nHint: pass --dir");
        assert_eq!(message, "No config directory at x");
        assert_eq!(hint.as_deref(), Some("pass --dir"));
    }

    #[test]
    fn test_contextual_hint_for_partial_decrypt() {
        let (message, hint) = split_error_hint("Failed to decrypt 1 of 3 files");
        assert_eq!(message, "Failed to decrypt 1 of 3 files");
        assert!(hint.unwrap().contains("rerun"));
    }

    #[test]
    fn test_no_hint_for_unknown_errors() {
        assert!(extract_error_hint("something odd").is_none());
    }
}
