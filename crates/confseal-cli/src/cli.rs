use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use confseal_core::VERSION;

use crate::config::PassphraseSource;

/// confseal - Encrypt configuration files at rest with a shared passphrase
#[derive(Parser)]
#[command(name = "confseal")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the confseal config file
    #[arg(short, long, global = true, env = "CONFSEAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Config directory to operate on (overrides layout.dir)
    #[arg(short, long, global = true, env = "CONFSEAL_DIR")]
    pub dir: Option<PathBuf>,

    /// Where the shared passphrase comes from (overrides passphrase.source)
    #[arg(long, global = true, value_enum)]
    pub passphrase_source: Option<PassphraseSourceArg>,

    /// Cipher backend (overrides cipher.backend)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decrypt every sealed file next to itself
    Decrypt(SealArgs),

    /// Encrypt every plaintext file except the templates
    Encrypt(SealArgs),

    /// Show which files are sealed, stale, or only on one side
    Status(OutputArgs),

    /// Check that every sealed file decrypts to the plaintext on disk
    Verify(OutputArgs),

    /// Diagnose config, directory, and cipher tool
    Doctor,

    /// Write a default confseal.toml
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for `encrypt` and `decrypt`
#[derive(Args)]
pub struct SealArgs {
    /// List the files that would be processed without touching them
    #[arg(long)]
    pub dry_run: bool,

    /// Output the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for read-only reporting commands
#[derive(Args)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Where to write the config file (default: ./confseal.toml)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Replace an existing config file
    #[arg(long)]
    pub force: bool,

    /// Who operators should ask for the passphrase
    #[arg(long)]
    pub contact: Option<String>,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PassphraseSourceArg {
    Prompt,
    Env,
    Keychain,
    Tool,
}

impl From<PassphraseSourceArg> for PassphraseSource {
    fn from(value: PassphraseSourceArg) -> Self {
        match value {
            PassphraseSourceArg::Prompt => PassphraseSource::Prompt,
            PassphraseSourceArg::Env => PassphraseSource::Env,
            PassphraseSourceArg::Keychain => PassphraseSource::Keychain,
            PassphraseSourceArg::Tool => PassphraseSource::Tool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    External,
    Age,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "confseal",
            "decrypt",
            "--dir",
            "secrets",
            "--passphrase-source",
            "env",
            "-vv",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("secrets")));
        assert_eq!(cli.passphrase_source, Some(PassphraseSourceArg::Env));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Decrypt(args)) => {
                assert!(args.json);
                assert!(!args.dry_run);
            }
            _ => panic!("expected decrypt"),
        }
    }
}
