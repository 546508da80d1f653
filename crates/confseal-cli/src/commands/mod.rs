//! Command handlers, one module per subcommand family.

pub mod doctor;
pub mod init;
pub mod misc;
pub mod seal;
pub mod status;
pub mod verify;

use confseal_core::passphrase::PASSPHRASE_ENV;
use confseal_core::{Direction, Passphrase, SealError};

use crate::app::{AppContext, PassphrasePlan};
use crate::config::DEFAULT_CONTACT;
use crate::errors::CliError;
use crate::ui::{badge, field, Badge, UiContext};

/// Tell the operator who holds the shared passphrase.
///
/// Goes to stderr so `--json` output on stdout stays parseable.
pub(crate) fn print_contact_notice(ctx: &AppContext, ui: &UiContext) -> anyhow::Result<()> {
    let message = format!(
        "The config passphrase is shared out of band. Ask {} for it.",
        ctx.contact()?
    );
    if ui.mode.is_pretty() {
        eprintln!("{}", badge(ui, Badge::Info, &message));
    } else {
        eprintln!("{}", field("notice", &message));
    }
    Ok(())
}

/// Build the provider for this run and ask it for the passphrase.
pub(crate) fn acquire_passphrase(
    ctx: &AppContext,
    direction: Option<Direction>,
) -> anyhow::Result<(Passphrase, PassphrasePlan)> {
    let plan = ctx.passphrase_plan(direction)?;
    let passphrase = plan
        .provider
        .passphrase()
        .map_err(|err| passphrase_error(ctx, err))?;
    Ok((passphrase, plan))
}

fn passphrase_error(ctx: &AppContext, err: SealError) -> anyhow::Error {
    match err {
        SealError::PassphraseUnavailable(message) | SealError::InvalidInput(message) => {
            let (env_var, contact) = match ctx.config() {
                Ok(loaded) => (
                    loaded.config.passphrase.env_var.as_str(),
                    loaded.config.passphrase.contact.as_str(),
                ),
                Err(_) => (PASSPHRASE_ENV, DEFAULT_CONTACT),
            };
            CliError::auth_failed_with_hint(
                message,
                format!(
                    "Hint: Set {} or run in a terminal; ask {} for the passphrase.",
                    env_var, contact
                ),
            )
            .into()
        }
        other => other.into(),
    }
}
