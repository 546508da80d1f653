use confseal_core::{VerifyOutcome, VerifyResult};
use tracing::info;

use crate::app::AppContext;
use crate::cli::OutputArgs;
use crate::errors::CliError;
use crate::ui::{badge, header, print, table, Badge, Column, Spinner, UiContext};

use super::{acquire_passphrase, print_contact_notice};

pub fn handle_verify(ctx: &AppContext, args: &OutputArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(args.json);
    let codec = ctx.codec()?;
    let dir = codec.layout().dir().display().to_string();

    print_contact_notice(ctx, &ui)?;
    let (passphrase, _plan) = acquire_passphrase(ctx, None)?;

    // A delegated passphrase means the tool prompts on the terminal per file.
    let spinner = Spinner::new(&ui, "Verifying", passphrase.is_delegated());
    let outcomes = codec.verify_all(&passphrase, |job| spinner.file(&job.source));
    spinner.clear();
    let outcomes = outcomes?;

    let mismatched = outcomes.iter().filter(|o| counts_as_mismatch(o)).count();
    info!(total = outcomes.len(), mismatched, "verify finished");

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        if !ctx.quiet() {
            print(&ui, &header(&ui, "verify", Some(&dir)));
        }
        if outcomes.is_empty() {
            print(
                &ui,
                &badge(&ui, Badge::Info, &format!("No sealed files in {}", dir)),
            );
        } else {
            let rows: Vec<Vec<String>> = outcomes.iter().map(|o| verify_row(&ui, o)).collect();
            print(
                &ui,
                &table(&ui, &[Column::new("SEALED"), Column::new("RESULT")], &rows),
            );
            if mismatched == 0 && !ctx.quiet() {
                print(
                    &ui,
                    &badge(
                        &ui,
                        Badge::Ok,
                        &format!("All {} sealed files verified", outcomes.len()),
                    ),
                );
            }
        }
    }

    if mismatched > 0 {
        return Err(CliError::IntegrityFailed {
            mismatched,
            total: outcomes.len(),
        }
        .into());
    }
    Ok(())
}

fn counts_as_mismatch(outcome: &VerifyOutcome) -> bool {
    matches!(
        outcome.result,
        VerifyResult::Differs | VerifyResult::Failed { .. }
    )
}

fn verify_row(ui: &UiContext, outcome: &VerifyOutcome) -> Vec<String> {
    let result = match &outcome.result {
        VerifyResult::Match => badge(ui, Badge::Ok, "matches plaintext"),
        VerifyResult::Differs => badge(ui, Badge::Warn, "plaintext differs"),
        VerifyResult::PlaintextMissing => badge(ui, Badge::Info, "no plaintext to compare"),
        VerifyResult::Failed { kind, message } => {
            badge(ui, Badge::Err, &format!("{}: {}", kind.label(), message))
        }
    };
    vec![outcome.ciphertext.display().to_string(), result]
}

#[cfg(test)]
mod tests {
    use super::*;
    use confseal_core::FailureKind;
    use std::path::PathBuf;

    fn outcome(result: VerifyResult) -> VerifyOutcome {
        VerifyOutcome {
            ciphertext: PathBuf::from("config/main.json.cast5"),
            plaintext: PathBuf::from("config/main.json"),
            result,
        }
    }

    #[test]
    fn test_mismatch_counting() {
        assert!(!counts_as_mismatch(&outcome(VerifyResult::Match)));
        assert!(!counts_as_mismatch(&outcome(VerifyResult::PlaintextMissing)));
        assert!(counts_as_mismatch(&outcome(VerifyResult::Differs)));
        assert!(counts_as_mismatch(&outcome(VerifyResult::Failed {
            kind: FailureKind::Passphrase,
            message: "Incorrect passphrase".to_string(),
        })));
    }

    #[test]
    fn test_verify_row_plain() {
        let ui = UiContext {
            is_tty: false,
            color: false,
            unicode: false,
            width: 80,
            mode: crate::ui::OutputMode::Plain,
        };
        let row = verify_row(&ui, &outcome(VerifyResult::Differs));
        assert_eq!(row, vec!["config/main.json.cast5", "[WARN] plaintext differs"]);
    }
}
