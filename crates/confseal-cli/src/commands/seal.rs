use confseal_core::{
    BatchEvent, BatchReport, ConfigLayout, Direction, FailureKind, FileJob, FileResult,
};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::cli::SealArgs;
use crate::errors::CliError;
use crate::ui::{badge, field, header, hint, kv, print, table, Badge, Column, UiContext};

use super::{acquire_passphrase, print_contact_notice};

/// `encrypt` and `decrypt`: run every planned file and report each one.
pub fn handle_seal(ctx: &AppContext, direction: Direction, args: &SealArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context(args.json);
    let codec = ctx.codec()?;
    let jobs = plan(codec.layout(), direction)?;
    let dir = codec.layout().dir().display().to_string();

    if args.dry_run {
        return render_plan(&ui, direction, &dir, &jobs);
    }

    print_contact_notice(ctx, &ui)?;

    if jobs.is_empty() {
        if ui.mode.is_json() {
            println!("{}", serde_json::to_string_pretty(&BatchReport::new(direction))?);
        } else if !ctx.quiet() {
            print(&ui, &nothing_to_do(&ui, direction, &dir));
        }
        return Ok(());
    }

    let (passphrase, passphrase_plan) = acquire_passphrase(ctx, Some(direction))?;
    let source = passphrase_plan.provider.describe();
    info!(%direction, files = jobs.len(), %source, "starting batch");

    let quiet = ctx.quiet();
    if !quiet {
        print(&ui, &header(&ui, &direction.to_string(), Some(&dir)));
    }
    let report = match direction {
        Direction::Encrypt => {
            codec.encrypt_all(&passphrase, |event| render_event(&ui, quiet, event))?
        }
        Direction::Decrypt => {
            codec.decrypt_all(&passphrase, |event| render_event(&ui, quiet, event))?
        }
    };

    let wrong_passphrase = report
        .failures()
        .any(|o| failed_on_passphrase(&o.result));
    if passphrase_rejected(&report) {
        if let Some(account) = &passphrase_plan.keychain {
            if let Err(err) = account.forget() {
                warn!("{}", err);
            } else if !ui.mode.is_json() {
                eprintln!(
                    "{}",
                    hint(&ui, "Removed the remembered passphrase from the keychain.")
                );
            }
        }
    }

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !quiet || !report.is_success() {
            println!("{}", summary_line(&ui, &report));
        }
        if wrong_passphrase {
            eprintln!(
                "{}",
                hint(
                    &ui,
                    &format!("Check the passphrase; ask {} if unsure.", ctx.contact()?)
                )
            );
        }
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            direction,
            failed: report.failed(),
            total: report.total(),
        }
        .into())
    }
}

/// A failure that a wrong passphrase explains. Unauthenticated ciphers can
/// pass their padding check and emit garbage, which shows up as invalid
/// plaintext rather than a rejected passphrase.
fn failed_on_passphrase(result: &FileResult) -> bool {
    matches!(
        result,
        FileResult::Failed {
            kind: FailureKind::Passphrase | FailureKind::InvalidPlaintext,
            ..
        }
    )
}

/// Nothing decrypted and every failure points at the passphrase.
fn passphrase_rejected(report: &BatchReport) -> bool {
    report.direction == Direction::Decrypt
        && report.failed() > 0
        && report.succeeded() == 0
        && report.failures().all(|o| failed_on_passphrase(&o.result))
}

fn plan(layout: &ConfigLayout, direction: Direction) -> anyhow::Result<Vec<FileJob>> {
    Ok(match direction {
        Direction::Encrypt => layout.plan_encrypt()?,
        Direction::Decrypt => layout.plan_decrypt()?,
    })
}

fn render_event(ui: &UiContext, quiet: bool, event: BatchEvent) {
    if ui.mode.is_json() {
        return;
    }
    match event {
        BatchEvent::Started { job, index, total } => {
            if !quiet {
                println!("{}", progress_line(ui, job, index, total));
            }
        }
        BatchEvent::Finished { job, result } => match result {
            FileResult::Written => {
                if !quiet {
                    println!("{}", outcome_line(ui, job, result));
                }
            }
            FileResult::Failed { .. } => eprintln!("{}", outcome_line(ui, job, result)),
        },
    }
}

fn render_plan(
    ui: &UiContext,
    direction: Direction,
    dir: &str,
    jobs: &[FileJob],
) -> anyhow::Result<()> {
    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        print(ui, &nothing_to_do(ui, direction, dir));
        return Ok(());
    }

    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            vec![
                job.source.display().to_string(),
                job.target.display().to_string(),
            ]
        })
        .collect();
    print(ui, &header(ui, &format!("{} (dry run)", direction), Some(dir)));
    print(ui, &table(ui, &[Column::new("SOURCE"), Column::new("TARGET")], &rows));
    if ui.mode.is_pretty() {
        print(
            ui,
            &hint(ui, &format!("Run `confseal {}` to process these files.", direction)),
        );
    }
    Ok(())
}

fn nothing_to_do(ui: &UiContext, direction: Direction, dir: &str) -> String {
    let what = match direction {
        Direction::Encrypt => "No plaintext files to encrypt",
        Direction::Decrypt => "No sealed files to decrypt",
    };
    if ui.mode.is_pretty() {
        badge(ui, Badge::Info, &format!("{} in {}", what, dir))
    } else {
        format!("{} files=0", kv(ui, "dir", dir))
    }
}

/// Line printed before each file is attempted.
pub fn progress_line(ui: &UiContext, job: &FileJob, index: usize, total: usize) -> String {
    if ui.mode.is_pretty() {
        format!(
            "{} {} -> {} ({}/{})",
            job.direction.verb(),
            job.source.display(),
            job.target.display(),
            index,
            total
        )
    } else {
        format!(
            "{} {} {}",
            job.direction,
            kv(ui, "source", &job.source.display().to_string()),
            kv(ui, "target", &job.target.display().to_string())
        )
    }
}

/// Line printed once a file is done.
pub fn outcome_line(ui: &UiContext, job: &FileJob, result: &FileResult) -> String {
    match (result, ui.mode.is_pretty()) {
        (FileResult::Written, true) => {
            badge(ui, Badge::Ok, &format!("Wrote {}", job.target.display()))
        }
        (FileResult::Written, false) => format!(
            "status=ok {}",
            kv(ui, "target", &job.target.display().to_string())
        ),
        (FileResult::Failed { kind, message }, true) => badge(
            ui,
            Badge::Err,
            &format!("{} ({}): {}", job.source.display(), kind.label(), message),
        ),
        (FileResult::Failed { kind, message }, false) => format!(
            "status=error {} {} {}",
            kv(ui, "source", &job.source.display().to_string()),
            field("kind", kind.label()),
            field("message", message)
        ),
    }
}

/// Closing summary for a batch.
pub fn summary_line(ui: &UiContext, report: &BatchReport) -> String {
    let done = match report.direction {
        Direction::Encrypt => "Encrypted",
        Direction::Decrypt => "Decrypted",
    };
    if ui.mode.is_pretty() {
        if report.is_success() {
            badge(ui, Badge::Ok, &format!("{} {} files", done, report.total()))
        } else {
            badge(
                ui,
                Badge::Warn,
                &format!(
                    "{} {} of {} files; {} failed",
                    done,
                    report.succeeded(),
                    report.total(),
                    report.failed()
                ),
            )
        }
    } else {
        format!(
            "{} total={} succeeded={} failed={}",
            report.direction,
            report.total(),
            report.succeeded(),
            report.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;
    use confseal_core::FileOutcome;
    use std::path::PathBuf;

    fn ctx(mode: OutputMode) -> UiContext {
        UiContext {
            is_tty: mode == OutputMode::Pretty,
            color: false,
            unicode: false,
            width: 80,
            mode,
        }
    }

    fn job() -> FileJob {
        FileJob {
            direction: Direction::Decrypt,
            source: PathBuf::from("config/main.json.cast5"),
            target: PathBuf::from("config/main.json"),
        }
    }

    fn failed(kind: FailureKind) -> FileResult {
        FileResult::Failed {
            kind,
            message: "x".to_string(),
        }
    }

    fn report(direction: Direction, results: Vec<FileResult>) -> BatchReport {
        let mut report = BatchReport::new(direction);
        for result in results {
            report.push(FileOutcome::new(&job(), result));
        }
        report
    }

    #[test]
    fn test_passphrase_rejected_counts_garbage_plaintext() {
        let decrypt = report(
            Direction::Decrypt,
            vec![
                failed(FailureKind::Passphrase),
                failed(FailureKind::InvalidPlaintext),
            ],
        );
        assert!(passphrase_rejected(&decrypt));

        let garbage_only = report(Direction::Decrypt, vec![failed(FailureKind::InvalidPlaintext)]);
        assert!(passphrase_rejected(&garbage_only));
    }

    #[test]
    fn test_passphrase_rejected_needs_every_failure() {
        let mixed = report(
            Direction::Decrypt,
            vec![
                failed(FailureKind::Passphrase),
                failed(FailureKind::OutputUnwritable),
            ],
        );
        assert!(!passphrase_rejected(&mixed));

        let partly_written = report(
            Direction::Decrypt,
            vec![FileResult::Written, failed(FailureKind::Passphrase)],
        );
        assert!(!passphrase_rejected(&partly_written));

        let encrypt = report(Direction::Encrypt, vec![failed(FailureKind::Passphrase)]);
        assert!(!passphrase_rejected(&encrypt));
        assert!(!passphrase_rejected(&report(Direction::Decrypt, Vec::new())));
    }

    #[test]
    fn test_progress_line_pretty_and_plain() {
        assert_eq!(
            progress_line(&ctx(OutputMode::Pretty), &job(), 1, 2),
            "Decrypting config/main.json.cast5 -> config/main.json (1/2)"
        );
        assert_eq!(
            progress_line(&ctx(OutputMode::Plain), &job(), 1, 2),
            "decrypt source=config/main.json.cast5 target=config/main.json"
        );
    }

    #[test]
    fn test_outcome_line_failure_names_kind() {
        let result = FileResult::Failed {
            kind: FailureKind::Passphrase,
            message: "Incorrect passphrase".to_string(),
        };
        let line = outcome_line(&ctx(OutputMode::Pretty), &job(), &result);
        assert!(line.starts_with("[ERR]"));
        assert!(line.contains("config/main.json.cast5"));
        assert!(line.contains("Incorrect passphrase"));
    }

    #[test]
    fn test_summary_line_counts() {
        let mut report = BatchReport::new(Direction::Decrypt);
        report.push(FileOutcome::new(&job(), FileResult::Written));
        report.push(FileOutcome::new(
            &job(),
            FileResult::Failed {
                kind: FailureKind::ToolMissing,
                message: "openssl not found".to_string(),
            },
        ));

        assert_eq!(
            summary_line(&ctx(OutputMode::Plain), &report),
            "decrypt total=2 succeeded=1 failed=1"
        );
        let pretty = summary_line(&ctx(OutputMode::Pretty), &report);
        assert!(pretty.starts_with("[WARN]"));
        assert!(pretty.contains("Decrypted 1 of 2 files; 1 failed"));
    }
}
