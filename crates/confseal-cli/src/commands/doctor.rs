use confseal_core::{Cipher, PairState};

use crate::app::AppContext;
use crate::config::{CipherBackend, PassphraseSource};
use crate::ui::{badge, field, header, hint, Badge, UiContext};

/// One diagnostic line.
struct Check {
    name: &'static str,
    badge: Badge,
    detail: String,
}

impl Check {
    fn new(name: &'static str, badge: Badge, detail: impl Into<String>) -> Self {
        Self {
            name,
            badge,
            detail: detail.into(),
        }
    }

    fn render(&self, ui: &UiContext) -> String {
        if ui.mode.is_pretty() {
            badge(ui, self.badge, &format!("{}: {}", self.name, self.detail))
        } else {
            let status = match self.badge {
                Badge::Ok => "ok",
                Badge::Warn => "warn",
                Badge::Err => "err",
                Badge::Info => "info",
            };
            format!(
                "check={} status={} {}",
                self.name,
                status,
                field("detail", &self.detail)
            )
        }
    }
}

pub fn handle_doctor(ctx: &AppContext) -> anyhow::Result<()> {
    let ui = ctx.ui_context(false);
    let checks = run_checks(ctx)?;
    let failed = checks.iter().any(|c| c.badge == Badge::Err);

    if !ctx.quiet() || failed {
        println!("{}", header(&ui, "doctor", None));
        for check in &checks {
            println!("{}", check.render(&ui));
        }
    }

    if failed {
        eprintln!(
            "{}",
            hint(&ui, "Fix the failing checks above, then rerun `confseal doctor`.")
        );
        return Err(anyhow::anyhow!("Doctor found problems"));
    }
    Ok(())
}

fn run_checks(ctx: &AppContext) -> anyhow::Result<Vec<Check>> {
    let mut checks = Vec::new();
    let loaded = ctx.config()?;

    checks.push(match &loaded.path {
        Some(path) => Check::new("config", Badge::Ok, path.display().to_string()),
        None => Check::new("config", Badge::Info, "no config file; using defaults"),
    });

    let dir = ctx.config_dir()?;
    let layout = match ctx.layout() {
        Ok(layout) => Some(layout),
        Err(err) => {
            checks.push(Check::new(
                "directory",
                Badge::Err,
                err.to_string().lines().next().unwrap_or_default().to_string(),
            ));
            None
        }
    };
    if let Some(layout) = &layout {
        match layout.pairs() {
            Ok(pairs) => {
                let sealed = pairs.iter().filter(|p| p.ciphertext.is_some()).count();
                let unsealed = pairs
                    .iter()
                    .filter(|p| matches!(p.state, PairState::Stale | PairState::PlaintextOnly))
                    .count();
                let badge = if unsealed > 0 { Badge::Warn } else { Badge::Ok };
                checks.push(Check::new(
                    "directory",
                    badge,
                    format!(
                        "{} ({} sealed, {} need encrypting)",
                        dir.display(),
                        sealed,
                        unsealed
                    ),
                ));
            }
            Err(err) => checks.push(Check::new("directory", Badge::Err, err.to_string())),
        }
    }

    let backend = ctx.backend()?;
    match ctx.cipher() {
        Ok(cipher) => match cipher.probe() {
            Ok(version) => checks.push(Check::new(
                "cipher",
                Badge::Ok,
                format!("{} ({})", cipher.name(), version),
            )),
            Err(err) => checks.push(Check::new("cipher", Badge::Err, err.to_string())),
        },
        Err(err) => checks.push(Check::new("cipher", Badge::Err, err.to_string())),
    }

    let source = ctx.passphrase_source()?;
    match ctx.passphrase_plan(None) {
        Ok(plan) => {
            let env_var = &loaded.config.passphrase.env_var;
            let env_set = std::env::var(env_var)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            let check = match source {
                PassphraseSource::Env if !env_set => Check::new(
                    "passphrase",
                    Badge::Warn,
                    format!("{} ({} is not set)", plan.provider.describe(), env_var),
                ),
                PassphraseSource::Prompt if !env_set && !ctx.interactive() => Check::new(
                    "passphrase",
                    Badge::Warn,
                    format!(
                        "{} (no terminal and {} is not set)",
                        plan.provider.describe(),
                        env_var
                    ),
                ),
                _ => Check::new("passphrase", Badge::Ok, plan.provider.describe()),
            };
            checks.push(check);
        }
        Err(err) => checks.push(Check::new("passphrase", Badge::Err, err.to_string())),
    }

    if backend == CipherBackend::External && source == PassphraseSource::Tool {
        checks.push(Check::new(
            "prompting",
            Badge::Info,
            "the cipher tool asks for the passphrase once per file",
        ));
    }

    Ok(checks)
}
