//! Spinner shown while sealed files are checked.

use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::context::UiContext;

const UNICODE_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""];
const ASCII_TICKS: &[&str] = &["|", "/", "-", "\\", ""];

/// Indeterminate spinner naming the file currently being processed.
///
/// Inert unless the terminal allows animation and nothing else needs the
/// terminal (a cipher tool prompting for the passphrase, for instance).
pub struct Spinner {
    label: String,
    bar: Option<ProgressBar>,
    seen: Cell<usize>,
}

impl Spinner {
    pub fn new(ctx: &UiContext, label: &str, terminal_in_use: bool) -> Self {
        let bar = (ctx.allows_animation() && !terminal_in_use).then(|| {
            let bar = ProgressBar::new_spinner();
            let (template, ticks) = if ctx.unicode {
                ("{spinner:.cyan} {msg}", UNICODE_TICKS)
            } else {
                ("{spinner} {msg}", ASCII_TICKS)
            };
            // Literal template; on a parse failure the default style stays.
            if let Ok(style) = ProgressStyle::default_spinner().template(template) {
                bar.set_style(style.tick_strings(ticks));
            }
            bar.set_message(format!("{}...", label));
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Self {
            label: label.to_string(),
            bar,
            seen: Cell::new(0),
        }
    }

    /// Move on to `path`.
    pub fn file(&self, path: &Path) {
        self.seen.set(self.seen.get() + 1);
        if let Some(bar) = &self.bar {
            bar.set_message(self.message(path));
        }
    }

    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    fn message(&self, path: &Path) -> String {
        format!("{} {} ({})", self.label, path.display(), self.seen.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::mode::OutputMode;

    fn ui(is_tty: bool, mode: OutputMode) -> UiContext {
        UiContext {
            is_tty,
            color: false,
            unicode: true,
            width: 80,
            mode,
        }
    }

    #[test]
    fn test_spinner_is_inert_without_tty() {
        let spinner = Spinner::new(&ui(false, OutputMode::Plain), "Verifying", false);
        assert!(spinner.bar.is_none());
        spinner.file(Path::new("config/main.json.cast5"));
        spinner.clear();
    }

    #[test]
    fn test_spinner_stays_off_while_tool_prompts() {
        let spinner = Spinner::new(&ui(true, OutputMode::Pretty), "Verifying", true);
        assert!(spinner.bar.is_none());
    }

    #[test]
    fn test_message_counts_files() {
        let spinner = Spinner::new(&ui(false, OutputMode::Plain), "Verifying", false);
        spinner.file(Path::new("config/a.json.cast5"));
        spinner.file(Path::new("config/b.json.cast5"));
        assert_eq!(
            spinner.message(Path::new("config/b.json.cast5")),
            "Verifying config/b.json.cast5 (2)"
        );
    }
}
