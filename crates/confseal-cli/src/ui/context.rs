//! Terminal detection and the per-command UI settings derived from it.

use std::io::IsTerminal;

use super::mode::OutputMode;

const FALLBACK_COLUMNS: usize = 80;

/// What the process could learn about its terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminal {
    pub stdout_tty: bool,
    /// `TERM=dumb`
    pub dumb: bool,
    /// `NO_COLOR` is set
    pub no_color: bool,
    pub columns: Option<usize>,
}

impl Terminal {
    pub fn probe() -> Self {
        Self {
            stdout_tty: std::io::stdout().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|term| term == "dumb"),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            columns: columns_from_env().or_else(stdout_columns),
        }
    }

    /// Can render badges, colors and animation.
    pub fn is_capable(&self) -> bool {
        self.stdout_tty && !self.dumb
    }
}

/// Rendering settings for one command.
#[derive(Debug, Clone)]
pub struct UiContext {
    pub is_tty: bool,
    pub color: bool,
    /// `false` under `--ascii`
    pub unicode: bool,
    pub width: usize,
    pub mode: OutputMode,
}

impl UiContext {
    /// Probe the terminal and apply `--json`, `--no-color` and `--ascii`.
    pub fn from_env(json: bool, no_color: bool, ascii: bool) -> Self {
        Self::for_terminal(&Terminal::probe(), json, no_color, ascii)
    }

    pub fn for_terminal(terminal: &Terminal, json: bool, no_color: bool, ascii: bool) -> Self {
        Self {
            is_tty: terminal.stdout_tty,
            color: terminal.is_capable() && !terminal.no_color && !no_color,
            unicode: !ascii,
            width: terminal.columns.unwrap_or(FALLBACK_COLUMNS),
            mode: OutputMode::resolve(json, terminal),
        }
    }

    /// The verify spinner only runs in pretty mode on a real terminal.
    pub fn allows_animation(&self) -> bool {
        self.is_tty && self.mode.is_pretty()
    }
}

fn columns_from_env() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.parse::<usize>().ok())
        .filter(|&cols| cols > 0)
}

#[cfg(unix)]
fn stdout_columns() -> Option<usize> {
    let mut size = std::mem::MaybeUninit::<libc::winsize>::uninit();
    // SAFETY: TIOCGWINSZ writes only into the winsize passed in.
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, size.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: the ioctl succeeded and filled `size`.
    let size = unsafe { size.assume_init() };
    (size.ws_col > 0).then_some(size.ws_col as usize)
}

#[cfg(not(unix))]
fn stdout_columns() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tty() -> Terminal {
        Terminal {
            stdout_tty: true,
            columns: Some(120),
            ..Terminal::default()
        }
    }

    #[test]
    fn test_tty_gets_color_and_animation() {
        let ui = UiContext::for_terminal(&tty(), false, false, false);
        assert!(ui.color);
        assert!(ui.unicode);
        assert!(ui.allows_animation());
        assert_eq!(ui.width, 120);
    }

    #[test]
    fn test_no_color_from_flag_or_env() {
        assert!(!UiContext::for_terminal(&tty(), false, true, false).color);

        let terminal = Terminal {
            no_color: true,
            ..tty()
        };
        let ui = UiContext::for_terminal(&terminal, false, false, false);
        assert!(!ui.color);
        assert!(ui.mode.is_pretty());
    }

    #[test]
    fn test_json_never_animates() {
        let ui = UiContext::for_terminal(&tty(), true, false, true);
        assert!(ui.mode.is_json());
        assert!(!ui.unicode);
        assert!(!ui.allows_animation());
    }

    #[test]
    fn test_pipe_falls_back_to_plain_width() {
        let ui = UiContext::for_terminal(&Terminal::default(), false, false, false);
        assert_eq!(ui.mode, OutputMode::Plain);
        assert!(!ui.color);
        assert_eq!(ui.width, FALLBACK_COLUMNS);
    }
}
