//! How command output is shaped.

use super::context::Terminal;

/// Output shape for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Reports and plans as JSON on stdout, nothing else there
    Json,
    /// `key=value` records, one per line, for CI logs and pipes
    #[default]
    Plain,
    /// Badges, tables and the verify spinner
    Pretty,
}

impl OutputMode {
    /// `--json` wins; otherwise pretty only on a capable terminal.
    pub fn resolve(json: bool, terminal: &Terminal) -> Self {
        if json {
            Self::Json
        } else if terminal.is_capable() {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    pub fn is_json(self) -> bool {
        self == Self::Json
    }

    pub fn is_pretty(self) -> bool {
        self == Self::Pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(stdout_tty: bool, dumb: bool) -> Terminal {
        Terminal {
            stdout_tty,
            dumb,
            ..Terminal::default()
        }
    }

    #[test]
    fn test_json_flag_beats_terminal() {
        assert_eq!(OutputMode::resolve(true, &terminal(true, false)), OutputMode::Json);
    }

    #[test]
    fn test_piped_output_is_plain() {
        // CI runs of `confseal decrypt` land here.
        assert_eq!(OutputMode::resolve(false, &terminal(false, false)), OutputMode::Plain);
    }

    #[test]
    fn test_dumb_terminal_is_plain() {
        assert_eq!(OutputMode::resolve(false, &terminal(true, true)), OutputMode::Plain);
        assert_eq!(OutputMode::resolve(false, &terminal(true, false)), OutputMode::Pretty);
    }
}
