/// Color policy shared by every printer.
///
/// An explicit choice wins. Otherwise `NO_COLOR` disables colors, and `Auto`
/// only enables them when the target stream is a TTY.
use std::env;
use std::io::IsTerminal;

use clap::ValueEnum;

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ColorWhen {
    /// Enable colors only when output is a TTY.
    #[default]
    Auto,

    /// Always enable colors.
    Always,

    /// Never enable colors.
    Never,
}

impl ColorWhen {
    /// Returns whether ANSI color should be used for a stream with the given TTY state.
    #[must_use]
    pub fn should_color(self, is_tty: bool) -> bool {
        match self {
            ColorWhen::Always => true,
            ColorWhen::Never => false,
            ColorWhen::Auto => env::var_os("NO_COLOR").is_none() && is_tty,
        }
    }

    /// Convenience helper for stdout.
    #[must_use]
    pub fn should_color_stdout(self) -> bool {
        self.should_color(std::io::stdout().is_terminal())
    }

    /// Convenience helper for stderr.
    #[must_use]
    pub fn should_color_stderr(self) -> bool {
        self.should_color(std::io::stderr().is_terminal())
    }
}
