/// Output format selection with TTY auto-detection.
use std::io::IsTerminal;

use clap::ValueEnum;

/// Output format variants, usable directly as a clap `--output` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Pretty-printed JSON.
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Aligned table with headers (human-readable).
    Table,
    /// Space-separated plain text, one record per line.
    Plain,
}

/// Resolve the effective output format, handling a `--json` shorthand flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    resolve_format_for(fmt, json_flag, std::io::stdout().is_terminal())
}

fn resolve_format_for(fmt: OutputFormat, json_flag: bool, is_tty: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    match fmt {
        OutputFormat::Auto if is_tty => OutputFormat::Table,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    }
}
