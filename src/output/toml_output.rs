/// Syntax-highlighted TOML output.
use std::io::{self, Write};

use serde::Serialize;
use tracing::debug;

use super::errors::{OutputError, report};
use super::highlight::{Highlighter, Theme};
use crate::cli::ColorWhen;

/// What to print: raw TOML text, or a table to serialize first.
#[derive(Debug, Clone)]
pub enum TomlInput<'a> {
    /// TOML source, printed as-is.
    Text(&'a str),
    /// A table rendered with `toml::to_string_pretty`.
    Table(toml::Table),
}

impl TomlInput<'static> {
    /// Serialize any map-like value (struct, `HashMap`, ...) into a `TomlInput`.
    ///
    /// # Errors
    ///
    /// Returns `OutputError::Toml` if `value` does not serialize to a TOML table.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, OutputError> {
        Ok(Self::Table(toml::Table::try_from(value)?))
    }
}

/// Options for TOML rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlOptions {
    /// Prefix each line with its number.
    pub line_numbers: bool,
    /// Color theme.
    pub theme: Theme,
    /// When to emit ANSI colors. `Auto` checks whether stdout is a TTY.
    pub color: ColorWhen,
}

impl TomlOptions {
    /// Select a theme by name, falling back to the default for unknown names.
    #[must_use]
    pub fn with_theme_name(mut self, name: &str) -> Self {
        self.theme = Theme::from_name(name).unwrap_or_else(|| {
            debug!(theme = name, "unknown TOML theme, using default");
            Theme::default()
        });
        self
    }
}

/// Render `input` as highlighted TOML.
///
/// # Errors
///
/// Returns `OutputError::Toml` if a `TomlInput::Table` cannot be rendered.
pub fn render_toml(input: &TomlInput<'_>, opts: &TomlOptions) -> Result<String, OutputError> {
    let rendered;
    let text = match input {
        TomlInput::Text(text) => *text,
        TomlInput::Table(table) => {
            rendered = toml::to_string_pretty(table)?;
            rendered.as_str()
        }
    };
    let highlighter = Highlighter::new(opts.theme, opts.color.should_color_stdout());
    Ok(highlighter.render(text, opts.line_numbers))
}

/// Write highlighted TOML to `out`.
///
/// # Errors
///
/// Returns `OutputError::Toml` on rendering failure, `OutputError::Io` on write failure.
pub fn write_toml(
    out: &mut impl Write,
    input: &TomlInput<'_>,
    opts: &TomlOptions,
) -> Result<(), OutputError> {
    out.write_all(render_toml(input, opts)?.as_bytes())?;
    Ok(())
}

/// Print highlighted TOML to stdout.
pub fn print_toml(input: &TomlInput<'_>, opts: &TomlOptions) {
    report(write_toml(&mut io::stdout().lock(), input, opts));
}
