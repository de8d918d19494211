/// Table output via comfy-table.
use std::fmt::Display;
use std::io::{self, Write};

use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};

use super::errors::report;

/// Render a table with `columns` as headers and every cell stringified via `Display`.
///
/// An optional `title` is centered above the table.
#[must_use]
pub fn render_table<H, R, C>(columns: &[H], rows: R, title: Option<&str>) -> String
where
    H: Display,
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: Display,
{
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(columns.iter().map(|c| Cell::new(c.to_string())));
    for row in rows {
        table.add_row(row.into_iter().map(|c| Cell::new(c.to_string())));
    }

    let body = table.to_string();
    match title {
        Some(title) => {
            let width = body.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            format!("{title:^width$}\n{body}")
        }
        None => body,
    }
}

/// Write a rendered table followed by a newline.
///
/// # Errors
///
/// Returns any I/O error from `out`.
pub fn write_table<H, R, C>(
    out: &mut impl Write,
    columns: &[H],
    rows: R,
    title: Option<&str>,
) -> io::Result<()>
where
    H: Display,
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: Display,
{
    writeln!(out, "{}", render_table(columns, rows, title))
}

/// Print a table to stdout.
pub fn print_table<H, R, C>(columns: &[H], rows: R, title: Option<&str>)
where
    H: Display,
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: Display,
{
    report(write_table(&mut io::stdout().lock(), columns, rows, title));
}
