/// Plain text output: `Display` values joined by single spaces.
use std::fmt::Display;
use std::io::{self, Write};

use super::errors::report;

/// Write `parts` space-separated, followed by a newline.
///
/// # Errors
///
/// Returns any I/O error from `out`.
pub fn write_plain(out: &mut impl Write, parts: &[&dyn Display]) -> io::Result<()> {
    let mut first = true;
    for part in parts {
        if !first {
            out.write_all(b" ")?;
        }
        write!(out, "{part}")?;
        first = false;
    }
    writeln!(out)
}

/// Print `parts` space-separated to stdout. See also [`print_plain!`](crate::print_plain).
pub fn print_plain(parts: &[&dyn Display]) {
    report(write_plain(&mut io::stdout().lock(), parts));
}

/// Print any number of `Display` values to stdout, space-separated.
///
/// ```
/// clikit::print_plain!("listening on", "0.0.0.0", 8080);
/// ```
#[macro_export]
macro_rules! print_plain {
    ($($arg:expr),* $(,)?) => {
        $crate::output::print_plain(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}
