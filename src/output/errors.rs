/// Errors from the output layer.
use std::fmt::Display;
use std::io::{self, Write};

use thiserror::Error;

/// Errors that can occur while rendering output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The value could not be serialized to JSON (e.g. an unhandled opaque type).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The value could not be serialized to TOML.
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Writing to the output stream failed.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Print a failed `print_*` call's error to stderr.
pub(crate) fn report<E: Display>(result: Result<(), E>) {
    report_to(result, &mut io::stderr());
}

fn report_to<E: Display>(result: Result<(), E>, err_out: &mut impl Write) {
    if let Err(e) = result {
        let _ = writeln!(err_out, "{e}");
    }
}
