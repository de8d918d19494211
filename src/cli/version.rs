/// The `--version` / `-V` flag.
use std::io::{self, Write};

use clap::{Arg, ArgAction};

use super::errors::CliError;

/// Argument id of the version flag.
pub const VERSION_ARG_ID: &str = "version";

/// Prints `<package_name>: <version>` and requests exit 0 when its flag is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCallback {
    package_name: String,
    version: String,
}

/// Create a version callback for hosts that install their own top-level callback.
///
/// Pair it with [`VersionCallback::arg`] on the registry and call
/// [`VersionCallback::call`] with the flag's value from the callback.
#[must_use]
pub fn create_version_callback(
    package_name: impl Into<String>,
    version: impl Into<String>,
) -> VersionCallback {
    VersionCallback {
        package_name: package_name.into(),
        version: version.into(),
    }
}

impl VersionCallback {
    /// The `-V` / `--version` flag definition.
    #[must_use]
    pub fn arg() -> Arg {
        Arg::new(VERSION_ARG_ID)
            .short('V')
            .long("version")
            .action(ArgAction::SetTrue)
            .help("Print version")
    }

    /// The line printed for `--version`.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{}: {}", self.package_name, self.version)
    }

    /// No-op when `value` is false; otherwise print the version line to stdout.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Exit { code: 0 }` after printing, so the caller stops
    /// processing the command line.
    pub fn call(&self, value: bool) -> Result<(), CliError> {
        self.call_with(value, &mut io::stdout())
    }

    /// [`VersionCallback::call`] writing to `out`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Exit { code: 0 }` after printing, or `CliError::Io` if
    /// the write fails.
    pub fn call_with(&self, value: bool, out: &mut impl Write) -> Result<(), CliError> {
        if !value {
            return Ok(());
        }
        writeln!(out, "{}", self.line())?;
        Err(CliError::exit(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_when_false() {
        let mut buf = Vec::new();
        let cb = create_version_callback("clikit", "0.1.0");
        assert!(cb.call_with(false, &mut buf).is_ok());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_prints_and_exits_when_true() {
        let mut buf = Vec::new();
        let cb = create_version_callback("clikit", "0.1.0");
        let err = cb.call_with(true, &mut buf).unwrap_err();
        assert!(matches!(err, CliError::Exit { code: 0 }));
        assert_eq!(String::from_utf8(buf).unwrap(), "clikit: 0.1.0\n");
    }

    #[test]
    fn test_arg_flags() {
        let arg = VersionCallback::arg();
        assert_eq!(arg.get_short(), Some('V'));
        assert_eq!(arg.get_long(), Some("version"));
    }
}
