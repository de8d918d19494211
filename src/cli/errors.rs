/// Errors from the command registry layer.
use thiserror::Error;

/// Errors raised while building a `CommandRegistry`.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A command or alias name was empty.
    #[error("command and alias names must not be empty")]
    EmptyName,

    /// A command or alias name is already taken.
    #[error("'{name}' is already registered as {existing}")]
    NameConflict {
        /// The rejected name.
        name: String,
        /// What already owns the name.
        existing: String,
    },
}

/// Errors surfaced while dispatching a command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// clap rejected the arguments (unknown command, bad flag, `--help` on a subcommand, ...).
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// No command was given.
    #[error("missing command")]
    MissingCommand,

    /// A handler or callback requested a clean exit with this code.
    #[error("exit requested with code {code}")]
    Exit {
        /// Process exit code.
        code: i32,
    },

    /// Writing help or version text failed.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    /// A command handler failed.
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl CliError {
    /// Request a clean exit with `code` from inside a handler.
    #[must_use]
    pub fn exit(code: i32) -> Self {
        Self::Exit { code }
    }

    /// Recover a `CliError` returned through a handler's `anyhow::Error`, or wrap it.
    #[must_use]
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<CliError>() {
            Ok(cli) => cli,
            Err(other) => Self::Handler(other),
        }
    }

    /// Return the process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(err) => err.exit_code(),
            Self::MissingCommand => 2,
            Self::Exit { code } => *code,
            Self::Io(_) | Self::Handler(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_survives_anyhow_round_trip() {
        let err: anyhow::Error = CliError::exit(0).into();
        let cli = CliError::from_handler(err);
        assert!(matches!(cli, CliError::Exit { code: 0 }));
        assert_eq!(cli.exit_code(), 0);
    }

    #[test]
    fn test_foreign_errors_are_handler_failures() {
        let cli = CliError::from_handler(anyhow::anyhow!("disk full"));
        assert!(matches!(cli, CliError::Handler(_)));
        assert_eq!(cli.exit_code(), 1);
        assert_eq!(cli.to_string(), "disk full");
    }

    #[test]
    fn test_usage_codes() {
        assert_eq!(CliError::MissingCommand.exit_code(), 2);
    }
}
