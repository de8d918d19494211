/// Errors from the config loading layer.
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single schema violation, located by a dotted path into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the offending field (e.g. `server.port`). Empty for the document root.
    pub location: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// All schema violations found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub(crate) fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Per-field errors in the order they were detected.
    ///
    /// Unknown keys are all listed, but at most one type or missing-field
    /// error follows them: a document lacking both `host` and `port` reports
    /// only `host`.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Multi-line report: a header line followed by one indented line per field.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = vec!["config validation errors".to_owned()];
        lines.extend(self.errors.iter().map(|e| format!("  {e}")));
        lines.join("\n")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "validation_error: {}", fields.join("; "))
    }
}

/// Errors that can occur while loading a TOML config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document parsed but does not match the declared schema.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A `.zip` source with no entries.
    #[error("zip archive is empty")]
    EmptyArchive,

    /// The file (or archive) could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path after `~` expansion.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive is corrupt, encrypted without a password, or the password is wrong.
    #[error("zip archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Malformed TOML syntax.
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered back to TOML.
    #[error("can't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `~` was used but the home directory is unknown.
    #[error("can't expand '~': home directory is unknown")]
    NoHomeDir,
}

impl ConfigError {
    /// Whether this is a schema violation (as opposed to an I/O or syntax failure).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Field errors for schema violations; `None` for every other failure.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// The full user-facing report printed by `load_or_exit`.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Validation(errors) => errors.report(),
            other => format!("can't load config: {other}"),
        }
    }
}
