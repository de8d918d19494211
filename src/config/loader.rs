/// The `TomlConfig` trait: load, validate, and print TOML configs.
use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::archive::{is_zip, read_first_entry};
use super::errors::ConfigError;
use super::paths::expand_tilde;
use super::schema::validate;
use crate::output::{TomlInput, TomlOptions, print_toml};
use crate::utils::fatal;

/// Strict TOML configuration for a CLI.
///
/// Implement it (no methods required) on any `Serialize + Deserialize` struct:
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use clikit::config::TomlConfig;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct AppConfig {
///     host: String,
///     port: u16,
/// }
///
/// impl TomlConfig for AppConfig {}
/// ```
///
/// Unknown top-level keys are always rejected.
pub trait TomlConfig: Serialize + DeserializeOwned {
    /// Load and validate a config from a TOML file, or from the first entry of a
    /// `.zip` archive (decrypted with `password` when given).
    ///
    /// `~` in `path` is expanded to the home directory. `password` is ignored for
    /// plain TOML files.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Validation` when the document does not match the schema
    /// - any other `ConfigError` variant for I/O, archive, or TOML syntax failures
    fn load(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self, ConfigError> {
        let table = read_document(path.as_ref(), password)?;
        validate(table)
    }

    /// Like [`TomlConfig::load`], but prints the error and exits with code 1 on failure.
    ///
    /// Validation failures print a `config validation errors` header followed by
    /// one line per field; other failures print `can't load config: <error>`.
    fn load_or_exit(path: impl AsRef<Path>, password: Option<&str>) -> Self {
        match Self::load(path, password) {
            Ok(config) => config,
            Err(err) => fatal(&err.report()),
        }
    }

    /// Serialize to pretty TOML, omitting the `exclude`d top-level keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` if the value cannot be represented as TOML.
    fn to_toml_excluding(&self, exclude: &HashSet<&str>) -> Result<String, ConfigError> {
        let mut table = toml::Table::try_from(self)?;
        for key in exclude {
            table.remove(*key);
        }
        Ok(toml::to_string_pretty(&table)?)
    }

    /// Print the config as highlighted TOML and exit with code 0.
    fn print_and_exit(&self, exclude: &HashSet<&str>) -> ! {
        match self.to_toml_excluding(exclude) {
            Ok(text) => {
                print_toml(&TomlInput::Text(&text), &TomlOptions::default());
                std::process::exit(0);
            }
            Err(err) => fatal(&err.to_string()),
        }
    }
}

/// Read the TOML table from `path`, transparently unpacking `.zip` archives.
fn read_document(path: &Path, password: Option<&str>) -> Result<toml::Table, ConfigError> {
    let expanded = expand_tilde(path)?;
    let text = if is_zip(&expanded) {
        read_first_entry(&expanded, password)?
    } else {
        debug!(path = %expanded.display(), "reading config file");
        std::fs::read_to_string(&expanded).map_err(|source| ConfigError::Io {
            path: expanded.clone(),
            source,
        })?
    };
    Ok(text.parse::<toml::Table>()?)
}
