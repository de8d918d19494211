/// Reading the config document out of a (possibly encrypted) zip archive.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use super::errors::ConfigError;

/// Whether `path` should be treated as a zip archive (by extension, case-insensitive).
#[must_use]
pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Read the first entry of the archive at `path` as UTF-8 text.
///
/// "First" is index 0 of the central directory. An empty `password` is treated
/// the same as no password.
///
/// # Errors
///
/// - `ConfigError::Io` if the file cannot be opened or the entry is not UTF-8
/// - `ConfigError::EmptyArchive` if the archive has no entries
/// - `ConfigError::Archive` for corrupt archives, a missing password, or a wrong one
pub fn read_first_entry(path: &Path, password: Option<&str>) -> Result<String, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut archive = ZipArchive::new(file)?;
    if archive.is_empty() {
        return Err(ConfigError::EmptyArchive);
    }

    let mut entry = match password.filter(|p| !p.is_empty()) {
        Some(password) => archive.by_index_decrypt(0, password.as_bytes())?,
        None => archive.by_index(0)?,
    };
    debug!(archive = %path.display(), entry = entry.name(), "reading config from zip entry");

    let mut text = String::new();
    entry.read_to_string(&mut text).map_err(io_err)?;
    Ok(text)
}
