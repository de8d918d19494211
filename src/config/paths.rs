/// `~` expansion for user-supplied config paths.
use std::path::{Component, Path, PathBuf};

use super::errors::ConfigError;

/// Expand a leading `~` to the invoking user's home directory.
///
/// Only a bare `~` first component is expanded; `~user` forms are left untouched.
///
/// # Errors
///
/// Returns `ConfigError::NoHomeDir` if the path starts with `~` and the home
/// directory cannot be determined.
pub fn expand_tilde(path: &Path) -> Result<PathBuf, ConfigError> {
    expand_tilde_with(path, dirs::home_dir())
}

fn expand_tilde_with(path: &Path, home: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = home.ok_or(ConfigError::NoHomeDir)?;
            Ok(home.join(components.as_path()))
        }
        _ => Ok(path.to_path_buf()),
    }
}
