/// Config layer: strict TOML loading from files or zip archives.
pub mod archive;
pub mod errors;
pub mod loader;
pub mod paths;
pub mod schema;

pub use errors::{ConfigError, FieldError, ValidationErrors};
pub use loader::TomlConfig;
pub use paths::expand_tilde;
