/// CLI layer: alias-aware command registry, version flag, and color policy.
pub mod color;
pub mod errors;
pub mod help;
pub mod registry;
pub mod version;

pub use color::ColorWhen;
pub use errors::{CliError, RegistryError};
pub use help::{ClapHelp, HelpFormatter};
pub use registry::{CommandDef, CommandEntry, CommandRegistry};
pub use version::{VersionCallback, create_version_callback};
