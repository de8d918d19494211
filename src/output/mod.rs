/// Output layer: plain, JSON, table, and highlighted TOML printers.
///
/// Every `print_*` function writes to stdout; the matching `write_*` function
/// takes any `io::Write` so callers (and tests) can capture output.
pub mod errors;
pub mod format;
pub mod highlight;
pub mod json;
pub mod plain;
pub mod table;
pub mod toml_output;

pub use errors::OutputError;
pub use format::{OutputFormat, resolve_format};
pub use highlight::Theme;
pub use json::{
    Opaque, TypeHandlers, print_json, print_json_compact, print_json_with, serialize_display,
    write_json, write_json_compact, write_json_with,
};
pub use plain::{print_plain, write_plain};
pub use table::{print_table, render_table, write_table};
pub use toml_output::{TomlInput, TomlOptions, print_toml, render_toml, write_toml};
