#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! clikit: small ergonomics helpers for command-line programs.
//!
//! - [`output`]: plain, JSON, table, and syntax-highlighted TOML printers.
//! - [`config`]: strict TOML config loading from files or (encrypted) zip archives.
//! - [`cli`]: a command registry with aliases and an automatic `--version` flag.

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod utils;

pub use utils::fatal;
