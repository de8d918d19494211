#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! clikit: demo command line wiring the registry, config loader, and printers together.

use std::collections::HashSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Instant;

use clap::{ArgMatches, Args, FromArgMatches, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::json;

use clikit::cli::{ColorWhen, CommandDef, CommandRegistry, RegistryError};
use clikit::config::TomlConfig;
use clikit::output::{
    Opaque, OutputFormat, Theme, TomlInput, TomlOptions, TypeHandlers, print_json,
    print_json_compact, print_json_with, print_plain, print_table, print_toml, resolve_format,
};
use clikit::{fatal, logging};

/// Top-level keys never echoed back by `config --print`.
const SECRET_KEYS: [&str; 1] = ["token"];

#[derive(Debug, Serialize, Deserialize)]
struct DemoConfig {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default)]
    servers: Vec<Server>,
}

impl TomlConfig for DemoConfig {}

#[derive(Debug, Serialize, Deserialize)]
struct Server {
    host: String,
    port: u16,
}

/// `config` command arguments.
#[derive(Debug, Args)]
struct ConfigArgs {
    /// TOML file, or zip archive whose first entry is one.
    path: PathBuf,

    /// Password for an encrypted zip archive.
    #[arg(long)]
    password: Option<String>,

    /// Output format for the server list.
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Shorthand for `--output json`.
    #[arg(long)]
    json: bool,

    /// Print the whole config as highlighted TOML instead.
    #[arg(long)]
    toml: bool,

    /// Highlighting theme for `--toml`.
    #[arg(long, default_value = "monokai")]
    theme: String,

    /// Number the lines of `--toml` output.
    #[arg(long)]
    line_numbers: bool,

    /// When to color `--toml` output.
    #[arg(long, value_enum, default_value_t)]
    color: ColorWhen,

    /// Print the config as TOML without secrets, then exit.
    #[arg(long)]
    print: bool,
}

/// `uptime` output; `Instant` has no `Serialize` impl of its own.
#[derive(Serialize)]
struct Uptime {
    uptime_secs: Opaque<Instant>,
}

/// `echo` command arguments.
#[derive(Debug, Args)]
struct EchoArgs {
    /// Words to print.
    words: Vec<String>,
}

fn show_config(matches: &ArgMatches) -> anyhow::Result<()> {
    let args = ConfigArgs::from_arg_matches(matches)?;
    let config = DemoConfig::load_or_exit(&args.path, args.password.as_deref());

    if args.print {
        config.print_and_exit(&HashSet::from(SECRET_KEYS));
    }

    if args.toml {
        let opts = TomlOptions {
            line_numbers: args.line_numbers,
            color: args.color,
            ..TomlOptions::default()
        }
        .with_theme_name(&args.theme);
        print_toml(&TomlInput::serialize(&config)?, &opts);
        return Ok(());
    }

    match resolve_format(args.output, args.json) {
        OutputFormat::Json | OutputFormat::Auto => print_json(&config.servers),
        OutputFormat::Compact => print_json_compact(&config.servers),
        OutputFormat::Table => print_table(
            &["HOST", "PORT"],
            config
                .servers
                .iter()
                .map(|s| [s.host.clone(), s.port.to_string()]),
            Some(config.name.as_str()),
        ),
        OutputFormat::Plain => {
            for server in &config.servers {
                clikit::print_plain!(server.host, server.port);
            }
        }
    }
    Ok(())
}

fn echo(matches: &ArgMatches) -> anyhow::Result<()> {
    let args = EchoArgs::from_arg_matches(matches)?;
    let parts: Vec<&dyn Display> = args.words.iter().map(|w| w as &dyn Display).collect();
    print_plain(&parts);
    Ok(())
}

fn build(started: Instant) -> Result<CommandRegistry, RegistryError> {
    CommandRegistry::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .package(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .command(
            CommandDef::new("config", show_config)
                .about("Load a config file and print it.")
                .aliases(["c", "cfg"])
                .args_from::<ConfigArgs>(),
        )?
        .command(
            CommandDef::new("echo", echo)
                .about("Print the arguments, space-separated.")
                .aliases(["e"])
                .args_from::<EchoArgs>(),
        )?
        .command(
            CommandDef::new("themes", |_| {
                let names = Theme::value_variants()
                    .iter()
                    .filter_map(ValueEnum::to_possible_value)
                    .map(|v| [v.get_name().to_owned()]);
                print_table(&["THEME"], names, None);
                Ok(())
            })
            .about("List TOML highlighting themes."),
        )?
        .command(
            CommandDef::new("uptime", move |_| {
                let handlers = TypeHandlers::new()
                    .with(|t: &Instant| json!(t.elapsed().as_secs_f64()));
                print_json_with(&Uptime { uptime_secs: Opaque(started) }, &handlers);
                Ok(())
            })
            .about("Print seconds since startup as JSON.")
            .hidden(true),
        )
}

fn main() {
    if let Err(err) = logging::init_tracing(ColorWhen::Auto) {
        eprintln!("{err}");
    }

    let mut app = match build(Instant::now()) {
        Ok(app) => app,
        Err(err) => fatal(&err.to_string()),
    };
    app.run();
}
