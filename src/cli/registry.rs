/// Command registry with aliases, composed around `clap::Command`.
///
/// Every canonical command and every alias is exposed to the parser, so
/// `app d` and `app deploy` dispatch to the same handler. Aliases are hidden
/// subcommands; the help screen lists each canonical command once, annotated
/// as `deploy (d)`.
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::ops::Deref;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches};
use tracing::debug;

use super::errors::{CliError, RegistryError};
use super::help::{ClapHelp, HelpFormatter, annotate, render_fallback};
use super::version::{VERSION_ARG_ID, VersionCallback};

/// Argument id of the root help flag.
const HELP_ARG_ID: &str = "help";

/// Minimum Jaro similarity for a "did you mean" suggestion.
const SUGGEST_THRESHOLD: f64 = 0.7;

type Handler = dyn Fn(&ArgMatches) -> anyhow::Result<()>;

// --- Command definitions ---

/// A command waiting to be registered.
pub struct CommandDef {
    name: String,
    about: Option<String>,
    hidden: bool,
    aliases: Vec<String>,
    args: Vec<Arg>,
    handler: Box<Handler>,
}

impl CommandDef {
    /// Define a command named `name` that runs `handler` with its parsed arguments.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        handler: impl Fn(&ArgMatches) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            about: None,
            hidden: false,
            aliases: Vec::new(),
            args: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Set the help text. Its first line is the short help in listings.
    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Hide the command from every help listing. It still dispatches.
    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Add alternate names. Order is kept for display.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Add an argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Add every argument of a clap derive `Args` struct.
    ///
    /// The handler reads them back with `A::from_arg_matches`.
    #[must_use]
    pub fn args_from<A: clap::Args>(mut self) -> Self {
        let cmd = A::augment_args(clap::Command::new(self.name.clone()));
        self.args.extend(cmd.get_arguments().cloned());
        self
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

/// A registered command.
pub struct CommandEntry {
    name: String,
    display_name: String,
    about: Option<String>,
    hidden: bool,
    args: Vec<Arg>,
    handler: Box<Handler>,
}

impl CommandEntry {
    /// The canonical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name help renders. Equal to [`CommandEntry::name`] outside of help rendering.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// First line of the help text, or `""`.
    #[must_use]
    pub fn short_help(&self) -> &str {
        self.about
            .as_deref()
            .and_then(|about| about.lines().next())
            .unwrap_or("")
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Run the handler.
    ///
    /// # Errors
    ///
    /// Whatever the handler returns.
    pub fn invoke(&self, matches: &ArgMatches) -> anyhow::Result<()> {
        (self.handler)(matches)
    }

    /// The parser-side subcommand, registered under `name`.
    fn to_clap(&self, name: &str, hide: bool) -> clap::Command {
        with_about(clap::Command::new(name.to_owned()), self.about.as_deref())
            .hide(hide)
            .disable_help_flag(true)
            .arg(
                Arg::new(HELP_ARG_ID)
                    .short('h')
                    .long("help")
                    .action(ArgAction::Help)
                    .help("Print help"),
            )
            .args(self.args.iter().cloned())
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

// --- Registry ---

/// A set of commands with aliases, plus the root flags and callback.
pub struct CommandRegistry {
    name: String,
    about: Option<String>,
    entries: Vec<CommandEntry>,
    /// Every parser-visible name, canonical or alias, in registration order.
    exposed: Vec<(String, usize)>,
    alias_to_canonical: HashMap<String, String>,
    canonical_to_aliases: HashMap<String, Vec<String>>,
    version: Option<VersionCallback>,
    callback: Option<Box<Handler>>,
    root_args: Vec<Arg>,
}

impl CommandRegistry {
    /// An empty registry for the program `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            entries: Vec::new(),
            exposed: Vec::new(),
            alias_to_canonical: HashMap::new(),
            canonical_to_aliases: HashMap::new(),
            version: None,
            callback: None,
            root_args: Vec::new(),
        }
    }

    /// Set the top-level description.
    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Enable `-V` / `--version`, printing `<package_name>: <version>`.
    ///
    /// Ignored when a top-level callback is installed; such hosts wire the
    /// flag themselves with [`super::create_version_callback`].
    #[must_use]
    pub fn package(mut self, package_name: impl Into<String>, version: impl Into<String>) -> Self {
        self.version = Some(super::create_version_callback(package_name, version));
        self
    }

    /// Install a top-level callback, run with the root matches before dispatch.
    #[must_use]
    pub fn callback(mut self, f: impl Fn(&ArgMatches) -> anyhow::Result<()> + 'static) -> Self {
        self.callback = Some(Box::new(f));
        self
    }

    /// Add a top-level argument.
    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.root_args.push(arg);
        self
    }

    /// Register a command and its aliases.
    ///
    /// # Errors
    ///
    /// `EmptyName` for an empty name or alias; `NameConflict` when the name or
    /// an alias is already taken, or repeated within the definition. Nothing
    /// is registered on error.
    pub fn command(mut self, def: CommandDef) -> Result<Self, RegistryError> {
        let CommandDef {
            name,
            about,
            hidden,
            aliases,
            args,
            handler,
        } = def;

        if name.is_empty() || aliases.iter().any(String::is_empty) {
            return Err(RegistryError::EmptyName);
        }

        let mut pending: Vec<&str> = Vec::with_capacity(aliases.len() + 1);
        for candidate in std::iter::once(&name).chain(&aliases) {
            self.check_available(candidate)?;
            if pending.contains(&candidate.as_str()) {
                return Err(RegistryError::NameConflict {
                    name: candidate.clone(),
                    existing: format!("another name of '{name}'"),
                });
            }
            pending.push(candidate);
        }

        let index = self.entries.len();
        self.exposed.push((name.clone(), index));
        if !aliases.is_empty() {
            for alias in &aliases {
                self.alias_to_canonical.insert(alias.clone(), name.clone());
                self.exposed.push((alias.clone(), index));
            }
            debug!(command = %name, aliases = ?aliases, "registered command");
            self.canonical_to_aliases.insert(name.clone(), aliases);
        } else {
            debug!(command = %name, "registered command");
        }

        self.entries.push(CommandEntry {
            display_name: name.clone(),
            name,
            about,
            hidden,
            args,
            handler,
        });
        Ok(self)
    }

    fn check_available(&self, name: &str) -> Result<(), RegistryError> {
        if let Some(canonical) = self.alias_to_canonical.get(name) {
            return Err(RegistryError::NameConflict {
                name: name.to_owned(),
                existing: format!("an alias of '{canonical}'"),
            });
        }
        if self.entries.iter().any(|entry| entry.name == name) {
            return Err(RegistryError::NameConflict {
                name: name.to_owned(),
                existing: "a command".to_owned(),
            });
        }
        Ok(())
    }

    /// The program name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a command by canonical name or alias.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&CommandEntry> {
        let canonical = self
            .alias_to_canonical
            .get(name)
            .map_or(name, String::as_str);
        self.entries.iter().find(|entry| entry.name == canonical)
    }

    /// The canonical name behind `name`, if it is registered at all.
    #[must_use]
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(CommandEntry::name)
    }

    /// Every exposed name minus aliases, in registration order. Includes hidden commands.
    #[must_use]
    pub fn list_canonical_names(&self) -> Vec<&str> {
        self.exposed
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| !self.alias_to_canonical.contains_key(*name))
            .collect()
    }

    /// Aliases of `canonical`, in registration order. Empty when it has none.
    #[must_use]
    pub fn aliases_of(&self, canonical: &str) -> &[String] {
        self.canonical_to_aliases
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Render the help screen through clap.
    #[must_use]
    pub fn render_help(&mut self) -> String {
        let annotated = AliasDisplay::apply(self);
        ClapHelp.render(&annotated)
    }

    /// Render the help screen through `formatter`.
    ///
    /// Aliased commands carry their annotated display name while the formatter
    /// runs; the canonical display names are restored afterwards, including
    /// when the formatter fails or panics.
    ///
    /// # Errors
    ///
    /// Whatever the formatter returns.
    pub fn render_help_with<F>(&mut self, formatter: &F) -> anyhow::Result<String>
    where
        F: HelpFormatter + ?Sized,
    {
        let annotated = AliasDisplay::apply(self);
        formatter.format_help(&annotated)
    }

    /// Self-drawn `Commands:` listing for hosts that render help without clap.
    #[must_use]
    pub fn render_commands_fallback(&self) -> String {
        render_fallback(self)
    }

    /// The help-side command: one subcommand per canonical command, under its display name.
    #[must_use]
    pub fn help_command(&self) -> clap::Command {
        let mut cmd = self.root_command();
        for entry in &self.entries {
            cmd = cmd.subcommand(
                with_about(
                    clap::Command::new(entry.display_name.clone()),
                    entry.about.as_deref(),
                )
                .hide(entry.hidden),
            );
        }
        cmd
    }

    /// The parse-side command: canonical commands plus aliases as hidden subcommands.
    fn parser(&self) -> clap::Command {
        let mut cmd = self.root_command();
        for (name, index) in &self.exposed {
            let Some(entry) = self.entries.get(*index) else {
                continue;
            };
            let is_alias = self.alias_to_canonical.contains_key(name);
            cmd = cmd.subcommand(entry.to_clap(name, entry.hidden || is_alias));
        }
        cmd
    }

    fn root_command(&self) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone())
            .disable_help_flag(true)
            .disable_help_subcommand(true)
            .disable_version_flag(true)
            .arg(
                Arg::new(HELP_ARG_ID)
                    .short('h')
                    .long("help")
                    .action(ArgAction::SetTrue)
                    .help("Print help"),
            );
        cmd = with_about(cmd, self.about.as_deref());
        if self.auto_version().is_some() {
            cmd = cmd.arg(VersionCallback::arg());
        }
        cmd.args(self.root_args.iter().cloned())
    }

    /// The version flag is built in only when the host did not take over the root.
    fn auto_version(&self) -> Option<&VersionCallback> {
        if self.callback.is_some() {
            None
        } else {
            self.version.as_ref()
        }
    }

    // --- Dispatch ---

    /// Parse `args` (program name first) and dispatch, writing help and version text to stdout.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::try_run_with`].
    pub fn try_run_from<I, T>(&mut self, args: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.try_run_with(args, &mut io::stdout())
    }

    /// Parse `args` (program name first) and dispatch, writing help and version text to `out`.
    ///
    /// # Errors
    ///
    /// `Usage` when clap rejects the arguments, `MissingCommand` when none
    /// was given, `Exit` when a handler asked to stop, `Handler` when it failed.
    pub fn try_run_with<I, T>(&mut self, args: I, out: &mut impl Write) -> Result<(), CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.parser().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(err) if err.kind() == ErrorKind::InvalidSubcommand => {
                let name = match err.get(ContextKind::InvalidSubcommand) {
                    Some(ContextValue::String(name)) => name.clone(),
                    _ => return Err(err.into()),
                };
                return Err(self.unknown_command(&name).into());
            }
            Err(err) => return Err(err.into()),
        };

        if matches.get_flag(HELP_ARG_ID) {
            let help = self.render_help();
            write!(out, "{help}")?;
            return Ok(());
        }

        if let Some(version) = self
            .auto_version()
            .filter(|_| matches.get_flag(VERSION_ARG_ID))
        {
            writeln!(out, "{}", version.line())?;
            return Ok(());
        }

        if let Some(callback) = &self.callback {
            callback(&matches).map_err(CliError::from_handler)?;
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Err(CliError::MissingCommand);
        };
        let Some(entry) = self.resolve(name) else {
            return Err(self.unknown_command(name).into());
        };
        debug!(invoked = name, command = entry.name(), "dispatching command");
        entry.invoke(sub_matches).map_err(CliError::from_handler)
    }

    /// clap's unrecognized-subcommand error, suggesting only visible canonical names.
    ///
    /// clap would otherwise offer aliases and hidden commands as tips.
    fn unknown_command(&self, name: &str) -> clap::Error {
        let mut cmd = self.help_command();
        let usage = cmd.render_usage();
        let mut err = clap::Error::new(ErrorKind::InvalidSubcommand).with_cmd(&cmd);
        err.insert(
            ContextKind::InvalidSubcommand,
            ContextValue::String(name.to_owned()),
        );
        let suggestions = self.similar_commands(name);
        if !suggestions.is_empty() {
            err.insert(
                ContextKind::SuggestedSubcommand,
                ContextValue::Strings(suggestions),
            );
        }
        err.insert(ContextKind::Usage, ContextValue::StyledStr(usage));
        err
    }

    /// Visible canonical names close to `name`, most similar first.
    fn similar_commands(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .entries
            .iter()
            .filter(|entry| !entry.hidden)
            .map(|entry| (strsim::jaro(name, &entry.name), entry.name.as_str()))
            .filter(|(score, _)| *score > SUGGEST_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, name)| name.to_owned()).collect()
    }

    /// Parse the process arguments, dispatch, and exit.
    ///
    /// Usage errors exit through clap (code 2); a missing command prints help
    /// to stderr and exits 2; handler failures print `Error: ...` to stderr
    /// and exit 1.
    pub fn run(&mut self) -> ! {
        let code = match self.try_run_from(std::env::args_os()) {
            Ok(()) => 0,
            Err(CliError::Usage(err)) => err.exit(),
            Err(CliError::MissingCommand) => {
                eprint!("{}", self.render_help());
                CliError::MissingCommand.exit_code()
            }
            Err(CliError::Exit { code }) => code,
            Err(err) => {
                eprintln!("Error: {err:#}");
                err.exit_code()
            }
        };
        std::process::exit(code);
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .field("aliases", &self.canonical_to_aliases)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

fn with_about(cmd: clap::Command, about: Option<&str>) -> clap::Command {
    match about {
        Some(about) => cmd.about(about.to_owned()),
        None => cmd,
    }
}

// --- Display-name guard ---

/// Annotates aliased commands' display names for the lifetime of the guard.
///
/// Restores the canonical display names on drop, so a failing or panicking
/// help formatter never leaves the registry rewritten.
struct AliasDisplay<'a> {
    registry: &'a mut CommandRegistry,
}

impl<'a> AliasDisplay<'a> {
    fn apply(registry: &'a mut CommandRegistry) -> Self {
        let CommandRegistry {
            entries,
            canonical_to_aliases,
            ..
        } = &mut *registry;
        for entry in entries.iter_mut() {
            if let Some(aliases) = canonical_to_aliases.get(&entry.name) {
                entry.display_name = annotate(&entry.name, aliases);
            }
        }
        Self { registry }
    }
}

impl Deref for AliasDisplay<'_> {
    type Target = CommandRegistry;

    fn deref(&self) -> &CommandRegistry {
        self.registry
    }
}

impl Drop for AliasDisplay<'_> {
    fn drop(&mut self) {
        for entry in &mut self.registry.entries {
            entry.display_name.clone_from(&entry.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: Log, line: &'static str) -> impl Fn(&ArgMatches) -> anyhow::Result<()> {
        move |_: &ArgMatches| {
            log.borrow_mut().push(line.to_owned());
            Ok(())
        }
    }

    /// deploy (d), status (st, s), info, and a hidden `secret (sx)`.
    fn sample(log: &Log) -> CommandRegistry {
        CommandRegistry::new("app")
            .about("Sample application.")
            .command(
                CommandDef::new("deploy", recorder(Rc::clone(log), "deployed"))
                    .about("Deploy the application.")
                    .aliases(["d"]),
            )
            .and_then(|r| {
                r.command(
                    CommandDef::new("status", recorder(Rc::clone(log), "status"))
                        .about("Show status.\nLonger description.")
                        .aliases(["st", "s"]),
                )
            })
            .and_then(|r| {
                r.command(
                    CommandDef::new("info", recorder(Rc::clone(log), "info")).about("Show info."),
                )
            })
            .and_then(|r| {
                r.command(
                    CommandDef::new("secret", recorder(Rc::clone(log), "secret"))
                        .about("Internal only.")
                        .aliases(["sx"])
                        .hidden(true),
                )
            })
            .unwrap()
    }

    fn run(registry: &mut CommandRegistry, args: &[&str]) -> (Result<(), CliError>, String) {
        let mut out = Vec::new();
        let result = registry.try_run_with(args.iter().copied(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn display_names(registry: &CommandRegistry) -> Vec<String> {
        registry
            .list_canonical_names()
            .into_iter()
            .filter_map(|name| registry.resolve(name))
            .map(|entry| entry.display_name().to_owned())
            .collect()
    }

    // --- resolve / list ---

    #[test]
    fn test_resolve_canonical_and_alias() {
        let log = Log::default();
        let registry = sample(&log);
        assert_eq!(registry.resolve("deploy").unwrap().name(), "deploy");
        assert_eq!(registry.resolve("d").unwrap().name(), "deploy");
        assert_eq!(registry.resolve("st").unwrap().name(), "status");
        assert_eq!(registry.resolve("s").unwrap().name(), "status");
        assert_eq!(registry.canonical_name("sx"), Some("secret"));
        assert!(registry.resolve("nonexistent").is_none());
    }

    #[test]
    fn test_list_canonical_names_in_registration_order() {
        let log = Log::default();
        let registry = sample(&log);
        assert_eq!(
            registry.list_canonical_names(),
            vec!["deploy", "status", "info", "secret"]
        );
        assert_eq!(registry.aliases_of("status"), ["st", "s"]);
        assert!(registry.aliases_of("info").is_empty());
    }

    #[test]
    fn test_empty_alias_list_registers_plain_command() {
        let mut registry = CommandRegistry::new("app")
            .command(CommandDef::new("solo", |_| Ok(())).aliases(Vec::<String>::new()))
            .unwrap();
        assert_eq!(registry.list_canonical_names(), vec!["solo"]);
        assert!(registry.aliases_of("solo").is_empty());

        let help = registry.render_help();
        assert!(help.contains("solo"));
        assert!(!help.contains("solo ("));
    }

    // --- registration errors ---

    #[test]
    fn test_alias_colliding_with_command_is_rejected() {
        let log = Log::default();
        let err = sample(&log)
            .command(CommandDef::new("destroy", |_| Ok(())).aliases(["deploy"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NameConflict { ref name, .. } if name == "deploy"));
    }

    #[test]
    fn test_command_colliding_with_alias_is_rejected() {
        let log = Log::default();
        let err = sample(&log)
            .command(CommandDef::new("d", |_| Ok(())))
            .unwrap_err();
        assert_eq!(err.to_string(), "'d' is already registered as an alias of 'deploy'");
    }

    #[test]
    fn test_duplicate_alias_within_definition_is_rejected() {
        let err = CommandRegistry::new("app")
            .command(CommandDef::new("go", |_| Ok(())).aliases(["g", "g"]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NameConflict { .. }));
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let err = CommandRegistry::new("app")
            .command(CommandDef::new("", |_| Ok(())))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));

        let err = CommandRegistry::new("app")
            .command(CommandDef::new("go", |_| Ok(())).aliases([""]))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }

    // --- dispatch ---

    #[test]
    fn test_alias_and_canonical_dispatch_to_same_handler() {
        let log = Log::default();
        let mut registry = sample(&log);
        run(&mut registry, &["app", "d"]).0.unwrap();
        run(&mut registry, &["app", "deploy"]).0.unwrap();
        run(&mut registry, &["app", "st"]).0.unwrap();
        assert_eq!(*log.borrow(), ["deployed", "deployed", "status"]);
    }

    #[test]
    fn test_hidden_command_still_dispatches() {
        let log = Log::default();
        let mut registry = sample(&log);
        run(&mut registry, &["app", "sx"]).0.unwrap();
        assert_eq!(*log.borrow(), ["secret"]);
    }

    #[test]
    fn test_unknown_command_is_usage_error() {
        let log = Log::default();
        let mut registry = sample(&log);
        let (result, _) = run(&mut registry, &["app", "nonexistent"]);
        let err = result.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert_ne!(err.exit_code(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unknown_command_suggests_visible_canonical_names() {
        let log = Log::default();
        let mut registry = sample(&log);
        let (result, _) = run(&mut registry, &["app", "statu"]);
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let message = err.to_string();
        assert!(message.contains("'statu'"));
        assert!(message.contains("'status'"));
        assert!(!message.contains("'st'"));
    }

    #[test]
    fn test_unknown_command_never_suggests_hidden_names() {
        let log = Log::default();
        let mut registry = sample(&log);
        let (result, _) = run(&mut registry, &["app", "sx2"]);
        let err = result.unwrap_err();
        assert!(matches!(&err, CliError::Usage(e) if e.kind() == ErrorKind::InvalidSubcommand));
        let message = err.to_string();
        assert!(message.contains("'sx2'"));
        assert!(!message.contains("'sx'"));
        assert!(!message.contains("'s'"));
        assert!(!message.contains("'secret'"));
    }

    #[test]
    fn test_missing_command() {
        let log = Log::default();
        let mut registry = sample(&log);
        let (result, _) = run(&mut registry, &["app"]);
        assert!(matches!(result, Err(CliError::MissingCommand)));
    }

    #[test]
    fn test_handler_arguments_are_parsed() {
        let seen: Rc<RefCell<Option<String>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let mut registry = CommandRegistry::new("app")
            .command(
                CommandDef::new("greet", move |m| {
                    *sink.borrow_mut() = m.get_one::<String>("who").cloned();
                    Ok(())
                })
                .aliases(["g"])
                .arg(Arg::new("who").required(true)),
            )
            .unwrap();
        run(&mut registry, &["app", "g", "world"]).0.unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("world"));
    }

    #[test]
    fn test_handler_failure_exits_one() {
        let mut registry = CommandRegistry::new("app")
            .command(CommandDef::new("fail", |_| anyhow::bail!("boom")))
            .unwrap();
        let err = run(&mut registry, &["app", "fail"]).0.unwrap_err();
        assert!(matches!(err, CliError::Handler(_)));
        assert_eq!(err.exit_code(), 1);
    }

    // --- help ---

    #[test]
    fn test_help_annotates_aliases_and_skips_hidden() {
        let log = Log::default();
        let mut registry = sample(&log);
        let help = registry.render_help();
        assert!(help.contains("deploy (d)"), "{help}");
        assert!(help.contains("status (st, s)"), "{help}");
        assert!(help.contains("info"), "{help}");
        assert!(!help.contains("info ("), "{help}");
        assert!(!help.contains("secret"), "{help}");
    }

    #[test]
    fn test_help_flag_prints_help() {
        let log = Log::default();
        let mut registry = sample(&log);
        let (result, out) = run(&mut registry, &["app", "--help"]);
        result.unwrap();
        assert!(out.contains("deploy (d)"), "{out}");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_display_names_restored_after_help() {
        let log = Log::default();
        let mut registry = sample(&log);
        let _ = registry.render_help();
        assert_eq!(display_names(&registry), ["deploy", "status", "info", "secret"]);
    }

    #[test]
    fn test_formatter_sees_annotated_names() {
        struct Names;
        impl HelpFormatter for Names {
            fn format_help(&self, registry: &CommandRegistry) -> anyhow::Result<String> {
                Ok(display_names(registry).join("|"))
            }
        }

        let log = Log::default();
        let mut registry = sample(&log);
        let rendered = registry.render_help_with(&Names).unwrap();
        assert_eq!(rendered, "deploy (d)|status (st, s)|info|secret (sx)");
        assert_eq!(display_names(&registry), ["deploy", "status", "info", "secret"]);
    }

    #[test]
    fn test_display_names_restored_after_failing_formatter() {
        struct Failing;
        impl HelpFormatter for Failing {
            fn format_help(&self, _: &CommandRegistry) -> anyhow::Result<String> {
                anyhow::bail!("formatter failed")
            }
        }

        let log = Log::default();
        let mut registry = sample(&log);
        assert!(registry.render_help_with(&Failing).is_err());
        assert_eq!(display_names(&registry), ["deploy", "status", "info", "secret"]);
    }

    #[test]
    fn test_display_names_restored_after_panicking_formatter() {
        struct Exploding;
        impl HelpFormatter for Exploding {
            fn format_help(&self, _: &CommandRegistry) -> anyhow::Result<String> {
                panic!("formatter exploded")
            }
        }

        let log = Log::default();
        let mut registry = sample(&log);
        let result = catch_unwind(AssertUnwindSafe(|| registry.render_help_with(&Exploding)));
        assert!(result.is_err());
        assert_eq!(display_names(&registry), ["deploy", "status", "info", "secret"]);
    }

    #[test]
    fn test_commands_fallback() {
        let log = Log::default();
        let registry = sample(&log);
        let listing = registry.render_commands_fallback();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "Commands:");
        assert_eq!(lines.len(), 4, "{listing}");
        assert!(lines[1].contains("deploy (d)") && lines[1].contains("Deploy the application."));
        assert!(lines[2].contains("status (st, s)") && lines[2].contains("Show status."));
        assert!(!listing.contains("Longer description."));
        assert!(lines[3].contains("info") && !lines[3].contains("info ("));
        assert!(!listing.contains("secret"));
    }

    #[test]
    fn test_commands_fallback_empty_registry() {
        assert_eq!(CommandRegistry::new("app").render_commands_fallback(), "");
    }

    // --- version ---

    #[test]
    fn test_version_flags() {
        let mut registry = CommandRegistry::new("app")
            .package("mm-clikit", "1.2.3")
            .command(CommandDef::new("noop", |_| Ok(())))
            .unwrap();
        for flag in ["--version", "-V"] {
            let (result, out) = run(&mut registry, &["app", flag]);
            result.unwrap();
            assert_eq!(out, "mm-clikit: 1.2.3\n");
        }
    }

    #[test]
    fn test_no_version_flag_without_package() {
        let mut registry = CommandRegistry::new("app")
            .command(CommandDef::new("noop", |_| Ok(())))
            .unwrap();
        let err = run(&mut registry, &["app", "--version"]).0.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_host_callback_suppresses_version_flag() {
        let mut registry = CommandRegistry::new("app")
            .package("mm-clikit", "1.2.3")
            .callback(|_| Ok(()))
            .command(CommandDef::new("noop", |_| Ok(())))
            .unwrap();
        let err = run(&mut registry, &["app", "--version"]).0.unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_host_callback_with_version_callback() {
        let version = super::super::create_version_callback("mm-clikit", "1.2.3");
        let mut registry = CommandRegistry::new("app")
            .arg(VersionCallback::arg())
            .callback(move |m| {
                version.call_with(m.get_flag(VERSION_ARG_ID), &mut io::sink())?;
                Ok(())
            })
            .command(CommandDef::new("noop", |_| Ok(())))
            .unwrap();
        let err = run(&mut registry, &["app", "-V"]).0.unwrap_err();
        assert!(matches!(err, CliError::Exit { code: 0 }));
        run(&mut registry, &["app", "noop"]).0.unwrap();
    }
}
