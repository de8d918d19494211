/// Help rendering: the delegated (clap) formatter and the self-drawn fallback.
use comfy_table::{Table, presets::NOTHING};

use super::registry::CommandRegistry;

/// A help formatter invoked by [`CommandRegistry::render_help_with`].
///
/// While it runs, every aliased command's display name reads
/// `"<name> (<alias>, ...)"`.
pub trait HelpFormatter {
    /// Render help for `registry`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the registry restores display names either way.
    fn format_help(&self, registry: &CommandRegistry) -> anyhow::Result<String>;
}

/// The default formatter: clap's own help renderer over the registry's display names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClapHelp;

impl ClapHelp {
    /// Render help through clap.
    #[must_use]
    pub fn render(self, registry: &CommandRegistry) -> String {
        registry.help_command().render_help().to_string()
    }
}

impl HelpFormatter for ClapHelp {
    fn format_help(&self, registry: &CommandRegistry) -> anyhow::Result<String> {
        Ok(self.render(registry))
    }
}

/// `name (a, b)` for aliased commands, `name` otherwise.
#[must_use]
pub fn annotate(name: &str, aliases: &[String]) -> String {
    if aliases.is_empty() {
        name.to_owned()
    } else {
        format!("{name} ({})", aliases.join(", "))
    }
}

/// Two-column `name  description` listing under a `Commands:` heading.
///
/// Hidden commands are skipped; aliased commands are annotated. Returns an
/// empty string when there is nothing to list.
#[must_use]
pub fn render_fallback(registry: &CommandRegistry) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);

    let mut rows = 0;
    for name in registry.list_canonical_names() {
        let Some(entry) = registry.resolve(name) else {
            continue;
        };
        if entry.is_hidden() {
            continue;
        }
        table.add_row([annotate(name, registry.aliases_of(name)), entry.short_help().to_owned()]);
        rows += 1;
    }

    if rows == 0 {
        return String::new();
    }

    let mut out = String::from("Commands:\n");
    for line in table.lines() {
        out.push_str("  ");
        out.push_str(line.trim());
        out.push('\n');
    }
    out
}
