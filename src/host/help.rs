//! Built-in `help` command.

use super::{answer, Command, CommandInfo, Invocation};
use crate::client::ChatClient;
use crate::i18n::{Locale, Strings};
use crate::utils::{escape_html, wrap_blockquote};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// Lists registered commands, or shows the usage of one (`.help id`).
pub struct HelpCommand {
    client: Arc<dyn ChatClient>,
    strings: &'static Strings,
    prefix: String,
    entries: Vec<CommandInfo>,
}

impl HelpCommand {
    /// `entries` describes the other registered commands; the help entry itself is added here.
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatClient>,
        locale: Locale,
        prefix: impl Into<String>,
        mut entries: Vec<CommandInfo>,
    ) -> Self {
        let strings = locale.strings();
        let prefix = prefix.into();
        entries.retain(|entry| entry.name != "help");
        entries.push(CommandInfo {
            name: "help",
            usage: wrap_blockquote(&format!(
                "<code>{}help [command]</code> - {}",
                escape_html(&prefix),
                strings.help_description
            )),
            description: strings.help_description,
        });
        entries.sort_by_key(|entry| entry.name);
        Self {
            client,
            strings,
            prefix,
            entries,
        }
    }

    /// Text shown for the given arguments.
    #[must_use]
    pub fn render(&self, args: Option<&str>) -> String {
        let Some(name) = args else {
            let prefix = escape_html(&self.prefix);
            let lines: Vec<String> = std::iter::once(format!("<b>{}</b>", self.strings.help_title))
                .chain(self.entries.iter().map(|entry| {
                    format!("<code>{prefix}{}</code> - {}", entry.name, entry.description)
                }))
                .collect();
            return wrap_blockquote(&lines.join("\n"));
        };

        let name = name.trim().trim_start_matches(self.prefix.as_str()).to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map_or_else(
                || wrap_blockquote(self.strings.help_unknown_command),
                |entry| entry.usage.clone(),
            )
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn usage(&self) -> String {
        self.render(Some("help"))
    }

    fn description(&self) -> &'static str {
        self.strings.help_description
    }

    async fn execute(&self, invocation: Invocation) {
        let text = self.render(invocation.args.as_deref());
        if let Err(e) = answer(self.client.as_ref(), &invocation, &text).await {
            error!(error = %e, "Failed to show help");
        }
    }
}
