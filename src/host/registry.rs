//! Command registration and dispatch by name.

use super::Invocation;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A user-invoked command the host can dispatch to.
#[async_trait]
pub trait Command: Send + Sync {
    /// Name typed after the prefix, lowercase
    fn name(&self) -> &'static str;

    /// Detailed usage, as Telegram HTML
    fn usage(&self) -> String;

    /// One-line localized description
    fn description(&self) -> &'static str;

    /// Run the command. Implementations report their own failures to the user.
    async fn execute(&self, invocation: Invocation);
}

/// Static description of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: String,
    pub description: &'static str,
}

/// A command name and its raw arguments, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Option<String>,
}

/// Splits `<prefix><name>[ <args>]` into its parts.
///
/// The name is lowercased. Arguments are the raw remainder after the first whitespace,
/// trimmed, and `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use find_id::host::parse_command;
///
/// let parsed = parse_command(".", ".id  @durov ").expect("should parse");
/// assert_eq!(parsed.name, "id");
/// assert_eq!(parsed.args.as_deref(), Some("@durov"));
/// assert!(parse_command(".", "hello").is_none());
/// ```
#[must_use]
pub fn parse_command(prefix: &str, text: &str) -> Option<ParsedCommand> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let args = args.trim();
    Some(ParsedCommand {
        name: name.to_lowercase(),
        args: (!args.is_empty()).then(|| args.to_string()),
    })
}

/// Named commands reachable through one prefix.
pub struct CommandRegistry {
    prefix: String,
    commands: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers a command, replacing any previous command with the same name.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Descriptions of all registered commands, ordered by name.
    #[must_use]
    pub fn infos(&self) -> Vec<CommandInfo> {
        self.commands
            .values()
            .map(|command| CommandInfo {
                name: command.name(),
                usage: command.usage(),
                description: command.description(),
            })
            .collect()
    }

    /// Parses `text` and returns the matching command with its parsed form.
    #[must_use]
    pub fn lookup(&self, text: &str) -> Option<(Arc<dyn Command>, ParsedCommand)> {
        let parsed = parse_command(&self.prefix, text)?;
        let command = self.find(&parsed.name)?;
        Some((command, parsed))
    }
}
