//! Minimal userbot host: command registry, built-in help and the update loop.

pub mod help;
pub mod registry;
pub mod runner;

use crate::client::{ChatClient, ClientError, MessageRef, ParseMode, Resolved};

pub use registry::{parse_command, Command, CommandInfo, CommandRegistry, ParsedCommand};

/// Everything a command knows about the message that triggered it.
///
/// Built once per incoming command and dropped when the command finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The command message itself
    pub message: MessageRef,
    /// Whether the command message was sent by the logged-in account
    pub outgoing: bool,
    /// Raw argument text after the command name, trimmed; `None` when empty
    pub args: Option<String>,
    /// Author of the command message, if it could be determined
    pub sender: Option<Resolved>,
    /// The message the command replies to, if any
    pub reply: Option<Reply>,
}

/// The replied-to message of an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub message_id: i32,
    pub sender: Option<Resolved>,
}

/// Shows `text` in response to `invocation` and returns the message holding it.
///
/// The logged-in account's own command message is edited in place; anyone else's
/// command gets a reply.
///
/// # Errors
///
/// Returns the client error if the message could not be edited or sent.
pub async fn answer(
    client: &dyn ChatClient,
    invocation: &Invocation,
    text: &str,
) -> Result<MessageRef, ClientError> {
    if invocation.outgoing {
        client
            .edit(&invocation.message, text, ParseMode::Html)
            .await?;
        Ok(invocation.message)
    } else {
        client
            .send(
                &invocation.message.chat,
                Some(invocation.message.id),
                text,
                ParseMode::Html,
            )
            .await
    }
}
