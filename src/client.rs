//! Chat-platform collaborator boundary.
//!
//! Everything the `.id` command needs from the Telegram client goes through the
//! [`ChatClient`] trait, so the resolver and extractor can run against a fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors reported by a [`ChatClient`] implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server rejected the request (e.g. `USERNAME_NOT_OCCUPIED`, `FLOOD_WAIT_X`)
    #[error("RPC error {code}: {name}")]
    Rpc {
        /// Numeric error code returned by Telegram
        code: i32,
        /// Upper-case error name returned by Telegram
        name: String,
    },
    /// The request never produced an answer (network, session or decoding failure)
    #[error("Transport error: {0}")]
    Transport(String),
    /// The peer exists but is not something this client can work with
    #[error("Unsupported peer: {0}")]
    UnsupportedPeer(String),
}

/// A fully loaded chat-platform account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Access hash needed to address the account in follow-up requests.
    pub access_hash: Option<i64>,
}

impl Account {
    /// An account known only by its id, with no name or username.
    #[must_use]
    pub const fn bare(id: i64) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            username: None,
            access_hash: None,
        }
    }

    /// Lightweight reference to this account.
    #[must_use]
    pub const fn reference(&self) -> AccountRef {
        AccountRef {
            id: self.id,
            access_hash: self.access_hash,
        }
    }
}

/// A lightweight handle to an account whose attributes have not been loaded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountRef {
    pub id: i64,
    pub access_hash: Option<i64>,
}

/// Outcome of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Full(Account),
    Ref(AccountRef),
    NotFound,
}

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Numeric account identifier
    Id(i64),
    /// Username or `@mention`, passed through as typed
    Username(String),
    /// Expand a reference into a full account
    Reference(AccountRef),
}

/// A single entry of an account's profile photo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePhoto {
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// How the server should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
    Plain,
}

/// Kind of chat a message lives in, needed to address it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    User,
    Bot,
    Group,
    Megagroup,
    Channel,
}

/// Addressable chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatRef {
    pub kind: ChatKind,
    pub id: i64,
    pub access_hash: Option<i64>,
}

/// Addressable message inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: ChatRef,
    pub id: i32,
}

/// Operations the `.id` command consumes from the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Resolve an identifier, username or reference.
    ///
    /// A lookup that simply finds nothing returns `Ok(Resolved::NotFound)`.
    async fn resolve(&self, lookup: &Lookup) -> Result<Resolved, ClientError>;

    /// Fetch up to `limit` profile photos of `account`, newest first.
    async fn get_profile_photos(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<ProfilePhoto>, ClientError>;

    /// Send a new message into `chat`, optionally replying to `reply_to`.
    async fn send(
        &self,
        chat: &ChatRef,
        reply_to: Option<i32>,
        text: &str,
        mode: ParseMode,
    ) -> Result<MessageRef, ClientError>;

    /// Replace the text of an existing message.
    async fn edit(&self, message: &MessageRef, text: &str, mode: ParseMode)
        -> Result<(), ClientError>;
}
