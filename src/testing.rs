//! In-memory [`ChatClient`] for exercising commands without a Telegram connection.

use crate::client::{
    Account, AccountRef, ChatClient, ChatKind, ChatRef, ClientError, Lookup, MessageRef,
    ParseMode, ProfilePhoto, Resolved,
};
use crate::host::{Invocation, Reply};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A message the fake client was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatRef,
    pub reply_to: Option<i32>,
    pub text: String,
    pub mode: ParseMode,
}

/// An edit the fake client was asked to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub message: MessageRef,
    pub text: String,
    pub mode: ParseMode,
}

#[derive(Default)]
struct Journal {
    lookups: Vec<Lookup>,
    sent: Vec<SentMessage>,
    edits: Vec<EditedMessage>,
    next_message_id: i32,
}

/// Fake chat platform holding a fixed set of accounts.
///
/// Usernames match only in their `@name` form, case-insensitively, so a bare name
/// resolves on the second attempt. Looking up an unknown id fails the way Telegram
/// does with `USER_ID_INVALID`.
#[derive(Default)]
pub struct FakeChatClient {
    accounts: HashMap<i64, Account>,
    usernames: HashMap<String, i64>,
    reference_only: Vec<i64>,
    photos: HashMap<i64, Result<Vec<ProfilePhoto>, ClientError>>,
    journal: Mutex<Journal>,
}

impl FakeChatClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account; its username (if any) becomes resolvable.
    #[must_use]
    pub fn with_account(mut self, account: Account) -> Self {
        if let Some(username) = &account.username {
            self.usernames
                .insert(format!("@{}", username.to_lowercase()), account.id);
        }
        self.accounts.insert(account.id, account);
        self
    }

    /// Makes username lookups of `id` return a reference instead of the full account.
    #[must_use]
    pub fn reference_only(mut self, id: i64) -> Self {
        self.reference_only.push(id);
        self
    }

    #[must_use]
    pub fn with_photos(mut self, id: i64, photos: Vec<ProfilePhoto>) -> Self {
        self.photos.insert(id, Ok(photos));
        self
    }

    /// Makes fetching the photo history of `id` fail with `error`.
    #[must_use]
    pub fn with_photo_error(mut self, id: i64, error: ClientError) -> Self {
        self.photos.insert(id, Err(error));
        self
    }

    /// Lookups made so far, in order.
    #[must_use]
    pub fn lookups(&self) -> Vec<Lookup> {
        self.journal().lookups.clone()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.journal().sent.clone()
    }

    #[must_use]
    pub fn edits(&self) -> Vec<EditedMessage> {
        self.journal().edits.clone()
    }

    /// Text of the last edit, i.e. what the status message finally shows.
    #[must_use]
    pub fn last_edit_text(&self) -> Option<String> {
        self.journal().edits.last().map(|edit| edit.text.clone())
    }

    /// Forgets recorded calls, keeping the accounts.
    pub fn clear_journal(&self) {
        let mut journal = self.journal();
        journal.lookups.clear();
        journal.sent.clear();
        journal.edits.clear();
    }

    fn journal(&self) -> std::sync::MutexGuard<'_, Journal> {
        // A panicking test thread must not hide the calls it made.
        self.journal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn full_or_ref(&self, id: i64) -> Resolved {
        match self.accounts.get(&id) {
            Some(account) if self.reference_only.contains(&id) => {
                Resolved::Ref(account.reference())
            }
            Some(account) => Resolved::Full(account.clone()),
            None => Resolved::NotFound,
        }
    }
}

fn user_id_invalid() -> ClientError {
    ClientError::Rpc {
        code: 400,
        name: "USER_ID_INVALID".into(),
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn resolve(&self, lookup: &Lookup) -> Result<Resolved, ClientError> {
        self.journal().lookups.push(lookup.clone());
        match lookup {
            Lookup::Id(id) | Lookup::Reference(AccountRef { id, .. }) => self
                .accounts
                .get(id)
                .cloned()
                .map(Resolved::Full)
                .ok_or_else(user_id_invalid),
            Lookup::Username(name) => Ok(self
                .usernames
                .get(&name.to_lowercase())
                .map_or(Resolved::NotFound, |id| self.full_or_ref(*id))),
        }
    }

    async fn get_profile_photos(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<ProfilePhoto>, ClientError> {
        match self.photos.get(&account.id) {
            Some(Ok(photos)) => Ok(photos.iter().take(limit).copied().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn send(
        &self,
        chat: &ChatRef,
        reply_to: Option<i32>,
        text: &str,
        mode: ParseMode,
    ) -> Result<MessageRef, ClientError> {
        let mut journal = self.journal();
        journal.next_message_id += 1;
        let id = 1000 + journal.next_message_id;
        journal.sent.push(SentMessage {
            chat: *chat,
            reply_to,
            text: text.to_string(),
            mode,
        });
        Ok(MessageRef { chat: *chat, id })
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: &str,
        mode: ParseMode,
    ) -> Result<(), ClientError> {
        self.journal().edits.push(EditedMessage {
            message: *message,
            text: text.to_string(),
            mode,
        });
        Ok(())
    }
}

/// Builder for command invocations in a private chat.
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    invocation: Invocation,
}

impl InvocationBuilder {
    /// An outgoing command message sent by `invoker`.
    #[must_use]
    pub fn from_account(invoker: &Account) -> Self {
        Self {
            invocation: Invocation {
                message: MessageRef {
                    chat: ChatRef {
                        kind: ChatKind::User,
                        id: invoker.id,
                        access_hash: invoker.access_hash,
                    },
                    id: 1,
                },
                outgoing: true,
                args: None,
                sender: Some(Resolved::Full(invoker.clone())),
                reply: None,
            },
        }
    }

    #[must_use]
    pub fn args(mut self, args: &str) -> Self {
        let args = args.trim();
        self.invocation.args = (!args.is_empty()).then(|| args.to_string());
        self
    }

    /// Makes the command a reply to a message written by `author`.
    #[must_use]
    pub fn replying_to(mut self, author: &Account) -> Self {
        self.invocation.reply = Some(Reply {
            message_id: 2,
            sender: Some(Resolved::Ref(author.reference())),
        });
        self
    }

    #[must_use]
    pub fn incoming(mut self) -> Self {
        self.invocation.outgoing = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Invocation {
        self.invocation
    }
}
