//! [`ChatClient`] on top of a grammers MTProto user session.

// lazy_regex! validates the pattern at compile time and keeps it in a static
#![allow(clippy::non_std_lazy_statics)]

use crate::client::{
    Account, AccountRef, ChatClient, ChatKind, ChatRef, ClientError, Lookup, MessageRef,
    ParseMode, ProfilePhoto, Resolved,
};
use crate::host::{Invocation, Reply};
use async_trait::async_trait;
use chrono::DateTime;
use grammers_client::parsers::parse_html_message;
use grammers_client::types::{Chat, Message};
use grammers_client::{Client, InputMessage, InvocationError};
use grammers_session::{PackedChat, PackedType};
use grammers_tl_types as tl;
use lazy_regex::lazy_regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Telegram returns at most this many photos per `photos.getUserPhotos` call.
const PHOTOS_PER_REQUEST: usize = 100;

/// How long a username that resolved to nothing is answered from memory.
const USERNAME_MISS_TTL: Duration = Duration::from_secs(30);

static RE_CUSTOM_EMOJI: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r#"<tg-emoji emoji-id="(\d+)">([^<]*)</tg-emoji>"#);

impl From<InvocationError> for ClientError {
    fn from(error: InvocationError) -> Self {
        match error {
            InvocationError::Rpc(rpc) => Self::Rpc {
                code: rpc.code,
                name: rpc.name,
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Usernames that recently resolved to nothing.
///
/// `@name` and `name` are the same `contacts.resolveUsername` request, and that method
/// is quick to earn long flood waits, so a repeated miss is not sent again.
#[derive(Debug, Default)]
pub struct UsernameMisses {
    misses: Mutex<HashMap<String, Instant>>,
}

impl UsernameMisses {
    /// Canonical form of a username: no leading `@`, lowercase.
    #[must_use]
    pub fn normalize(username: &str) -> String {
        username.trim_start_matches('@').to_lowercase()
    }

    pub fn record(&self, username: &str, now: Instant) {
        let mut misses = self.misses.lock().unwrap_or_else(PoisonError::into_inner);
        misses.retain(|_, at| now.saturating_duration_since(*at) < USERNAME_MISS_TTL);
        misses.insert(Self::normalize(username), now);
    }

    #[must_use]
    pub fn is_recent(&self, username: &str, now: Instant) -> bool {
        let misses = self.misses.lock().unwrap_or_else(PoisonError::into_inner);
        misses
            .get(&Self::normalize(username))
            .is_some_and(|at| now.saturating_duration_since(*at) < USERNAME_MISS_TTL)
    }
}

/// Grammers-backed chat client. Cheap to clone.
#[derive(Clone)]
pub struct GrammersClient {
    client: Client,
    username_misses: Arc<UsernameMisses>,
}

impl GrammersClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            username_misses: Arc::new(UsernameMisses::default()),
        }
    }

    async fn get_user(&self, user: tl::enums::InputUser) -> Result<Resolved, ClientError> {
        let users = self
            .client
            .invoke(&tl::functions::users::GetUsers { id: vec![user] })
            .await?;
        Ok(users
            .into_iter()
            .find_map(|user| match user {
                tl::enums::User::User(user) => Some(user),
                tl::enums::User::Empty(_) => None,
            })
            .map_or(Resolved::NotFound, |user| {
                Resolved::Full(account_from_user(user))
            }))
    }

    async fn resolve_username(&self, username: &str) -> Result<Resolved, ClientError> {
        let username = username.trim_start_matches('@');
        if username.is_empty() {
            return Ok(Resolved::NotFound);
        }
        if self.username_misses.is_recent(username, Instant::now()) {
            debug!(username, "Username missed recently, not asking again");
            return Ok(Resolved::NotFound);
        }
        match self.client.resolve_username(username).await {
            Ok(Some(chat)) => Ok(resolved_from_chat(&chat)),
            Ok(None) => {
                self.username_misses.record(username, Instant::now());
                Ok(Resolved::NotFound)
            }
            Err(e) => {
                let error = ClientError::from(e);
                // USERNAME_INVALID and friends will not change on a retry
                if matches!(error, ClientError::Rpc { code: 400, .. }) {
                    self.username_misses.record(username, Instant::now());
                }
                Err(error)
            }
        }
    }
}

fn input_user(reference: AccountRef) -> tl::enums::InputUser {
    tl::enums::InputUser::User(tl::types::InputUser {
        user_id: reference.id,
        access_hash: reference.access_hash.unwrap_or(0),
    })
}

fn account_from_user(user: tl::types::User) -> Account {
    Account {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        username: user.username,
        access_hash: user.access_hash,
    }
}

fn profile_photo(photo: tl::enums::Photo) -> ProfilePhoto {
    ProfilePhoto {
        uploaded_at: match photo {
            tl::enums::Photo::Photo(photo) => DateTime::from_timestamp(i64::from(photo.date), 0),
            tl::enums::Photo::Empty(_) => None,
        },
    }
}

const fn chat_kind(ty: PackedType) -> ChatKind {
    match ty {
        PackedType::User => ChatKind::User,
        PackedType::Bot => ChatKind::Bot,
        PackedType::Chat => ChatKind::Group,
        PackedType::Megagroup => ChatKind::Megagroup,
        // Broadcast channels and gigagroups are both addressed as channels
        _ => ChatKind::Channel,
    }
}

const fn packed_type(kind: ChatKind) -> PackedType {
    match kind {
        ChatKind::User => PackedType::User,
        ChatKind::Bot => PackedType::Bot,
        ChatKind::Group => PackedType::Chat,
        ChatKind::Megagroup => PackedType::Megagroup,
        ChatKind::Channel => PackedType::Broadcast,
    }
}

fn chat_ref(chat: &Chat) -> ChatRef {
    let packed = chat.pack();
    ChatRef {
        kind: chat_kind(packed.ty),
        id: packed.id,
        access_hash: packed.access_hash,
    }
}

const fn packed_chat(chat: &ChatRef) -> PackedChat {
    PackedChat {
        ty: packed_type(chat.kind),
        id: chat.id,
        access_hash: chat.access_hash,
    }
}

/// Users come back as references to be expanded; groups and channels have no personal
/// name and are reported as they are.
fn resolved_from_chat(chat: &Chat) -> Resolved {
    let packed = chat.pack();
    match packed.ty {
        PackedType::User | PackedType::Bot => Resolved::Ref(AccountRef {
            id: packed.id,
            access_hash: packed.access_hash,
        }),
        _ => Resolved::Full(Account {
            username: chat.username().map(str::to_string),
            access_hash: packed.access_hash,
            ..Account::bare(packed.id)
        }),
    }
}

fn telegram_len(text: &str) -> i32 {
    i32::try_from(text.encode_utf16().count()).unwrap_or(i32::MAX)
}

/// Parses Telegram HTML, turning `<tg-emoji emoji-id="…">` spans into custom-emoji entities.
///
/// The grammers HTML parser keeps only the fallback text of such spans, so their offsets are
/// taken from the plain text that precedes each one.
#[must_use]
pub fn parse_html_with_custom_emoji(html: &str) -> (String, Vec<tl::enums::MessageEntity>) {
    let mut rewritten = String::with_capacity(html.len());
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in RE_CUSTOM_EMOJI.captures_iter(html) {
        let (Some(whole), Some(id), Some(fallback)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let Ok(document_id) = id.as_str().parse::<i64>() else {
            continue;
        };
        rewritten.push_str(&html[last..whole.start()]);
        spans.push((rewritten.len(), document_id, fallback.as_str()));
        rewritten.push_str(fallback.as_str());
        last = whole.end();
    }
    rewritten.push_str(&html[last..]);

    let (text, mut entities) = parse_html_message(&rewritten);
    entities.extend(spans.into_iter().map(|(start, document_id, fallback)| {
        let (before, _) = parse_html_message(&rewritten[..start]);
        let (shown, _) = parse_html_message(fallback);
        tl::types::MessageEntityCustomEmoji {
            offset: telegram_len(&before),
            length: telegram_len(&shown),
            document_id,
        }
        .into()
    }));
    (text, entities)
}

fn input_message(text: &str, mode: ParseMode) -> InputMessage {
    match mode {
        ParseMode::Html => {
            let (text, entities) = parse_html_with_custom_emoji(text);
            InputMessage::text(text).fmt_entities(entities)
        }
        ParseMode::Plain => InputMessage::text(text),
    }
}

#[async_trait]
impl ChatClient for GrammersClient {
    async fn resolve(&self, lookup: &Lookup) -> Result<Resolved, ClientError> {
        match lookup {
            Lookup::Id(id) => {
                self.get_user(input_user(AccountRef {
                    id: *id,
                    access_hash: None,
                }))
                .await
            }
            Lookup::Username(username) => self.resolve_username(username).await,
            Lookup::Reference(reference) => self.get_user(input_user(*reference)).await,
        }
    }

    async fn get_profile_photos(
        &self,
        account: &Account,
        limit: usize,
    ) -> Result<Vec<ProfilePhoto>, ClientError> {
        let user = input_user(account.reference());
        let mut photos = Vec::new();

        while photos.len() < limit {
            let wanted = (limit - photos.len()).min(PHOTOS_PER_REQUEST);
            let request = tl::functions::photos::GetUserPhotos {
                user_id: user.clone(),
                offset: i32::try_from(photos.len()).unwrap_or(i32::MAX),
                max_id: 0,
                limit: i32::try_from(wanted).unwrap_or(i32::MAX),
            };
            let (batch, total) = match self.client.invoke(&request).await? {
                tl::enums::photos::Photos::Photos(p) => (p.photos, None),
                tl::enums::photos::Photos::Slice(p) => {
                    (p.photos, usize::try_from(p.count).ok())
                }
            };

            let received = batch.len();
            photos.extend(batch.into_iter().map(profile_photo));
            // A full list, a short page or reaching the server total means no more pages.
            let exhausted = total.map_or(true, |total| photos.len() >= total);
            if received == 0 || received < wanted || exhausted {
                break;
            }
        }

        photos.truncate(limit);
        debug!(
            account_id = account.id,
            count = photos.len(),
            "Fetched profile photos"
        );
        Ok(photos)
    }

    async fn send(
        &self,
        chat: &ChatRef,
        reply_to: Option<i32>,
        text: &str,
        mode: ParseMode,
    ) -> Result<MessageRef, ClientError> {
        let message = input_message(text, mode).reply_to(reply_to);
        let sent = self.client.send_message(packed_chat(chat), message).await?;
        Ok(MessageRef {
            chat: *chat,
            id: sent.id(),
        })
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: &str,
        mode: ParseMode,
    ) -> Result<(), ClientError> {
        self.client
            .edit_message(packed_chat(&message.chat), message.id, input_message(text, mode))
            .await?;
        Ok(())
    }
}

/// Builds the invocation context of a command message.
///
/// Failing to fetch the replied-to message is treated as "no reply".
pub async fn invocation_from_message(message: &Message, args: Option<String>) -> Invocation {
    let reply = if message.reply_to_message_id().is_some() {
        match message.get_reply().await {
            Ok(Some(reply)) => Some(Reply {
                message_id: reply.id(),
                sender: reply.sender().as_ref().map(resolved_from_chat),
            }),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, message_id = message.id(), "Failed to fetch replied message");
                None
            }
        }
    } else {
        None
    };

    Invocation {
        message: MessageRef {
            chat: chat_ref(&message.chat()),
            id: message.id(),
        },
        outgoing: message.outgoing(),
        args,
        sender: message.sender().as_ref().map(resolved_from_chat),
        reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use crate::lookup::presenter::{ICON_DATE, ICON_NOT_FOUND, ICON_RESULT};
    use crate::lookup::{FieldValue, Presenter, Profile};

    fn custom_emoji(entities: &[tl::enums::MessageEntity]) -> Vec<tl::types::MessageEntityCustomEmoji> {
        entities
            .iter()
            .filter_map(|entity| match entity {
                tl::enums::MessageEntity::CustomEmoji(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    fn profile() -> Profile {
        Profile {
            name: FieldValue::Known("A <b>".into()),
            username: FieldValue::Unknown,
            id: 42,
            created: FieldValue::Known("05 March 2021".into()),
        }
    }

    #[test]
    fn test_not_found_carries_custom_emoji_entity() {
        let html = Presenter::new(Locale::En, true).not_found();
        let (text, entities) = parse_html_with_custom_emoji(&html);

        assert_eq!(text, "💠 Success\n⚠\u{fe0f} User not found.");
        let icons = custom_emoji(&entities);
        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].offset, 0);
        assert_eq!(icons[0].length, 2);
        assert_eq!(
            icons[0].document_id,
            i64::try_from(ICON_NOT_FOUND.document_id).expect("id fits")
        );
        assert!(entities
            .iter()
            .any(|entity| matches!(entity, tl::enums::MessageEntity::Blockquote(_))));
    }

    #[test]
    fn test_result_icons_point_at_their_fallbacks() {
        let html = Presenter::new(Locale::En, true).result(&profile());
        let (text, entities) = parse_html_with_custom_emoji(&html);
        let units: Vec<u16> = text.encode_utf16().collect();

        let icons = custom_emoji(&entities);
        assert_eq!(icons.len(), 5);
        let first = icons.first().expect("banner icon");
        assert_eq!(
            first.document_id,
            i64::try_from(ICON_RESULT.document_id).expect("id fits")
        );
        let date = icons.last().expect("date icon");
        assert_eq!(date.document_id, i64::try_from(ICON_DATE.document_id).expect("id fits"));
        for icon in &icons {
            let start = usize::try_from(icon.offset).expect("offset");
            let end = start + usize::try_from(icon.length).expect("length");
            let shown = String::from_utf16(&units[start..end]).expect("valid utf-16");
            assert!(["🎁", "💎", "💠", "🆔", "🏆"].contains(&shown.as_str()), "{shown}");
        }
        assert!(text.contains("A <b>"));
    }

    #[test]
    fn test_plain_icons_have_no_custom_emoji() {
        let html = Presenter::new(Locale::En, false).result(&profile());
        let (text, entities) = parse_html_with_custom_emoji(&html);
        assert!(custom_emoji(&entities).is_empty());
        assert!(text.starts_with("🎁 Success"));
    }

    #[test]
    fn test_username_miss_is_remembered_for_both_forms() {
        let misses = UsernameMisses::default();
        let now = Instant::now();
        assert!(!misses.is_recent("doesnotexist_xyz", now));

        misses.record("doesnotexist_xyz", now);
        assert!(misses.is_recent("@DoesNotExist_xyz", now));
        assert!(!misses.is_recent("someone_else", now));
        assert!(!misses.is_recent("doesnotexist_xyz", now + USERNAME_MISS_TTL));
    }

    #[test]
    fn test_chat_kind_round_trip_keeps_addressing() {
        for kind in [
            ChatKind::User,
            ChatKind::Bot,
            ChatKind::Group,
            ChatKind::Megagroup,
            ChatKind::Channel,
        ] {
            assert_eq!(chat_kind(packed_type(kind)), kind);
        }
    }

    #[test]
    fn test_empty_photo_has_no_date() {
        let photo = profile_photo(tl::enums::Photo::Empty(tl::types::PhotoEmpty { id: 1 }));
        assert_eq!(photo.uploaded_at, None);
    }
}
