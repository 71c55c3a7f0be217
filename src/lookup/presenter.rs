//! Telegram HTML rendering of the `.id` outcomes.

use super::extractor::{FieldValue, Profile};
use crate::i18n::{Locale, Strings};
use crate::utils::{escape_html, truncate_str, wrap_blockquote, ERROR_TEXT_LIMIT};

/// A decorative icon: a custom emoji with a plain emoji fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icon {
    pub fallback: &'static str,
    pub document_id: u64,
}

impl Icon {
    const fn new(fallback: &'static str, document_id: u64) -> Self {
        Self {
            fallback,
            document_id,
        }
    }
}

pub const ICON_WORKING: Icon = Icon::new("💎", 5_199_733_815_106_354_300);
pub const ICON_NOT_FOUND: Icon = Icon::new("💠", 5_199_485_574_586_581_548);
pub const ICON_ERROR: Icon = Icon::new("🆔", 5_197_688_070_643_661_681);
pub const ICON_RESULT: Icon = Icon::new("🎁", 5_197_228_921_459_850_148);
pub const ICON_USAGE: Icon = Icon::new("🏆", 5_433_875_443_306_481_415);
pub const ICON_NAME: Icon = Icon::new("💎", 5_199_742_486_645_325_689);
pub const ICON_USERNAME: Icon = Icon::new("💠", 5_197_180_478_523_719_604);
pub const ICON_ID: Icon = Icon::new("🆔", 5_197_195_523_794_157_505);
pub const ICON_DATE: Icon = Icon::new("🏆", 5_199_485_574_586_581_548);

/// Renders every message the `.id` command can show.
///
/// All output is wrapped in a block-quote and starts with a per-outcome banner.
#[derive(Debug, Clone, Copy)]
pub struct Presenter {
    strings: &'static Strings,
    custom_emoji: bool,
}

impl Presenter {
    #[must_use]
    pub const fn new(locale: Locale, custom_emoji: bool) -> Self {
        Self {
            strings: locale.strings(),
            custom_emoji,
        }
    }

    #[must_use]
    pub const fn strings(&self) -> &'static Strings {
        self.strings
    }

    /// An icon as a custom-emoji span, or its plain fallback.
    #[must_use]
    pub fn icon(&self, icon: Icon) -> String {
        if self.custom_emoji {
            format!(
                "<tg-emoji emoji-id=\"{}\">{}</tg-emoji>",
                icon.document_id, icon.fallback
            )
        } else {
            icon.fallback.to_string()
        }
    }

    fn banner(&self, icon: Icon) -> String {
        format!("{}<b> {}</b>", self.icon(icon), self.strings.banner_title)
    }

    fn value(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Known(text) => format!("<code>{}</code>", escape_html(text)),
            FieldValue::Unknown => format!("<b>{}</b>", self.strings.unknown),
        }
    }

    /// Placeholder shown while the lookup runs.
    #[must_use]
    pub fn getting_info(&self) -> String {
        wrap_blockquote(&format!(
            "{}\n{}",
            self.banner(ICON_WORKING),
            self.strings.getting_info
        ))
    }

    #[must_use]
    pub fn not_found(&self) -> String {
        wrap_blockquote(&format!(
            "{}\n{}",
            self.banner(ICON_NOT_FOUND),
            self.strings.no_user
        ))
    }

    /// Error notice; `description` is escaped and truncated.
    #[must_use]
    pub fn error(&self, description: &str) -> String {
        let description = escape_html(&truncate_str(description, ERROR_TEXT_LIMIT));
        wrap_blockquote(&format!(
            "{}\n{} <code>{description}</code>",
            self.banner(ICON_ERROR),
            self.strings.error
        ))
    }

    #[must_use]
    pub fn result(&self, profile: &Profile) -> String {
        let s = self.strings;
        let lines = [
            self.banner(ICON_RESULT),
            format!(
                "{} <b>{}</b> {}",
                self.icon(ICON_NAME),
                s.name,
                self.value(&profile.name)
            ),
            format!(
                "{} <b>{}</b> {}",
                self.icon(ICON_USERNAME),
                s.username,
                self.value(&profile.username)
            ),
            format!(
                "{} <b>{}</b> <code>{}</code>",
                self.icon(ICON_ID),
                s.id,
                profile.id
            ),
            format!(
                "{} <b>{}</b> {}",
                self.icon(ICON_DATE),
                s.created,
                self.value(&profile.created)
            ),
        ];
        wrap_blockquote(&lines.join("\n"))
    }

    /// Usage text of the `.id` command for the given prefix.
    #[must_use]
    pub fn usage(&self, prefix: &str) -> String {
        let s = self.strings;
        let prefix = escape_html(prefix);
        let lines = [
            self.banner(ICON_USAGE),
            format!("<b>{}</b>", s.usage_title),
            format!("<code>{prefix}id</code> - {}", s.usage_self),
            format!("<code>{prefix}id @username</code> - {}", s.usage_username),
            format!("<code>{prefix}id &lt;user_id&gt;</code> - {}", s.usage_id),
            format!("<code>{prefix}id</code> {}", s.usage_reply),
        ];
        wrap_blockquote(&lines.join("\n"))
    }
}
