//! Display attributes and the approximate creation date of an account.

use crate::client::{Account, ChatClient, ProfilePhoto};
use crate::i18n::Locale;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of profile photos fetched to estimate the creation date.
pub const DEFAULT_PHOTO_LIMIT: usize = 200;

/// A display value that is either known or shown as the "unknown" placeholder.
///
/// Known values hold raw, unescaped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Known(String),
    Unknown,
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

/// The four values reported for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: FieldValue,
    pub username: FieldValue,
    pub id: i64,
    pub created: FieldValue,
}

/// First and last name joined by a single space, `None` if both are missing or blank.
#[must_use]
pub fn display_name(account: &Account) -> Option<String> {
    let name = [account.first_name.as_deref(), account.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// `@username`, `None` if the account has no username.
#[must_use]
pub fn display_username(account: &Account) -> Option<String> {
    account
        .username
        .as_deref()
        .filter(|username| !username.is_empty())
        .map(|username| format!("@{username}"))
}

/// Upload time of the oldest photo in a history.
///
/// The history is expected newest first, so this is normally the last entry. Photos without
/// a timestamp are ignored, and the minimum is taken so a history that is not strictly
/// ordered still yields its earliest upload.
#[must_use]
pub fn earliest_upload(photos: &[ProfilePhoto]) -> Option<DateTime<Utc>> {
    photos.iter().filter_map(|photo| photo.uploaded_at).min()
}

/// Formats a date as "day month year", e.g. `05 March 2021`.
#[must_use]
pub fn format_date(date: DateTime<Utc>, locale: Locale) -> Option<String> {
    let month = locale.month_name(date.month())?;
    Some(format!("{:02} {month} {}", date.day(), date.year()))
}

/// Reads an account's display values through the chat client.
pub struct Extractor {
    client: Arc<dyn ChatClient>,
    photo_limit: usize,
    locale: Locale,
}

impl Extractor {
    #[must_use]
    pub fn new(client: Arc<dyn ChatClient>, photo_limit: usize, locale: Locale) -> Self {
        Self {
            client,
            photo_limit,
            locale,
        }
    }

    /// Builds the profile of `account`. Never fails: anything missing becomes unknown.
    pub async fn extract(&self, account: &Account) -> Profile {
        Profile {
            name: display_name(account).into(),
            username: display_username(account).into(),
            id: account.id,
            created: self.approximate_creation_date(account).await.into(),
        }
    }

    /// Date of the earliest retrievable profile photo, formatted for display.
    pub async fn approximate_creation_date(&self, account: &Account) -> Option<String> {
        let photos = match self
            .client
            .get_profile_photos(account, self.photo_limit)
            .await
        {
            Ok(photos) => photos,
            Err(e) => {
                debug!(account_id = account.id, error = %e, "Failed to get profile photos");
                return None;
            }
        };
        if photos.is_empty() {
            debug!(account_id = account.id, "Account has no profile photos");
            return None;
        }
        let earliest = earliest_upload(&photos)?;
        format_date(earliest, self.locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, MockChatClient};
    use chrono::TimeZone;

    fn photo(year: i32, month: u32, day: u32) -> ProfilePhoto {
        ProfilePhoto {
            uploaded_at: Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single(),
        }
    }

    fn account(first: Option<&str>, last: Option<&str>, username: Option<&str>) -> Account {
        Account {
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            username: username.map(str::to_string),
            ..Account::bare(42)
        }
    }

    #[test]
    fn test_display_name_joins_present_parts() {
        assert_eq!(
            display_name(&account(Some("John"), Some("Doe"), None)).as_deref(),
            Some("John Doe")
        );
        assert_eq!(
            display_name(&account(Some("John"), None, None)).as_deref(),
            Some("John")
        );
        assert_eq!(
            display_name(&account(None, Some("Doe"), None)).as_deref(),
            Some("Doe")
        );
        assert_eq!(
            display_name(&account(Some(" John "), Some(""), None)).as_deref(),
            Some("John")
        );
        assert_eq!(display_name(&account(Some(""), Some("  "), None)), None);
        assert_eq!(display_name(&account(None, None, None)), None);
    }

    #[test]
    fn test_display_username() {
        assert_eq!(
            display_username(&account(None, None, Some("durov"))).as_deref(),
            Some("@durov")
        );
        assert_eq!(display_username(&account(None, None, Some(""))), None);
        assert_eq!(display_username(&account(None, None, None)), None);
    }

    #[test]
    fn test_earliest_upload_takes_last_of_newest_first() {
        let photos = [photo(2023, 1, 1), photo(2020, 6, 15), photo(2016, 3, 5)];
        assert_eq!(earliest_upload(&photos), photo(2016, 3, 5).uploaded_at);
    }

    #[test]
    fn test_earliest_upload_skips_missing_dates() {
        let photos = [
            photo(2023, 1, 1),
            photo(2019, 2, 2),
            ProfilePhoto { uploaded_at: None },
        ];
        assert_eq!(earliest_upload(&photos), photo(2019, 2, 2).uploaded_at);
        assert_eq!(earliest_upload(&[ProfilePhoto { uploaded_at: None }]), None);
        assert_eq!(earliest_upload(&[]), None);
    }

    #[test]
    fn test_format_date_localized() {
        let date = photo(2016, 3, 5).uploaded_at.expect("valid date");
        assert_eq!(format_date(date, Locale::En).as_deref(), Some("05 March 2016"));
        assert_eq!(format_date(date, Locale::Ru).as_deref(), Some("05 марта 2016"));
    }

    #[tokio::test]
    async fn test_photo_error_degrades_to_unknown() {
        let mut mock = MockChatClient::new();
        mock.expect_get_profile_photos()
            .times(1)
            .returning(|_, _| Err(ClientError::Transport("connection reset".into())));
        let extractor = Extractor::new(Arc::new(mock), DEFAULT_PHOTO_LIMIT, Locale::En);

        let profile = extractor
            .extract(&account(Some("John"), None, Some("john")))
            .await;
        assert_eq!(profile.created, FieldValue::Unknown);
        assert_eq!(profile.name, FieldValue::Known("John".into()));
        assert_eq!(profile.username, FieldValue::Known("@john".into()));
        assert_eq!(profile.id, 42);
    }

    #[tokio::test]
    async fn test_requests_configured_photo_limit() {
        let mut mock = MockChatClient::new();
        mock.expect_get_profile_photos()
            .withf(|account, limit| account.id == 42 && *limit == 200)
            .times(1)
            .returning(|_, _| Ok(vec![photo(2021, 11, 30), photo(2018, 8, 1)]));
        let extractor = Extractor::new(Arc::new(mock), DEFAULT_PHOTO_LIMIT, Locale::En);

        let created = extractor
            .approximate_creation_date(&account(None, None, None))
            .await;
        assert_eq!(created.as_deref(), Some("01 August 2018"));
    }

    #[tokio::test]
    async fn test_empty_history_is_unknown() {
        let mut mock = MockChatClient::new();
        mock.expect_get_profile_photos()
            .returning(|_, _| Ok(Vec::new()));
        let extractor = Extractor::new(Arc::new(mock), DEFAULT_PHOTO_LIMIT, Locale::Ru);

        let profile = extractor.extract(&account(None, None, None)).await;
        assert_eq!(profile.created, FieldValue::Unknown);
        assert_eq!(profile.name, FieldValue::Unknown);
        assert_eq!(profile.username, FieldValue::Unknown);
    }
}
