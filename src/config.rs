//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables.

use crate::i18n::Locale;
use crate::lookup::extractor::DEFAULT_PHOTO_LIMIT;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Userbot settings
#[derive(Deserialize, Clone)]
pub struct Settings {
    /// Telegram API id from my.telegram.org
    pub api_id: i32,
    /// Telegram API hash from my.telegram.org
    pub api_hash: String,
    /// Phone number used for the first login; prompted for when missing
    pub phone: Option<String>,

    /// Path of the grammers session file
    #[serde(default = "default_session_file")]
    pub session_file: String,
    /// Prefix that marks a message as a command
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Language of user-visible strings and month names
    #[serde(default)]
    pub locale: Locale,
    /// Render banner icons as custom emoji (needs Telegram Premium on the account)
    #[serde(default = "default_true")]
    pub custom_emoji: bool,
    /// Profile photos fetched to estimate an account's creation date
    #[serde(default = "default_photo_limit")]
    pub photo_limit: usize,
    /// Only react to commands sent by the logged-in account
    #[serde(default = "default_true")]
    pub outgoing_only: bool,
}

fn default_session_file() -> String {
    "userbot.session".to_string()
}

fn default_command_prefix() -> String {
    ".".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_photo_limit() -> usize {
    DEFAULT_PHOTO_LIMIT
}

// Credentials stay out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[MASKED]")
            .field("phone", &self.phone.as_ref().map(|_| "[MASKED]"))
            .field("session_file", &self.session_file)
            .field("command_prefix", &self.command_prefix)
            .field("locale", &self.locale)
            .field("custom_emoji", &self.custom_emoji)
            .field("photo_limit", &self.photo_limit)
            .field("outgoing_only", &self.outgoing_only)
            .finish()
    }
}

/// Layered configuration sources, lowest priority first.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg. `APP__LOCALE=ru ./target/find-id`
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        // Plain UPPER_SNAKE_CASE variables, empty ones treated as unset
        .add_source(Environment::default().ignore_empty(true).try_parsing(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use find_id::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values the userbot cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_hash.trim().is_empty() {
            return Err(ConfigError::Message("api_hash must not be empty".into()));
        }
        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::Message(
                "command_prefix must be non-empty and contain no whitespace".into(),
            ));
        }
        if self.photo_limit == 0 {
            return Err(ConfigError::Message("photo_limit must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_apply() {
        let settings = from_toml("api_id = 12345\napi_hash = \"0123456789abcdef0123456789abcdef\"")
            .expect("minimal config should load");
        assert_eq!(settings.api_id, 12345);
        assert_eq!(settings.session_file, "userbot.session");
        assert_eq!(settings.command_prefix, ".");
        assert_eq!(settings.locale, Locale::En);
        assert!(settings.custom_emoji);
        assert_eq!(settings.photo_limit, 200);
        assert!(settings.outgoing_only);
        assert!(settings.phone.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let settings = from_toml(
            "api_id = 1\napi_hash = \"abc\"\ncommand_prefix = \"!\"\nlocale = \"ru\"\n\
             custom_emoji = false\nphoto_limit = 50\noutgoing_only = false",
        )
        .expect("config should load");
        assert_eq!(settings.command_prefix, "!");
        assert_eq!(settings.locale, Locale::Ru);
        assert!(!settings.custom_emoji);
        assert_eq!(settings.photo_limit, 50);
        assert!(!settings.outgoing_only);
    }

    #[test]
    fn test_missing_credentials_fail() {
        assert!(from_toml("api_hash = \"abc\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let mut settings = from_toml("api_id = 1\napi_hash = \"abc\"").expect("config should load");
        settings.command_prefix = " ".into();
        assert!(settings.validate().is_err());
        settings.command_prefix = ".".into();
        settings.photo_limit = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_masks_credentials() {
        let settings = from_toml("api_id = 1\napi_hash = \"supersecret\"\nphone = \"+15551234567\"")
            .expect("config should load");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("supersecret"));
        assert!(!debug.contains("15551234567"));
    }
}
