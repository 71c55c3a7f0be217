//! Text helpers for Telegram HTML markup.

/// Maximum number of characters of a failure description shown to the user.
/// Telegram caps a message at 4096 characters; the rest of the error notice is short.
pub const ERROR_TEXT_LIMIT: usize = 1000;

/// Escapes `&`, `<` and `>` so arbitrary text can be embedded into Telegram HTML.
///
/// # Examples
///
/// ```
/// use find_id::utils::escape_html;
/// assert_eq!(escape_html("<b>Tom & Jerry</b>"), "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Wraps the whole text into a quoted-text span.
#[must_use]
pub fn wrap_blockquote(text: &str) -> String {
    format!("<blockquote>{text}</blockquote>")
}

/// Truncates a string to at most `max_chars` characters, respecting char boundaries.
///
/// # Examples
///
/// ```
/// use find_id::utils::truncate_str;
/// assert_eq!(truncate_str("Привет, мир!", 6), "Привет");
/// ```
#[must_use]
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}
