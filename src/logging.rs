//! Log setup with redaction of Telegram credentials.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
pub struct RedactionPatterns {
    api_hash: Regex,
    api_hash_field: Regex,
    phone: Regex,
    login_code: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            api_hash: Regex::new(r"\b[0-9a-fA-F]{32}\b")?,
            api_hash_field: Regex::new(r"(?i)(api_hash\s*[=:]\s*)[^\s,}&]+")?,
            phone: Regex::new(r"\+\d{7,15}\b")?,
            login_code: Regex::new(r"(?i)(phone_code\s*[=:]\s*)\d+")?,
        })
    }

    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let mut output = self
            .api_hash_field
            .replace_all(input, "${1}[MASKED]")
            .to_string();
        output = self
            .api_hash
            .replace_all(&output, "[API_HASH]")
            .to_string();
        output = self.phone.replace_all(&output, "[PHONE]").to_string();
        output = self
            .login_code
            .replace_all(&output, "${1}[MASKED]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // The caller wrote `buf.len()` bytes even if the redacted length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

/// Installs the global subscriber: `RUST_LOG` filter (default `info`), redacted stderr output.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> RedactionPatterns {
        RedactionPatterns::new().expect("patterns should compile")
    }

    #[test]
    fn test_redacts_api_hash() {
        let out = patterns().redact("connecting with 0123456789abcdef0123456789abcdef now");
        assert_eq!(out, "connecting with [API_HASH] now");

        let out = patterns().redact("api_hash=shortsecret id=5");
        assert_eq!(out, "api_hash=[MASKED] id=5");
    }

    #[test]
    fn test_redacts_phone_and_code() {
        let out = patterns().redact("login for +15551234567 phone_code: 12345");
        assert_eq!(out, "login for [PHONE] phone_code: [MASKED]");
    }

    #[test]
    fn test_keeps_account_ids() {
        let line = "Reported account information account_id=123456789";
        assert_eq!(patterns().redact(line), line);
    }

    #[test]
    fn test_writer_reports_original_length() {
        let mut sink = Vec::new();
        let mut writer = RedactingWriter::new(&mut sink, Arc::new(patterns()));
        let input = b"phone +15551234567";
        let written = writer.write(input).expect("write should succeed");
        assert_eq!(written, input.len());
        assert_eq!(String::from_utf8_lossy(&sink), "phone [PHONE]");
    }
}
