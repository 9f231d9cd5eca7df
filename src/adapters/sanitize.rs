//! Log sanitization for clinical values and secrets.
//!
//! Applied to every formatted log line through [`SanitizingMakeWriter`]:
//! - Clinical field assignments (`age=45`, `"HbA1c_level": 5.5`)
//! - UUIDs and email addresses
//! - Bearer tokens (JWTs) and contextual secrets
//! - Long hex key material
//!
//! This is a fallback. `PatientRecord` already redacts itself in `Debug`
//! output, so clinical values should never reach a logging call.
//!
//! Input is capped per line: 16 KiB by default, configurable through
//! `GLYCOSCOPE_SANITIZE_MAX_BYTES` (see [`crate::config::ServiceConfig`]).

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

pub const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Pattern {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Pattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Clinical fields, as `key=value`, `key: value` or JSON members.
            // serde rejections (`age: invalid value: string "..."`) quote the
            // offending value after the error kind.
            (
                r#"(?i)"?\b(?P<field>gender|age|hypertension|heart_disease|smoking_history|bmi|hba1c_level|blood_glucose_level)\b"?\s*[:=]\s*(?:invalid (?:value|type): (?:[a-z ]*?(?:"(?:[^"\\]|\\.)*"|`[^`]*`)|[a-z]+)|"[^"]{0,64}"|[-+0-9.eE]+|[A-Za-z_]+)"#,
                "${field}=[REDACTED-CLINICAL]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b",
                "[REDACTED-JWT]",
            ),
            (
                r"(?i)\b(?:api[_-]?key|access[_-]?token|secret|password|token|authorization)\b\s*[:=]\s*(?:bearer\s+)?[A-Za-z0-9+/_.-]{16,}={0,2}",
                "[REDACTED-SECRET]",
            ),
            (r"\b[0-9a-fA-F]{64,}\b", "[REDACTED-KEY]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Pattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Replace sensitive substrings in `input`, capped at
/// [`DEFAULT_SANITIZE_MAX_BYTES`].
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, DEFAULT_SANITIZE_MAX_BYTES)
}

/// Like [`sanitize`], keeping at most `max_bytes` of input.
#[must_use]
pub fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.rules[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it reaches the underlying sink.
///
/// Installed once in `main`, so handlers and services log through it without
/// calling [`sanitize`] themselves. Clinical values should still stay out of
/// log calls in the first place: `PatientRecord` redacts its `Debug` output
/// and schema rejections log only their kind.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
    max_bytes: usize,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }

    /// Cap each sanitized line at `max_bytes` of input.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl<M: Clone> Clone for SanitizingMakeWriter<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            max_bytes: self.max_bytes,
        }
    }
}

/// Line-buffering writer handed out by [`SanitizingMakeWriter`].
///
/// Complete lines are sanitized and forwarded as they arrive; a trailing
/// partial line waits for the next newline or `flush`.
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_bytes,
        }
    }

    fn sanitize_bytes(&self, bytes: &[u8]) -> String {
        sanitize_with_limit(&String::from_utf8_lossy(bytes), self.max_bytes)
    }
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = self.sanitize_bytes(&line);
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A huge line without newlines is flushed early instead of buffered.
        let hard_cap = self.max_bytes.saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = self.sanitize_bytes(&self.buffer);
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let sanitized = self.sanitize_bytes(&self.buffer);
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), self.max_bytes)
    }
}
