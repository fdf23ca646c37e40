//! Email text normalization for embedding.
//!
//! Raw email bodies carry markup, signatures, and quoted replies that add
//! noise to the embedding. Normalization strips all of that down to a short
//! canonical string. Every function here is pure; `clean_body` is idempotent
//! so re-normalizing cached text is harmless.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::EMPTY_TEXT_SENTINEL;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static SIGNATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "-- " delimiter line and everything after it
        r"(?is)\n--\s*\n.*$",
        r"(?is)\nsent from my.*$",
        r"(?is)\n(?:best regards?|thanks?|sincerely),.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean an email body: strip markup, signatures, and quoted replies,
/// then collapse whitespace.
pub fn clean_body(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let mut text = HTML_TAG.replace_all(content, " ").into_owned();

    for pattern in SIGNATURE_PATTERNS.iter() {
        text = pattern.replace(&text, "").into_owned();
    }

    // Drop quoted-reply lines
    let text: String = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n");

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extract the canonical text fed to the embedder.
///
/// Joins the truncated subject and cleaned body as `"subject. body"`, or
/// returns whichever part is non-empty, or a fixed sentinel when both are.
pub fn meaningful_text(subject: &str, body: &str, max_subject: usize, max_body: usize) -> String {
    let subject = truncate_chars(subject, max_subject);
    let cleaned = clean_body(body);
    let cleaned = truncate_chars(&cleaned, max_body);

    match (subject.is_empty(), cleaned.is_empty()) {
        (false, false) => format!("{}. {}", subject, cleaned),
        (false, true) => subject.to_string(),
        (true, false) => cleaned.to_string(),
        (true, true) => EMPTY_TEXT_SENTINEL.to_string(),
    }
}
