//! Thread-continuation heuristics.
//!
//! Decides whether an email continues a known conversation based on subject
//! normalization alone. Deliberately permissive: a false positive only costs
//! a redundant similarity check, while a false negative forces a full-corpus
//! match, so containment in either direction counts as continuation.

use once_cell::sync::Lazy;
use regex::Regex;

static REPLY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:re|fwd|fw):\s*").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a subject for comparison: strip reply/forward prefixes,
/// collapse whitespace, lower-case.
pub fn normalize_subject(subject: &str) -> String {
    if subject.is_empty() {
        return String::new();
    }

    let mut subject = subject.to_string();
    // Prefixes stack ("Re: Fwd: ..."), strip until none remain
    loop {
        let stripped = REPLY_PREFIX.replace(&subject, "").into_owned();
        if stripped == subject {
            break;
        }
        subject = stripped;
    }

    WHITESPACE
        .replace_all(&subject, " ")
        .trim()
        .to_lowercase()
}

/// Whether `current_subject` continues the thread started by `thread_subject`.
pub fn is_continuation(current_subject: &str, thread_subject: &str) -> bool {
    if current_subject.is_empty() || thread_subject.is_empty() {
        return false;
    }

    let current = normalize_subject(current_subject);
    let thread = normalize_subject(thread_subject);

    if current.is_empty() || thread.is_empty() {
        return false;
    }

    current == thread || current.contains(&thread) || thread.contains(&current)
}
