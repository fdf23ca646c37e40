//! Content fingerprinting for result-cache keys.

use sha2::{Digest, Sha256};

/// Deterministic fingerprint of an email's subject and body.
///
/// The NUL delimiter keeps ("", "ab") and ("a", "b") distinct; hashing the
/// bare concatenation would let an empty subject collide with a body that
/// happens to equal another email's subject+body.
pub fn content_fingerprint(subject: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update([0u8]);
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(
            content_fingerprint("Invoice", "amount due"),
            content_fingerprint("Invoice", "amount due")
        );
    }

    #[test]
    fn test_fingerprint_differs_by_content() {
        assert_ne!(
            content_fingerprint("Invoice", "amount due"),
            content_fingerprint("Invoice", "paid in full")
        );
    }

    #[test]
    fn test_fingerprint_delimiter_prevents_shift_collision() {
        assert_ne!(content_fingerprint("", "ab"), content_fingerprint("a", "b"));
        assert_ne!(
            content_fingerprint("ab", ""),
            content_fingerprint("a", "b")
        );
    }

    #[test]
    fn test_fingerprint_is_hex() {
        let fp = content_fingerprint("s", "b");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
