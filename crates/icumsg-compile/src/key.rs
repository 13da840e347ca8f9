use sha2::{Digest, Sha256};

/// Stable catalog key: SHA-256 over `context + id`, truncated to a
/// fixed-width hex form. Identical inputs always hash identically, so
/// keys survive re-extraction.
pub fn message_key(id: &str, context: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    if let Some(context) = context {
        hasher.update(context.as_bytes());
    }
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::message_key;

    #[test]
    fn keys_are_deterministic_and_fixed_width() {
        let a = message_key("Hello {name}", None);
        let b = message_key("Hello {name}", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn context_separates_identical_ids() {
        let plain = message_key("Open", None);
        let verb = message_key("Open", Some("verb"));
        let noun = message_key("Open", Some("noun"));
        assert_ne!(plain, verb);
        assert_ne!(verb, noun);
    }
}
