//! Cache key derivation

use sha2::{Digest, Sha256};

/// Derive the cache key for a preview: a SHA-256 hex digest of the source
/// URL and the requested dimensions.
pub fn preview_key(url: &str, width: u32, height: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}x{}", url, width, height).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let k1 = preview_key("http://example.com/gopher.jpg", 333, 666);
        let k2 = preview_key("http://example.com/gopher.jpg", 333, 666);
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_key_varies_with_inputs() {
        let base = preview_key("http://example.com/gopher.jpg", 333, 666);
        assert_ne!(base, preview_key("http://example.com/other.jpg", 333, 666));
        assert_ne!(base, preview_key("http://example.com/gopher.jpg", 666, 333));
    }

    #[test]
    fn test_key_is_hex_digest() {
        let key = preview_key("http://example.com/gopher.jpg", 100, 100);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
