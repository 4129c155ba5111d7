//! Small helpers shared across the pipeline

pub mod fs;

pub use fs::{atomic_write, ensure_dir, move_file};

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Option<Regex>> = OnceLock::new();
    match WHITESPACE.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(re) => re.replace_all(text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// `sha256:`-prefixed hex digest of `content`.
pub fn sha256_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Getting\n   started \t here "), "Getting started here");
        assert_eq!(normalize_whitespace("\n\t "), "");
    }

    #[test]
    fn test_sha256_digest() {
        assert_eq!(
            sha256_digest(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
