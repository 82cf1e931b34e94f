//! Temporary custom-artwork store.
//!
//! Uploaded artwork lives in memory behind a random token: stored once,
//! read many times, gone after the TTL. Expired entries are purged
//! opportunistically on upload; a fetch that finds an expired entry
//! removes it and reports the expiry distinctly from a plain miss.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated artwork tokens.
const TOKEN_LENGTH: usize = 16;

/// Tuning for the artwork store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long stored artwork stays retrievable
    pub ttl: Duration,
    /// Maximum accepted upload size in bytes
    pub max_bytes: usize,
}

/// Store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No artwork under this token (never stored, or purged)
    #[error("artwork not found")]
    Missing,

    /// The artwork existed but outlived its TTL
    #[error("artwork expired")]
    Expired,

    /// Upload rejected: empty payload
    #[error("artwork payload is empty")]
    Empty,

    /// Upload rejected: payload exceeds the size limit
    #[error("artwork exceeds size limit of {limit} bytes")]
    TooLarge { limit: usize },

    /// Upload rejected: not an image content type
    #[error("artwork must be an image, got {content_type}")]
    NotAnImage { content_type: String },
}

struct StoredArtwork {
    stored_at: Instant,
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory TTL-bounded blob store for uploaded artwork.
pub struct ArtworkStore {
    ttl: Duration,
    max_bytes: usize,
    entries: Mutex<HashMap<String, StoredArtwork>>,
}

impl ArtworkStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            ttl: options.ttl,
            max_bytes: options.max_bytes,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Validate and persist artwork bytes; returns the retrieval token.
    pub fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StoreError::TooLarge {
                limit: self.max_bytes,
            });
        }
        if !content_type.to_ascii_lowercase().contains("image") {
            return Err(StoreError::NotAnImage {
                content_type: content_type.to_string(),
            });
        }

        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        let mut entries = self.entries.lock();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            token.clone(),
            StoredArtwork {
                stored_at: Instant::now(),
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(token)
    }

    /// Retrieve artwork bytes and content type for a token.
    pub fn fetch(&self, token: &str) -> Result<(Vec<u8>, String), StoreError> {
        let mut entries = self.entries.lock();
        let entry = entries.get(token).ok_or(StoreError::Missing)?;
        if entry.stored_at.elapsed() >= self.ttl {
            entries.remove(token);
            return Err(StoreError::Expired);
        }
        Ok((entry.bytes.clone(), entry.content_type.clone()))
    }

    /// Number of stored entries (including not-yet-purged expired ones).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> ArtworkStore {
        ArtworkStore::new(StoreOptions {
            ttl,
            max_bytes: 1024,
        })
    }

    #[test]
    fn test_store_and_fetch_roundtrip() {
        let store = store(Duration::from_secs(60));
        let token = store.store(b"png-bytes".to_vec(), "image/png").unwrap();

        let (bytes, content_type) = store.fetch(&token).unwrap();
        assert_eq!(bytes, b"png-bytes");
        assert_eq!(content_type, "image/png");
        // Read-many: a second fetch still works.
        assert!(store.fetch(&token).is_ok());
    }

    #[test]
    fn test_fetch_unknown_token_is_missing() {
        let store = store(Duration::from_secs(60));
        assert_eq!(store.fetch("nope").unwrap_err(), StoreError::Missing);
    }

    #[test]
    fn test_expired_entry_reports_expired_then_missing() {
        let store = store(Duration::ZERO);
        let token = store.store(b"gone soon".to_vec(), "image/jpeg").unwrap();

        assert_eq!(store.fetch(&token).unwrap_err(), StoreError::Expired);
        assert_eq!(store.fetch(&token).unwrap_err(), StoreError::Missing);
    }

    #[test]
    fn test_upload_validation() {
        let store = store(Duration::from_secs(60));
        assert_eq!(
            store.store(Vec::new(), "image/png").unwrap_err(),
            StoreError::Empty
        );
        assert_eq!(
            store.store(vec![0u8; 2048], "image/png").unwrap_err(),
            StoreError::TooLarge { limit: 1024 }
        );
        assert!(matches!(
            store.store(b"text".to_vec(), "text/plain").unwrap_err(),
            StoreError::NotAnImage { .. }
        ));
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = store(Duration::from_secs(60));
        let first = store.store(b"a".to_vec(), "image/png").unwrap();
        let second = store.store(b"b".to_vec(), "image/png").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upload_purges_expired_entries() {
        let store = store(Duration::ZERO);
        store.store(b"a".to_vec(), "image/png").unwrap();
        store.store(b"b".to_vec(), "image/png").unwrap();
        // Each upload purges what already expired; only the newest remains.
        assert_eq!(store.len(), 1);
    }
}
