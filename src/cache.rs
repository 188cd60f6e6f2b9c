use polars::prelude::DataFrame;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Digest of workbook bytes used as the cache key. Length is mixed in so that
/// truncated uploads never share a digest with the full file.
pub fn content_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.len().hash(&mut hasher);
    bytes.hash(&mut hasher);
    hasher.finish()
}

struct CacheEntry {
    bytes: Arc<[u8]>,
    frame: DataFrame,
}

/// Session-scoped memo of decoded workbooks keyed by content.
///
/// A hit requires both the digest and the bytes to match, so a digest collision
/// falls through to a fresh decode.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<u64, CacheEntry>,
    hits: usize,
    misses: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a previously decoded table for exactly these bytes
    pub fn get(&mut self, digest: u64, bytes: &[u8]) -> Option<DataFrame> {
        match self.entries.get(&digest) {
            Some(entry) if entry.bytes.as_ref() == bytes => {
                self.hits += 1;
                Some(entry.frame.clone())
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, digest: u64, bytes: &[u8], frame: DataFrame) {
        self.entries.insert(
            digest,
            CacheEntry {
                bytes: Arc::from(bytes),
                frame,
            },
        );
    }

    /// Look up `bytes`, decoding with `load` on a miss. Errors are not cached.
    pub fn get_or_load<E, F>(&mut self, bytes: &[u8], load: F) -> Result<(u64, DataFrame), E>
    where
        F: FnOnce(&[u8]) -> Result<DataFrame, E>,
    {
        let digest = content_digest(bytes);
        if let Some(frame) = self.get(digest, bytes) {
            tracing::debug!(digest, "table cache hit");
            return Ok((digest, frame));
        }
        let frame = load(bytes)?;
        self.insert(digest, bytes, frame.clone());
        Ok((digest, frame))
    }

    /// Drop every cached table
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
