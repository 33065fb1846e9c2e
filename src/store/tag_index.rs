//! Reverse index from tags to cache keys.
//!
//! Kept bidirectionally consistent with each entry's tag set: a key
//! appears under tag `T` iff `T` is in that entry's tags. All updates
//! happen under the store lock, together with the entry-side change.

use std::collections::{HashMap, HashSet};

use crate::key::CacheKey;
use crate::tag::TagRef;

#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<TagRef, HashSet<CacheKey>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under every tag in `tags`.
    pub fn attach(&mut self, key: &CacheKey, tags: &HashSet<TagRef>) {
        for tag in tags {
            self.by_tag.entry(tag.clone()).or_default().insert(key.clone());
        }
    }

    /// Remove `key` from every tag in `tags`, dropping emptied buckets.
    pub fn detach(&mut self, key: &CacheKey, tags: &HashSet<TagRef>) {
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(tag);
                }
            }
        }
    }

    /// Union of all keys registered under any of the given tags.
    ///
    /// Matching is exact: a `LIST` tag resolves only entries that declared
    /// the wildcard, never entries tagged with specific ids, and vice versa.
    pub fn resolve(&self, tags: &[TagRef]) -> HashSet<CacheKey> {
        let mut keys = HashSet::new();
        for tag in tags {
            if let Some(matched) = self.by_tag.get(tag) {
                keys.extend(matched.iter().cloned());
            }
        }
        keys
    }

    pub fn contains(&self, tag: &TagRef, key: &CacheKey) -> bool {
        self.by_tag.get(tag).is_some_and(|keys| keys.contains(key))
    }

    /// Number of distinct tags currently indexed.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
