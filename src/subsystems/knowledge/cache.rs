//! Bounded most-recently-used document cache.
//!
//! A read-through projection of the store, never authoritative. Entries are
//! kept newest first; inserting past capacity evicts the least recently used.
//! Lookups are linear scans over at most `capacity` entries.

use std::collections::VecDeque;

use super::types::KnowledgeDocument;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct DocumentCache {
    entries: VecDeque<KnowledgeDocument>,
    capacity: usize,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DocumentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Clone of the cached document, promoted to most recently used.
    pub fn get(&mut self, id: &str) -> Option<KnowledgeDocument> {
        let pos = self.entries.iter().position(|d| d.id == id)?;
        let doc = self.entries.remove(pos)?;
        self.entries.push_front(doc.clone());
        Some(doc)
    }

    /// Insert or replace, as most recently used.
    pub fn put(&mut self, doc: KnowledgeDocument) {
        if self.capacity == 0 {
            return;
        }
        self.remove(&doc.id);
        self.entries.push_front(doc);
        self.entries.truncate(self.capacity);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|d| d.id == id) {
            Some(pos) => self.entries.remove(pos).is_some(),
            None => false,
        }
    }

    /// Ids, most recently used first.
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::knowledge::types::{
        DocumentMetadata, DocumentType, Permissions, PublishingStatus,
    };
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn doc(id: &str) -> KnowledgeDocument {
        KnowledgeDocument {
            id: id.into(),
            title: id.into(),
            content: String::new(),
            doc_type: DocumentType::Note,
            metadata: DocumentMetadata {
                author: "t".into(),
                created: Utc::now(),
                modified: Utc::now(),
                tags: BTreeSet::new(),
                references: Vec::new(),
                referenced_by: BTreeSet::new(),
                version: 1,
                size: None,
            },
            permissions: Permissions::owned_by("t"),
            publishing_status: PublishingStatus::Draft,
            embedding: None,
        }
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = DocumentCache::new(2);
        cache.put(doc("a"));
        cache.put(doc("b"));
        assert!(cache.get("a").is_some()); // a is now newest
        cache.put(doc("c"));
        assert_eq!(cache.ids(), vec!["c", "a"]);
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn put_replaces_existing_entry() {
        let mut cache = DocumentCache::default();
        cache.put(doc("a"));
        let mut updated = doc("a");
        updated.title = "renamed".into();
        cache.put(updated);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").unwrap().title, "renamed");
    }

    #[test]
    fn capacity_is_respected() {
        let mut cache = DocumentCache::default();
        for i in 0..15 {
            cache.put(doc(&format!("d{i}")));
        }
        assert_eq!(cache.len(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(cache.ids()[0], "d14");
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let mut cache = DocumentCache::new(0);
        cache.put(doc("a"));
        assert!(cache.is_empty());
    }
}
