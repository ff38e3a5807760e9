//! In-memory multi-field inverted index over knowledge documents.
//!
//! Four parallel maps of token → document ids: title words, tag words, document
//! type and content words (content capped at the first
//! [`DEFAULT_CONTENT_TOKEN_CAP`] tokens per document). Buckets are sets, so
//! re-indexing a document never double counts, and empty buckets are pruned on
//! removal.
//!
//! All state sits behind one `RwLock`. Every mutation, including the
//! remove-then-reindex of [`KnowledgeIndex::update_document`], runs inside a
//! single write guard, so readers never observe a half-updated document.
//!
//! Ties in search score are broken by the order documents were first indexed;
//! re-indexing an existing id keeps its original position.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::types::{
    DocumentType, Highlight, HighlightField, IndexStats, KnowledgeDocument, SearchResult,
};

pub const DEFAULT_CONTENT_TOKEN_CAP: usize = 1000;

const TITLE_WEIGHT: u32 = 10;
const TAG_WEIGHT: u32 = 5;
const CONTENT_WEIGHT: u32 = 1;

/// Characters kept on each side of a highlighted match.
const SNIPPET_RADIUS: usize = 100;

type Buckets = HashMap<String, HashSet<String>>;

struct IndexedDoc {
    seq: u64,
    doc: KnowledgeDocument,
}

#[derive(Default)]
struct IndexInner {
    title: Buckets,
    tags: Buckets,
    types: Buckets,
    content: Buckets,
    documents: HashMap<String, IndexedDoc>,
    next_seq: u64,
}

pub struct KnowledgeIndex {
    inner: RwLock<IndexInner>,
    content_token_cap: usize,
}

impl Default for KnowledgeIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_TOKEN_CAP)
    }
}

/// Lower-case, replace anything outside `[a-z0-9]` with whitespace, split, and
/// drop tokens of two characters or fewer.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalised: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();
    normalised
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Every token of every tag, deduplicated.
fn tag_tokens(tags: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter().flat_map(|t| tokenize(t)).collect()
}

fn insert(buckets: &mut Buckets, token: String, id: &str) {
    buckets.entry(token).or_default().insert(id.to_string());
}

fn remove(buckets: &mut Buckets, token: &str, id: &str) {
    if let Some(ids) = buckets.get_mut(token) {
        ids.remove(id);
        if ids.is_empty() {
            buckets.remove(token);
        }
    }
}

impl IndexInner {
    fn content_tokens(doc: &KnowledgeDocument, cap: usize) -> Vec<String> {
        let mut tokens = tokenize(&doc.content);
        tokens.truncate(cap);
        tokens
    }

    fn index_locked(&mut self, doc: &KnowledgeDocument, cap: usize) {
        let seq = match self.remove_locked(&doc.id, cap) {
            Some(seq) => seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };

        for token in tokenize(&doc.title) {
            insert(&mut self.title, token, &doc.id);
        }
        for token in tag_tokens(&doc.metadata.tags) {
            insert(&mut self.tags, token, &doc.id);
        }
        insert(&mut self.types, doc.doc_type.as_str().to_string(), &doc.id);
        for token in Self::content_tokens(doc, cap) {
            insert(&mut self.content, token, &doc.id);
        }

        self.documents.insert(
            doc.id.clone(),
            IndexedDoc {
                seq,
                doc: doc.clone(),
            },
        );
    }

    /// Returns the removed document's insertion sequence.
    fn remove_locked(&mut self, id: &str, cap: usize) -> Option<u64> {
        let IndexedDoc { seq, doc } = self.documents.remove(id)?;

        for token in tokenize(&doc.title) {
            remove(&mut self.title, &token, id);
        }
        for token in tag_tokens(&doc.metadata.tags) {
            remove(&mut self.tags, &token, id);
        }
        remove(&mut self.types, doc.doc_type.as_str(), id);
        for token in Self::content_tokens(&doc, cap) {
            remove(&mut self.content, &token, id);
        }
        Some(seq)
    }
}

impl KnowledgeIndex {
    pub fn new(content_token_cap: usize) -> Self {
        Self {
            inner: RwLock::new(IndexInner::default()),
            content_token_cap,
        }
    }

    /// Add `doc`. An id that is already indexed is replaced, not merged.
    pub fn index_document(&self, doc: &KnowledgeDocument) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.index_locked(doc, self.content_token_cap);
        debug!(doc_id = %doc.id, "document indexed");
    }

    /// Full remove followed by a fresh index, under one write guard.
    pub fn update_document(&self, doc: &KnowledgeDocument) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.remove_locked(&doc.id, self.content_token_cap);
        inner.index_locked(doc, self.content_token_cap);
        if let (Some(seq), Some(entry)) = (seq, inner.documents.get_mut(&doc.id)) {
            entry.seq = seq;
        }
        debug!(doc_id = %doc.id, "document reindexed");
    }

    pub fn remove_document(&self, id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.remove_locked(id, self.content_token_cap).is_some() {
            debug!(doc_id = %id, "document removed from index");
        }
    }

    /// Drop everything and index `docs` in the given order.
    pub fn rebuild<'a>(&self, docs: impl IntoIterator<Item = &'a KnowledgeDocument>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = IndexInner::default();
        for doc in docs {
            inner.index_locked(doc, self.content_token_cap);
        }
    }

    /// OR-semantics weighted search: 10 per title token, 5 per tag token, 1 per
    /// content token. Repeated query tokens count once.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut tokens = tokenize(query);
        let mut seen = HashSet::new();
        tokens.retain(|t| seen.insert(t.clone()));
        if tokens.is_empty() {
            return Vec::new();
        }

        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        #[derive(Default)]
        struct Hit<'q> {
            score: u32,
            title: Option<&'q str>,
            tag: Option<&'q str>,
            content: Option<&'q str>,
        }

        let mut hits: HashMap<&str, Hit<'_>> = HashMap::new();
        for token in &tokens {
            let fields = [
                (&inner.title, TITLE_WEIGHT, HighlightField::Title),
                (&inner.tags, TAG_WEIGHT, HighlightField::Tags),
                (&inner.content, CONTENT_WEIGHT, HighlightField::Content),
            ];
            for (buckets, weight, field) in fields {
                let Some(ids) = buckets.get(token) else {
                    continue;
                };
                for id in ids {
                    let hit = hits.entry(id.as_str()).or_default();
                    hit.score += weight;
                    let slot = match field {
                        HighlightField::Title => &mut hit.title,
                        HighlightField::Tags => &mut hit.tag,
                        HighlightField::Content => &mut hit.content,
                    };
                    slot.get_or_insert(token.as_str());
                }
            }
        }

        let mut ranked: Vec<(u64, SearchResult)> = hits
            .into_iter()
            .filter_map(|(id, hit)| {
                let entry = inner.documents.get(id)?;
                let doc = &entry.doc;
                let mut highlights = Vec::new();
                if let Some(token) = hit.title {
                    highlights.push(Highlight {
                        field: HighlightField::Title,
                        snippet: snippet(&doc.title, token),
                    });
                }
                if let Some(token) = hit.tag {
                    let tag = doc
                        .metadata
                        .tags
                        .iter()
                        .find(|t| tokenize(t).iter().any(|tt| tt == token))
                        .cloned()
                        .unwrap_or_else(|| token.to_string());
                    highlights.push(Highlight {
                        field: HighlightField::Tags,
                        snippet: tag,
                    });
                }
                if let Some(token) = hit.content {
                    highlights.push(Highlight {
                        field: HighlightField::Content,
                        snippet: snippet(&doc.content, token),
                    });
                }
                Some((
                    entry.seq,
                    SearchResult {
                        document: doc.clone(),
                        score: hit.score,
                        highlights,
                    },
                ))
            })
            .collect();

        ranked.sort_by(|(seq_a, a), (seq_b, b)| b.score.cmp(&a.score).then(seq_a.cmp(seq_b)));
        ranked.into_iter().map(|(_, r)| r).collect()
    }

    /// Up to `limit` distinct title words and tags starting with `prefix`,
    /// alphabetically.
    pub fn get_suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .title
            .keys()
            .chain(inner.tags.keys())
            .filter(|t| t.starts_with(&prefix))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(limit)
            .collect()
    }

    pub fn get_stats(&self) -> IndexStats {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let types: BTreeSet<DocumentType> =
            inner.types.keys().filter_map(|k| k.parse().ok()).collect();
        IndexStats {
            total_documents: inner.documents.len(),
            total_tokens: inner.content.len(),
            total_tags: inner.tags.len(),
            types: types.into_iter().collect(),
        }
    }

    /// Indexed documents in first-indexed order.
    pub fn documents(&self, limit: usize) -> Vec<KnowledgeDocument> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<&IndexedDoc> = inner.documents.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().take(limit).map(|e| e.doc.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<KnowledgeDocument> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.documents.get(id).map(|e| e.doc.clone())
    }

    /// `true` if `id` appears in any bucket of any map.
    pub fn references_id(&self, id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.documents.contains_key(id)
            || [&inner.title, &inner.tags, &inner.types, &inner.content]
                .into_iter()
                .any(|buckets| buckets.values().any(|ids| ids.contains(id)))
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .documents
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First case-insensitive occurrence of `token` with [`SNIPPET_RADIUS`]
/// characters either side, ellipsised where truncated.
fn snippet(text: &str, token: &str) -> String {
    let needle = token.as_bytes();
    let found = text
        .as_bytes()
        .windows(needle.len().max(1))
        .position(|w| w.eq_ignore_ascii_case(needle))
        .filter(|_| !needle.is_empty());

    let (match_start, match_end) = match found {
        Some(pos) => (pos, pos + needle.len()),
        None => (0, 0),
    };

    let from = text[..match_start]
        .char_indices()
        .rev()
        .nth(SNIPPET_RADIUS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = text[match_end..]
        .char_indices()
        .nth(SNIPPET_RADIUS)
        .map(|(i, _)| match_end + i)
        .unwrap_or(text.len());

    let mut out = String::new();
    if from > 0 {
        out.push_str("...");
    }
    out.push_str(&text[from..to]);
    if to < text.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::knowledge::types::{DocumentMetadata, Permissions, PublishingStatus};
    use chrono::Utc;

    fn doc(id: &str, title: &str, content: &str, tags: &[&str]) -> KnowledgeDocument {
        KnowledgeDocument {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            doc_type: DocumentType::Policy,
            metadata: DocumentMetadata {
                author: "t".into(),
                created: Utc::now(),
                modified: Utc::now(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
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
    fn tokenize_drops_short_and_symbols() {
        assert_eq!(
            tokenize("The QUICK-brown fox, a 42nd go!"),
            vec!["the", "quick", "brown", "fox", "42nd"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("a an to").is_empty());
    }

    #[test]
    fn index_then_remove_leaves_no_trace() {
        let index = KnowledgeIndex::default();
        let d = doc("d1", "Building Code", "residential building code rules", &["Safety"]);
        index.index_document(&d);
        assert!(index.references_id("d1"));

        index.remove_document("d1");
        assert!(!index.references_id("d1"));
        let stats = index.get_stats();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.total_tokens, 0);
        assert_eq!(stats.total_tags, 0);
        assert!(stats.types.is_empty());
    }

    #[test]
    fn reindexing_does_not_double_count() {
        let index = KnowledgeIndex::default();
        let d = doc("d1", "Finance policy", "finance finance", &["finance"]);
        index.index_document(&d);
        let before = index.search("finance")[0].score;
        index.index_document(&d);
        let after = index.search("finance");
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].score, before);
        assert_eq!(before, TITLE_WEIGHT + TAG_WEIGHT + CONTENT_WEIGHT);
    }

    #[test]
    fn multi_word_and_hyphenated_tags_are_searchable() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("d1", "Onboarding", "", &["human resources", "follow-up"]));

        for q in ["resources", "follow", "follow-up"] {
            let hits = index.search(q);
            assert_eq!(hits.len(), 1, "query {q}");
            assert_eq!(hits[0].score, TAG_WEIGHT);
            assert_eq!(hits[0].highlights[0].field, HighlightField::Tags);
        }
        let both = index.search("human resources");
        assert_eq!(both[0].score, 2 * TAG_WEIGHT);
        assert_eq!(both[0].highlights[0].snippet, "human resources");

        index.remove_document("d1");
        assert!(!index.references_id("d1"));
        assert_eq!(index.get_stats().total_tags, 0);
    }

    #[test]
    fn update_drops_stale_tokens() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("d1", "Alpha", "original wording", &[]));
        index.update_document(&doc("d1", "Alpha", "replacement text", &[]));
        assert!(index.search("original").is_empty());
        assert_eq!(index.search("replacement").len(), 1);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("d1", "Anything", "content", &[]));
        assert!(index.search("").is_empty());
        assert!(index.search("  ,, ").is_empty());
    }

    #[test]
    fn ties_keep_insertion_order_across_updates() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("a", "Policy A", "", &["finance"]));
        index.index_document(&doc("b", "Policy B", "", &["finance", "hr"]));
        index.update_document(&doc("a", "Policy A", "edited", &["finance"]));

        let results = index.search("finance");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "a");
        assert_eq!(results[1].document.id, "b");
        assert!(results.iter().all(|r| r.score == TAG_WEIGHT));
    }

    #[test]
    fn multi_term_is_or_semantics() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("a", "Rust guide", "", &[]));
        index.index_document(&doc("b", "Python guide", "", &[]));
        let results = index.search("rust python");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn content_cap_limits_indexed_tokens() {
        let index = KnowledgeIndex::new(2);
        index.index_document(&doc("a", "T", "first second third", &[]));
        assert_eq!(index.search("second").len(), 1);
        assert!(index.search("third").is_empty());
    }

    #[test]
    fn highlights_are_ellipsised() {
        let long = format!("{} needle {}", "x ".repeat(120), "y ".repeat(120));
        let index = KnowledgeIndex::default();
        index.index_document(&doc("a", "Haystack", &long, &[]));
        let results = index.search("needle");
        let hl = &results[0].highlights[0];
        assert_eq!(hl.field, HighlightField::Content);
        assert!(hl.snippet.starts_with("..."));
        assert!(hl.snippet.ends_with("..."));
        assert!(hl.snippet.contains("needle"));
    }

    #[test]
    fn short_field_snippet_is_untruncated() {
        assert_eq!(snippet("Budget Policy", "policy"), "Budget Policy");
    }

    #[test]
    fn suggestions_come_from_titles_and_tags() {
        let index = KnowledgeIndex::default();
        index.index_document(&doc("a", "Finance Handbook", "financial", &["finops"]));
        let s = index.get_suggestions("fin", 10);
        assert_eq!(s, vec!["finance", "finops"]);
        assert_eq!(index.get_suggestions("fin", 1).len(), 1);
    }
}
