//! Data model for the knowledge subsystem.
//!
//! * [`KnowledgeDocument`] — the authoritative record kept in a
//!   [`DocumentStore`](super::store::DocumentStore).
//! * [`DocumentReference`] — a positioned `@type/identifier` mention derived
//!   from document content; never created directly by callers.
//! * [`DocumentVersion`] — an immutable snapshot written on every create and
//!   update.
//! * [`MentionSuggestion`] — an ephemeral ranking/display projection.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ── Enums ────────────────────────────────────────────────────────────────────

/// Kind of document. Stored lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Note,
    Guide,
    Policy,
    Reference,
    Template,
    Specification,
    Report,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::Note,
        DocumentType::Guide,
        DocumentType::Policy,
        DocumentType::Reference,
        DocumentType::Template,
        DocumentType::Specification,
        DocumentType::Report,
        DocumentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Note => "note",
            DocumentType::Guide => "guide",
            DocumentType::Policy => "policy",
            DocumentType::Reference => "reference",
            DocumentType::Template => "template",
            DocumentType::Specification => "specification",
            DocumentType::Report => "report",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| AppError::Config(format!("unknown document type: {s}")))
    }
}

/// Lifecycle stage, independent of the version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Entity kinds that can be referenced from document content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Knowledge,
    Agent,
    Skill,
    Tool,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Knowledge => "knowledge",
            ReferenceType::Agent => "agent",
            ReferenceType::Skill => "skill",
            ReferenceType::Tool => "tool",
        }
    }

    /// Parse a mention prefix; unsupported prefixes yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "knowledge" => Some(ReferenceType::Knowledge),
            "agent" => Some(ReferenceType::Agent),
            "skill" => Some(ReferenceType::Skill),
            "tool" => Some(ReferenceType::Tool),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Documents ────────────────────────────────────────────────────────────────

/// Byte-offset span of a mention inside document content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub id: String,
    #[serde(rename = "type")]
    pub ref_type: ReferenceType,
    pub entity_id: String,
    /// Display label; the identifier until resolved against a registry.
    pub entity_name: String,
    pub position: Span,
    /// Up to 50 characters either side of the match.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub author: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub references: Vec<DocumentReference>,
    /// Ids of documents whose references point here.
    pub referenced_by: BTreeSet<String>,
    /// Starts at 1, +1 per successful update.
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub owner: String,
    pub public: bool,
    pub shared_with: BTreeSet<String>,
    pub editable_by: BTreeSet<String>,
    pub viewable_by: BTreeSet<String>,
}

impl Permissions {
    /// Owner-only permissions for a freshly created document.
    pub fn owned_by(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            public: false,
            shared_with: BTreeSet::new(),
            editable_by: BTreeSet::from([owner.to_string()]),
            viewable_by: BTreeSet::from([owner.to_string()]),
        }
    }

    pub fn can_edit(&self, user: &str) -> bool {
        self.editable_by.contains(user)
    }

    pub fn is_owner(&self, user: &str) -> bool {
        self.owner == user
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub metadata: DocumentMetadata,
    pub permissions: Permissions,
    pub publishing_status: PublishingStatus,
    /// Reserved; never populated by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl KnowledgeDocument {
    /// Ids of knowledge documents this document mentions, deduplicated.
    pub fn knowledge_targets(&self) -> BTreeSet<String> {
        self.metadata
            .references
            .iter()
            .filter(|r| r.ref_type == ReferenceType::Knowledge)
            .map(|r| r.entity_id.clone())
            .collect()
    }
}

/// Immutable history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    pub version: u32,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub created: DateTime<Utc>,
    pub author: String,
}

impl DocumentVersion {
    pub fn snapshot(doc: &KnowledgeDocument, author: &str) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            document_id: doc.id.clone(),
            version: doc.metadata.version,
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
            created: Utc::now(),
            author: author.to_string(),
        }
    }
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// When set, the update fails with `Conflict` unless the stored version matches.
    pub expected_version: Option<u32>,
}

impl DocumentUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

// ── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightField {
    Title,
    Tags,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: HighlightField,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document: KnowledgeDocument,
    pub score: u32,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_tokens: usize,
    pub total_tags: usize,
    pub types: Vec<DocumentType>,
}

// ── Mentions ─────────────────────────────────────────────────────────────────

/// What a suggestion points at. `Seamstress` is the built-in assistant
/// namespace, which has no structured reference counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Agent,
    Skill,
    Tool,
    Knowledge,
    Seamstress,
}

impl MentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionKind::Agent => "agent",
            MentionKind::Skill => "skill",
            MentionKind::Tool => "tool",
            MentionKind::Knowledge => "knowledge",
            MentionKind::Seamstress => "seamstress",
        }
    }

    /// Flat-ranker ordering: agent → skill → tool → knowledge → seamstress.
    pub fn priority(&self) -> u8 {
        match self {
            MentionKind::Agent => 0,
            MentionKind::Skill => 1,
            MentionKind::Tool => 2,
            MentionKind::Knowledge => 3,
            MentionKind::Seamstress => 4,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MentionKind::Agent => "bot",
            MentionKind::Skill => "sparkles",
            MentionKind::Tool => "wrench",
            MentionKind::Knowledge => "file-text",
            MentionKind::Seamstress => "scissors",
        }
    }
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind suggestion payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionPayload {
    Agent {
        enabled: bool,
    },
    Document {
        doc_type: DocumentType,
        tags: Vec<String>,
        version: u32,
        publishing_status: PublishingStatus,
    },
    Catalog {
        category: &'static str,
    },
    System,
    /// Category menu entry; `prefix` is what the editor inserts.
    Category {
        prefix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionSuggestion {
    pub id: String,
    pub kind: MentionKind,
    pub label: String,
    pub description: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Canonical `@type/id`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SuggestionPayload>,
}
