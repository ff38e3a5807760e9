//! Mention suggestions for the editor's `@` autocomplete.
//!
//! Two strategies with different semantics share the [`MentionSource`]
//! interface:
//!
//! * [`PrefixDispatch`] — routes on a literal `@type/` prefix to one category's
//!   candidates; a bare `@...` yields the category menu.
//! * [`FlatRanker`] — filters and ranks one flat list of every candidate; the
//!   caller strips the leading `@`.
//!
//! Both read a [`MentionCandidates`] snapshot assembled by the service, so
//! neither touches the store directly.

pub mod dispatch;
pub mod flat;

pub use dispatch::PrefixDispatch;
pub use flat::FlatRanker;

use super::index::KnowledgeIndex;
use super::registry::{Agent, Catalog, CatalogEntry};
use super::types::{KnowledgeDocument, MentionKind, MentionSuggestion, SuggestionPayload};

/// Characters of content shown as a document suggestion's description.
const DOCUMENT_PREVIEW_CHARS: usize = 80;

/// Point-in-time view of every mentionable entity.
pub struct MentionCandidates<'a> {
    pub agents: Vec<Agent>,
    pub catalog: &'a Catalog,
    /// Indexed documents in first-indexed order.
    pub documents: Vec<KnowledgeDocument>,
    pub index: &'a KnowledgeIndex,
}

pub trait MentionSource {
    fn name(&self) -> &'static str;

    fn suggest(&self, query: &str, candidates: &MentionCandidates<'_>) -> Vec<MentionSuggestion>;
}

pub(crate) fn agent_suggestion(agent: &Agent) -> MentionSuggestion {
    MentionSuggestion {
        id: agent.id.clone(),
        kind: MentionKind::Agent,
        label: format!("agent/{}", agent.name),
        description: agent.description.clone(),
        icon: agent
            .icon
            .clone()
            .unwrap_or_else(|| MentionKind::Agent.icon().to_string()),
        color: agent.color.clone(),
        path: format!("@agent/{}", agent.id),
        payload: Some(SuggestionPayload::Agent {
            enabled: agent.enabled,
        }),
    }
}

pub(crate) fn catalog_suggestion(kind: MentionKind, entry: &CatalogEntry) -> MentionSuggestion {
    let payload = match kind {
        MentionKind::Seamstress => SuggestionPayload::System,
        _ => SuggestionPayload::Catalog {
            category: kind.as_str(),
        },
    };
    MentionSuggestion {
        id: entry.id.clone(),
        kind,
        label: format!("{kind}/{}", entry.name),
        description: entry.description.clone(),
        icon: kind.icon().to_string(),
        color: None,
        path: format!("@{kind}/{}", entry.id),
        payload: Some(payload),
    }
}

pub(crate) fn document_suggestion(doc: &KnowledgeDocument) -> MentionSuggestion {
    let preview: String = doc.content.chars().take(DOCUMENT_PREVIEW_CHARS).collect();
    MentionSuggestion {
        id: doc.id.clone(),
        kind: MentionKind::Knowledge,
        label: format!("knowledge/{}", doc.title),
        description: preview.trim().to_string(),
        icon: MentionKind::Knowledge.icon().to_string(),
        color: None,
        path: format!("@knowledge/{}", doc.id),
        payload: Some(SuggestionPayload::Document {
            doc_type: doc.doc_type,
            tags: doc.metadata.tags.iter().cloned().collect(),
            version: doc.metadata.version,
            publishing_status: doc.publishing_status,
        }),
    }
}

/// Case-insensitive containment; `needle` must already be lower-case.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
