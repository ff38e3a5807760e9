//! Category-prefix mention dispatch.
//!
//! `@agent/`, `@skill/`, `@tool/`, `@knowledge/` and `@seamstress/` route the
//! remainder of the query to that category alone. Any other query starting
//! with `@` gets the fixed five-entry category menu; anything else gets nothing.

use super::{
    MentionCandidates, MentionSource, agent_suggestion, catalog_suggestion, contains_ci,
    document_suggestion,
};
use crate::subsystems::knowledge::types::{MentionKind, MentionSuggestion, SuggestionPayload};

/// Menu order and the prefix each entry inserts.
const CATEGORIES: [(MentionKind, &str, &str); 5] = [
    (MentionKind::Agent, "@agent/", "Mention an AI agent"),
    (MentionKind::Skill, "@skill/", "Mention a skill"),
    (MentionKind::Tool, "@tool/", "Mention a tool"),
    (MentionKind::Knowledge, "@knowledge/", "Mention a knowledge document"),
    (MentionKind::Seamstress, "@seamstress/", "Mention the Seamstress assistant"),
];

#[derive(Debug, Clone)]
pub struct PrefixDispatch {
    /// Documents listed for a bare `@knowledge/`.
    pub document_limit: usize,
}

impl Default for PrefixDispatch {
    fn default() -> Self {
        Self { document_limit: 20 }
    }
}

impl PrefixDispatch {
    fn for_kind(
        &self,
        kind: MentionKind,
        rest: &str,
        c: &MentionCandidates<'_>,
    ) -> Vec<MentionSuggestion> {
        let needle = rest.trim().to_lowercase();
        match kind {
            MentionKind::Agent => c
                .agents
                .iter()
                .filter(|a| {
                    needle.is_empty()
                        || contains_ci(&a.name, &needle)
                        || contains_ci(&a.id, &needle)
                        || contains_ci(&a.description, &needle)
                })
                .map(agent_suggestion)
                .collect(),
            MentionKind::Skill | MentionKind::Tool | MentionKind::Seamstress => {
                let entries = match kind {
                    MentionKind::Skill => &c.catalog.skills,
                    MentionKind::Tool => &c.catalog.tools,
                    _ => &c.catalog.system,
                };
                entries
                    .iter()
                    .filter(|e| {
                        needle.is_empty()
                            || contains_ci(&e.name, &needle)
                            || contains_ci(&e.id, &needle)
                            || contains_ci(&e.description, &needle)
                    })
                    .map(|e| catalog_suggestion(kind, e))
                    .collect()
            }
            MentionKind::Knowledge if needle.is_empty() => c
                .documents
                .iter()
                .take(self.document_limit)
                .map(document_suggestion)
                .collect(),
            MentionKind::Knowledge => c
                .index
                .search(&needle)
                .iter()
                .map(|r| document_suggestion(&r.document))
                .collect(),
        }
    }

    fn category_menu() -> Vec<MentionSuggestion> {
        CATEGORIES
            .iter()
            .map(|(kind, prefix, description)| MentionSuggestion {
                id: kind.as_str().to_string(),
                kind: *kind,
                label: format!("{kind}/"),
                description: description.to_string(),
                icon: kind.icon().to_string(),
                color: None,
                path: prefix.to_string(),
                payload: Some(SuggestionPayload::Category {
                    prefix: prefix.to_string(),
                }),
            })
            .collect()
    }
}

impl MentionSource for PrefixDispatch {
    fn name(&self) -> &'static str {
        "prefix_dispatch"
    }

    fn suggest(&self, query: &str, c: &MentionCandidates<'_>) -> Vec<MentionSuggestion> {
        let query = query.trim_start();
        for (kind, prefix, _) in CATEGORIES {
            if let Some(rest) = query.strip_prefix(prefix) {
                return self.for_kind(kind, rest, c);
            }
        }
        if query.starts_with('@') {
            return Self::category_menu();
        }
        Vec::new()
    }
}
