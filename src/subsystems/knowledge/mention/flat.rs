//! Flat aggregate mention ranker used by the editor's live autocomplete.
//!
//! Every agent, the first `document_cap` documents, every skill and tool, and
//! the system entries are formatted into one list. The query arrives without
//! its leading `@`.

use std::collections::HashSet;

use super::{
    MentionCandidates, MentionSource, agent_suggestion, catalog_suggestion, contains_ci,
    document_suggestion,
};
use crate::subsystems::knowledge::types::{MentionKind, MentionSuggestion};

/// Category order for the empty-query sampler.
const EMPTY_QUERY_ORDER: [MentionKind; 4] = [
    MentionKind::Agent,
    MentionKind::Skill,
    MentionKind::Tool,
    MentionKind::Knowledge,
];

#[derive(Debug, Clone)]
pub struct FlatRanker {
    pub document_cap: usize,
    /// Items taken per category for an empty query.
    pub per_category: usize,
    /// Empty-query results are backfilled up to this many.
    pub empty_query_fill: usize,
    pub result_cap: usize,
}

impl Default for FlatRanker {
    fn default() -> Self {
        Self {
            document_cap: 20,
            per_category: 3,
            empty_query_fill: 10,
            result_cap: 15,
        }
    }
}

impl FlatRanker {
    fn candidates(&self, c: &MentionCandidates<'_>) -> Vec<MentionSuggestion> {
        let mut all: Vec<MentionSuggestion> = c.agents.iter().map(agent_suggestion).collect();
        all.extend(c.documents.iter().take(self.document_cap).map(document_suggestion));
        all.extend(
            c.catalog
                .skills
                .iter()
                .map(|e| catalog_suggestion(MentionKind::Skill, e)),
        );
        all.extend(
            c.catalog
                .tools
                .iter()
                .map(|e| catalog_suggestion(MentionKind::Tool, e)),
        );
        all.extend(
            c.catalog
                .system
                .iter()
                .map(|e| catalog_suggestion(MentionKind::Seamstress, e)),
        );
        all
    }

    fn sample(&self, all: Vec<MentionSuggestion>) -> Vec<MentionSuggestion> {
        let mut out: Vec<MentionSuggestion> = Vec::new();
        for kind in EMPTY_QUERY_ORDER {
            out.extend(
                all.iter()
                    .filter(|s| s.kind == kind)
                    .take(self.per_category)
                    .cloned(),
            );
        }

        if out.len() < self.empty_query_fill {
            let taken: HashSet<String> = out.iter().map(|s| s.path.clone()).collect();
            let room = self.empty_query_fill - out.len();
            out.extend(
                all.into_iter()
                    .filter(|s| !taken.contains(&s.path))
                    .take(room),
            );
        }
        out
    }

    fn matches(s: &MentionSuggestion, needle: &str) -> bool {
        contains_ci(&s.label, needle)
            || contains_ci(&s.description, needle)
            || s.path.split('/').any(|seg| contains_ci(seg, needle))
    }
}

impl MentionSource for FlatRanker {
    fn name(&self) -> &'static str {
        "flat_ranker"
    }

    fn suggest(&self, query: &str, c: &MentionCandidates<'_>) -> Vec<MentionSuggestion> {
        let all = self.candidates(c);
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.sample(all);
        }

        let mut hits: Vec<MentionSuggestion> =
            all.into_iter().filter(|s| Self::matches(s, &needle)).collect();

        hits.sort_by_cached_key(|s| {
            let label = s.label.to_lowercase();
            (!label.starts_with(&needle), s.kind.priority(), label)
        });
        hits.truncate(self.result_cap);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::knowledge::index::KnowledgeIndex;
    use crate::subsystems::knowledge::registry::{Agent, Catalog, CatalogEntry};

    fn catalog() -> Catalog {
        Catalog {
            skills: vec![
                CatalogEntry::new("s1", "Summarize", "Condense text"),
                CatalogEntry::new("s2", "Translate", "Change language"),
                CatalogEntry::new("s3", "Sketch", "Draw diagrams"),
                CatalogEntry::new("s4", "Sort", "Order things"),
            ],
            tools: vec![
                CatalogEntry::new("t1", "Search", "Web lookup"),
                CatalogEntry::new("t2", "Shell", "Run commands"),
                CatalogEntry::new("t3", "Calendar", "Dates"),
            ],
            system: vec![CatalogEntry::new("assistant", "Assistant", "Built-in helper")],
        }
    }

    fn agents(n: usize) -> Vec<Agent> {
        (0..n)
            .map(|i| Agent::new(format!("a{i}"), format!("Agent{i}"), "helper"))
            .collect()
    }

    #[test]
    fn empty_query_takes_three_per_category_in_order() {
        let catalog = catalog();
        let index = KnowledgeIndex::default();
        let c = MentionCandidates {
            agents: agents(4),
            catalog: &catalog,
            documents: Vec::new(),
            index: &index,
        };
        let out = FlatRanker::default().suggest("", &c);
        let kinds: Vec<_> = out.iter().map(|s| s.kind).collect();
        assert_eq!(&kinds[..3], &[MentionKind::Agent; 3]);
        assert_eq!(&kinds[3..6], &[MentionKind::Skill; 3]);
        assert_eq!(&kinds[6..9], &[MentionKind::Tool; 3]);
        // no documents, so one backfill item tops the list up to 10
        assert_eq!(out.len(), 10);
        assert_eq!(out[9].id, "a3");
    }

    #[test]
    fn starts_with_beats_type_priority() {
        let catalog = catalog();
        let index = KnowledgeIndex::default();
        let c = MentionCandidates {
            agents: agents(2),
            catalog: &catalog,
            documents: Vec::new(),
            index: &index,
        };
        let out = FlatRanker::default().suggest("s", &c);
        // every label containing "s" passes; "skill/..." labels start with "s"
        assert_eq!(out[0].kind, MentionKind::Skill);
        assert!(out.iter().take(4).all(|s| s.kind == MentionKind::Skill));
        // within starts-with group, alphabetical by label
        let labels: Vec<_> = out.iter().take(4).map(|s| s.label.clone()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn path_segments_match() {
        let catalog = catalog();
        let index = KnowledgeIndex::default();
        let c = MentionCandidates {
            agents: agents(1),
            catalog: &catalog,
            documents: Vec::new(),
            index: &index,
        };
        let out = FlatRanker::default().suggest("t2", &c);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path, "@tool/t2");
    }

    #[test]
    fn no_match_is_empty_even_with_candidates() {
        let catalog = catalog();
        let index = KnowledgeIndex::default();
        let c = MentionCandidates {
            agents: agents(3),
            catalog: &catalog,
            documents: Vec::new(),
            index: &index,
        };
        assert!(FlatRanker::default().suggest("zzzz", &c).is_empty());
    }

    #[test]
    fn results_are_capped() {
        let catalog = catalog();
        let index = KnowledgeIndex::default();
        let c = MentionCandidates {
            agents: agents(30),
            catalog: &catalog,
            documents: Vec::new(),
            index: &index,
        };
        assert_eq!(FlatRanker::default().suggest("agent", &c).len(), 15);
    }
}
