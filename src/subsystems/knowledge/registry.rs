//! Read-only entity registries consumed by mention suggestions and reference
//! resolution: agents (owned by the agents subsystem, surfaced through
//! [`AgentRegistry`]) and the static skill/tool catalogs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            icon: None,
            color: None,
            enabled: true,
        }
    }
}

pub trait AgentRegistry: Send + Sync {
    fn all_agents(&self) -> Vec<Agent>;
}

/// Fixed agent list, typically built from `[agents.<id>]` config sections.
#[derive(Debug, Clone, Default)]
pub struct StaticAgentRegistry {
    agents: Vec<Agent>,
}

impl StaticAgentRegistry {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// Keeps only agents with `enabled = true`; disabled ones are not mentionable.
    pub fn enabled(agents: Vec<Agent>) -> Self {
        Self::new(agents.into_iter().filter(|a| a.enabled).collect())
    }
}

impl AgentRegistry for StaticAgentRegistry {
    fn all_agents(&self) -> Vec<Agent> {
        self.agents.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl CatalogEntry {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

const BUILTIN_SKILLS: &[(&str, &str, &str)] = &[
    ("summarize", "Summarize", "Condense long text into key points"),
    ("translate", "Translate", "Translate text between languages"),
    ("extract-data", "Extract Data", "Pull structured fields out of documents"),
    ("code-review", "Code Review", "Review code for defects and style"),
    ("write-report", "Write Report", "Draft a report from notes and sources"),
];

const BUILTIN_TOOLS: &[(&str, &str, &str)] = &[
    ("web-search", "Web Search", "Search the web for current information"),
    ("calculator", "Calculator", "Evaluate arithmetic expressions"),
    ("file-reader", "File Reader", "Read the contents of uploaded files"),
    ("code-interpreter", "Code Interpreter", "Run code in a sandbox"),
    ("calendar", "Calendar", "Look up and schedule events"),
];

const SYSTEM_ENTRIES: &[(&str, &str, &str)] = &[
    ("assistant", "Assistant", "Ask the built-in Seamstress assistant"),
    ("workspace", "Workspace", "Refer to the current workspace"),
];

fn entries(raw: &[(&str, &str, &str)]) -> Vec<CatalogEntry> {
    raw.iter()
        .map(|(id, name, description)| CatalogEntry::new(id, name, description))
        .collect()
}

/// Skill, tool and system catalogs.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub skills: Vec<CatalogEntry>,
    pub tools: Vec<CatalogEntry>,
    /// `@seamstress/...` entries.
    pub system: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            skills: entries(BUILTIN_SKILLS),
            tools: entries(BUILTIN_TOOLS),
            system: entries(SYSTEM_ENTRIES),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Everything the knowledge service reads but does not own.
#[derive(Clone)]
pub struct Registry {
    pub agents: Arc<dyn AgentRegistry>,
    pub catalog: Catalog,
}

impl Registry {
    pub fn new(agents: Arc<dyn AgentRegistry>, catalog: Catalog) -> Self {
        Self { agents, catalog }
    }

    pub fn with_agents(agents: Vec<Agent>) -> Self {
        Self::new(Arc::new(StaticAgentRegistry::new(agents)), Catalog::builtin())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_agents(Vec::new())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("agents", &self.agents.all_agents().len())
            .field("skills", &self.catalog.skills.len())
            .field("tools", &self.catalog.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogs_are_populated() {
        let c = Catalog::builtin();
        assert!(c.skills.len() >= 3);
        assert!(c.tools.len() >= 3);
        assert!(!c.system.is_empty());
        assert!(c.skills.iter().all(|s| !s.id.contains(' ')));
    }

    #[test]
    fn static_registry_returns_agents() {
        let reg = Registry::with_agents(vec![Agent::new("planner", "Planner", "Plans work")]);
        let agents = reg.agents.all_agents();
        assert_eq!(agents.len(), 1);
        assert!(agents[0].enabled);
    }

    #[test]
    fn disabled_agents_are_dropped() {
        let mut archivist = Agent::new("archivist", "Archivist", "Retired");
        archivist.enabled = false;
        let reg = StaticAgentRegistry::enabled(vec![
            archivist,
            Agent::new("planner", "Planner", "Plans work"),
        ]);
        let ids: Vec<_> = reg.all_agents().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["planner"]);
    }
}
