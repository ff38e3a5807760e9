//! Knowledge subsystem — versioned documents with `@` references, full-text
//! search and mention suggestions.
//!
//! [`KnowledgeService`] is the entry point. It owns a [`DocumentStore`]
//! backend, the in-memory [`KnowledgeIndex`], a small MRU [`DocumentCache`]
//! and a read-only [`Registry`] of agents and skill/tool catalogs.
//!
//! With the SQLite backend the store lives under the configured work dir:
//!
//! ```text
//! {work_dir}/
//! └── knowledge/
//!     └── knowledge.db
//! ```

pub mod cache;
pub mod index;
pub mod mention;
pub mod references;
pub mod registry;
pub mod service;
pub mod store;
pub mod stores;
pub mod types;

pub use cache::DocumentCache;
pub use index::KnowledgeIndex;
pub use references::extract_references;
pub use registry::{Agent, AgentRegistry, Catalog, CatalogEntry, Registry, StaticAgentRegistry};
pub use service::{KnowledgeService, ServiceOptions};
pub use store::DocumentStore;
pub use types::{
    DocumentReference, DocumentType, DocumentUpdate, DocumentVersion, KnowledgeDocument,
    MentionKind, MentionSuggestion, PublishingStatus, ReferenceType, SearchResult,
};
