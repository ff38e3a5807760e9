//! Document store trait — the persistence boundary of the knowledge subsystem.
//!
//! Stores are `Send + Sync` and use blocking I/O. The
//! [`KnowledgeService`](super::service::KnowledgeService) dispatches every call
//! through `spawn_blocking`, so implementations never need to be async.
//! Authoritative document state always lives here; the index and cache are
//! projections of it.

use crate::error::AppError;

use super::types::{DocumentType, DocumentVersion, KnowledgeDocument};

pub trait DocumentStore: Send + Sync {
    /// Unique backend name (e.g. `"sqlite"`).
    fn store_type(&self) -> &str;

    fn get_document(&self, id: &str) -> Result<Option<KnowledgeDocument>, AppError>;

    /// Upsert keyed by `doc.id`.
    fn save_document(&self, doc: &KnowledgeDocument) -> Result<(), AppError>;

    /// Removing an absent id is not an error.
    fn delete_document(&self, id: &str) -> Result<(), AppError>;

    /// Unordered snapshot of every document.
    fn all_documents(&self) -> Result<Vec<KnowledgeDocument>, AppError>;

    fn documents_by_type(&self, doc_type: DocumentType) -> Result<Vec<KnowledgeDocument>, AppError> {
        Ok(self
            .all_documents()?
            .into_iter()
            .filter(|d| d.doc_type == doc_type)
            .collect())
    }

    fn documents_by_tag(&self, tag: &str) -> Result<Vec<KnowledgeDocument>, AppError> {
        Ok(self
            .all_documents()?
            .into_iter()
            .filter(|d| d.metadata.tags.contains(tag))
            .collect())
    }

    fn save_version(&self, version: &DocumentVersion) -> Result<(), AppError>;

    /// Snapshots for `document_id`, highest version first.
    fn version_history(&self, document_id: &str) -> Result<Vec<DocumentVersion>, AppError>;

    fn get_version(
        &self,
        document_id: &str,
        version_id: &str,
    ) -> Result<Option<DocumentVersion>, AppError> {
        Ok(self
            .version_history(document_id)?
            .into_iter()
            .find(|v| v.id == version_id))
    }

    /// Drop every snapshot of `document_id`.
    fn delete_versions(&self, document_id: &str) -> Result<(), AppError>;
}
