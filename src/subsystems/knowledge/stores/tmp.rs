//! `tmp` store — ephemeral in-memory document store.
//!
//! Everything lives in process memory and is discarded with the store. Used by
//! tests and by `store = "tmp"` in config.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;

use super::super::store::DocumentStore;
use super::super::types::{DocumentVersion, KnowledgeDocument};

#[derive(Default)]
struct TmpData {
    documents: HashMap<String, KnowledgeDocument>,
    /// document_id -> snapshots in insertion order
    versions: HashMap<String, Vec<DocumentVersion>>,
}

#[derive(Default)]
pub struct TmpStore {
    data: Mutex<TmpData>,
}

impl TmpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, TmpData>, AppError> {
        self.data
            .lock()
            .map_err(|_| AppError::Store("tmp store lock poisoned".into()))
    }
}

impl DocumentStore for TmpStore {
    fn store_type(&self) -> &str {
        "tmp"
    }

    fn get_document(&self, id: &str) -> Result<Option<KnowledgeDocument>, AppError> {
        Ok(self.lock()?.documents.get(id).cloned())
    }

    fn save_document(&self, doc: &KnowledgeDocument) -> Result<(), AppError> {
        self.lock()?.documents.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    fn delete_document(&self, id: &str) -> Result<(), AppError> {
        self.lock()?.documents.remove(id);
        Ok(())
    }

    fn all_documents(&self) -> Result<Vec<KnowledgeDocument>, AppError> {
        Ok(self.lock()?.documents.values().cloned().collect())
    }

    fn save_version(&self, version: &DocumentVersion) -> Result<(), AppError> {
        self.lock()?
            .versions
            .entry(version.document_id.clone())
            .or_default()
            .push(version.clone());
        Ok(())
    }

    fn version_history(&self, document_id: &str) -> Result<Vec<DocumentVersion>, AppError> {
        let mut history = self
            .lock()?
            .versions
            .get(document_id)
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(history)
    }

    fn delete_versions(&self, document_id: &str) -> Result<(), AppError> {
        self.lock()?.versions.remove(document_id);
        Ok(())
    }
}
