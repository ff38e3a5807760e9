//! `sqlite` store — durable document + version store backed by SQLite.
//!
//! ## Storage layout
//! ```text
//! {work_dir}/
//! └── knowledge/
//!     └── knowledge.db
//! ```
//!
//! Documents and snapshots are stored as JSON payload rows. `doc_type` and the
//! `document_tags` table are denormalised from the payload so type and tag
//! lookups stay in SQL.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::AppError;

use super::super::store::DocumentStore;
use super::super::types::{DocumentType, DocumentVersion, KnowledgeDocument};

const KNOWLEDGE_DIR: &str = "knowledge";
const DB_FILENAME: &str = "knowledge.db";

/// Stored in `PRAGMA user_version`. Bump when the DDL changes.
const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Clone)]
pub struct SqliteStore {
    dir: PathBuf,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create or open the store under `{work_dir}/knowledge/`.
    pub fn open(work_dir: &Path) -> Result<Self, AppError> {
        let dir = work_dir.join(KNOWLEDGE_DIR);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Store(format!("sqlite: cannot create {}: {e}", dir.display()))
        })?;

        let store = Self {
            db_path: dir.join(DB_FILENAME),
            dir,
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn root_dir(&self) -> &Path {
        &self.dir
    }

    fn init_db(&self) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        let version: i64 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .map_err(|e| AppError::Store(format!("sqlite: read schema version: {e}")))?;

        if version == 0 {
            conn.execute_batch(
                "
                CREATE TABLE IF NOT EXISTS documents (
                    doc_id TEXT PRIMARY KEY,
                    doc_type TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS document_tags (
                    doc_id TEXT NOT NULL REFERENCES documents(doc_id) ON DELETE CASCADE,
                    tag TEXT NOT NULL,
                    PRIMARY KEY (doc_id, tag)
                );
                CREATE INDEX IF NOT EXISTS idx_document_tags_tag ON document_tags(tag);

                CREATE TABLE IF NOT EXISTS versions (
                    id TEXT PRIMARY KEY,
                    doc_id TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_versions_doc ON versions(doc_id, version);

                PRAGMA user_version = 1;
                ",
            )
            .map_err(|e| AppError::Store(format!("sqlite: initialize schema: {e}")))?;
            return Ok(());
        }

        if version != SCHEMA_VERSION {
            return Err(AppError::Store(format!(
                "sqlite: unsupported schema version {version}, expected {SCHEMA_VERSION}"
            )));
        }
        Ok(())
    }

    /// WAL + foreign keys + 5 s busy timeout.
    fn open_conn(&self) -> Result<Connection, AppError> {
        let conn = Connection::open(&self.db_path).map_err(|e| {
            AppError::Store(format!("sqlite: open {}: {e}", self.db_path.display()))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AppError::Store(format!("sqlite: set journal_mode WAL: {e}")))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| AppError::Store(format!("sqlite: set foreign_keys ON: {e}")))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| AppError::Store(format!("sqlite: set busy_timeout: {e}")))?;

        Ok(conn)
    }

    fn query_documents(
        &self,
        sql: &str,
        param: Option<&str>,
    ) -> Result<Vec<KnowledgeDocument>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| AppError::Store(format!("sqlite: prepare document query: {e}")))?;

        let mut rows = match param {
            Some(p) => stmt.query(params![p]),
            None => stmt.query([]),
        }
        .map_err(|e| AppError::Store(format!("sqlite: execute document query: {e}")))?;

        let mut docs = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| AppError::Store(format!("sqlite: read document row: {e}")))?
        {
            let payload: String = row
                .get(0)
                .map_err(|e| AppError::Store(format!("sqlite: decode document row: {e}")))?;
            docs.push(decode_document(&payload)?);
        }
        Ok(docs)
    }
}

impl DocumentStore for SqliteStore {
    fn store_type(&self) -> &str {
        "sqlite"
    }

    fn get_document(&self, id: &str) -> Result<Option<KnowledgeDocument>, AppError> {
        let conn = self.open_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM documents WHERE doc_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Store(format!("sqlite: get_document {id}: {e}")))?;

        payload.as_deref().map(decode_document).transpose()
    }

    fn save_document(&self, doc: &KnowledgeDocument) -> Result<(), AppError> {
        let payload = serde_json::to_string(doc)
            .map_err(|e| AppError::Store(format!("sqlite: serialize document {}: {e}", doc.id)))?;

        let mut conn = self.open_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("sqlite: begin save tx: {e}")))?;

        tx.execute(
            "INSERT INTO documents (doc_id, doc_type, created_at, updated_at, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(doc_id) DO UPDATE SET
                doc_type = excluded.doc_type,
                updated_at = excluded.updated_at,
                payload = excluded.payload",
            params![
                doc.id,
                doc.doc_type.as_str(),
                doc.metadata.created.to_rfc3339_opts(SecondsFormat::Millis, true),
                doc.metadata.modified.to_rfc3339_opts(SecondsFormat::Millis, true),
                payload,
            ],
        )
        .map_err(|e| AppError::Store(format!("sqlite: upsert document {}: {e}", doc.id)))?;

        tx.execute("DELETE FROM document_tags WHERE doc_id = ?1", params![doc.id])
            .map_err(|e| AppError::Store(format!("sqlite: clear tags for {}: {e}", doc.id)))?;
        for tag in &doc.metadata.tags {
            tx.execute(
                "INSERT INTO document_tags (doc_id, tag) VALUES (?1, ?2)",
                params![doc.id, tag],
            )
            .map_err(|e| AppError::Store(format!("sqlite: insert tag for {}: {e}", doc.id)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("sqlite: commit save tx: {e}")))
    }

    fn delete_document(&self, id: &str) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        conn.execute("DELETE FROM documents WHERE doc_id = ?1", params![id])
            .map_err(|e| AppError::Store(format!("sqlite: delete document {id}: {e}")))?;
        Ok(())
    }

    fn all_documents(&self) -> Result<Vec<KnowledgeDocument>, AppError> {
        self.query_documents("SELECT payload FROM documents", None)
    }

    fn documents_by_type(&self, doc_type: DocumentType) -> Result<Vec<KnowledgeDocument>, AppError> {
        self.query_documents(
            "SELECT payload FROM documents WHERE doc_type = ?1",
            Some(doc_type.as_str()),
        )
    }

    fn documents_by_tag(&self, tag: &str) -> Result<Vec<KnowledgeDocument>, AppError> {
        self.query_documents(
            "SELECT documents.payload FROM documents
             JOIN document_tags ON document_tags.doc_id = documents.doc_id
             WHERE document_tags.tag = ?1",
            Some(tag),
        )
    }

    fn save_version(&self, version: &DocumentVersion) -> Result<(), AppError> {
        let payload = serde_json::to_string(version)
            .map_err(|e| AppError::Store(format!("sqlite: serialize version: {e}")))?;
        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO versions (id, doc_id, version, created_at, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                version.id,
                version.document_id,
                version.version as i64,
                version.created.to_rfc3339_opts(SecondsFormat::Millis, true),
                payload,
            ],
        )
        .map_err(|e| AppError::Store(format!("sqlite: insert version: {e}")))?;
        Ok(())
    }

    fn version_history(&self, document_id: &str) -> Result<Vec<DocumentVersion>, AppError> {
        let conn = self.open_conn()?;
        let mut stmt = conn
            .prepare("SELECT payload FROM versions WHERE doc_id = ?1 ORDER BY version DESC")
            .map_err(|e| AppError::Store(format!("sqlite: prepare version_history: {e}")))?;

        let rows = stmt
            .query_map(params![document_id], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::Store(format!("sqlite: query version_history: {e}")))?;

        let mut history = Vec::new();
        for row in rows {
            let payload =
                row.map_err(|e| AppError::Store(format!("sqlite: map version row: {e}")))?;
            history.push(decode_version(&payload)?);
        }
        Ok(history)
    }

    fn get_version(
        &self,
        document_id: &str,
        version_id: &str,
    ) -> Result<Option<DocumentVersion>, AppError> {
        let conn = self.open_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM versions WHERE doc_id = ?1 AND id = ?2",
                params![document_id, version_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Store(format!("sqlite: get_version {version_id}: {e}")))?;

        payload.as_deref().map(decode_version).transpose()
    }

    fn delete_versions(&self, document_id: &str) -> Result<(), AppError> {
        let conn = self.open_conn()?;
        conn.execute("DELETE FROM versions WHERE doc_id = ?1", params![document_id])
            .map_err(|e| AppError::Store(format!("sqlite: delete versions for {document_id}: {e}")))?;
        Ok(())
    }
}

fn decode_document(payload: &str) -> Result<KnowledgeDocument, AppError> {
    serde_json::from_str(payload)
        .map_err(|e| AppError::Store(format!("sqlite: malformed document payload: {e}")))
}

fn decode_version(payload: &str) -> Result<DocumentVersion, AppError> {
    serde_json::from_str(payload)
        .map_err(|e| AppError::Store(format!("sqlite: malformed version payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::knowledge::types::{DocumentMetadata, Permissions, PublishingStatus};
    use chrono::Utc;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().expect("tempdir");
        let store = SqliteStore::open(temp.path()).expect("open sqlite store");
        (temp, store)
    }

    fn doc(id: &str, tags: &[&str]) -> KnowledgeDocument {
        KnowledgeDocument {
            id: id.into(),
            title: "Title".into(),
            content: "body".into(),
            doc_type: DocumentType::Guide,
            metadata: DocumentMetadata {
                author: "alice".into(),
                created: Utc::now(),
                modified: Utc::now(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                references: Vec::new(),
                referenced_by: BTreeSet::new(),
                version: 1,
                size: Some(4),
            },
            permissions: Permissions::owned_by("alice"),
            publishing_status: PublishingStatus::Draft,
            embedding: None,
        }
    }

    #[test]
    fn open_creates_db_file() {
        let (_temp, store) = make_store();
        assert!(store.root_dir().join(DB_FILENAME).exists());
    }

    #[test]
    fn reopen_keeps_schema() {
        let (temp, store) = make_store();
        store.save_document(&doc("a", &[])).expect("save");
        let reopened = SqliteStore::open(temp.path()).expect("reopen");
        assert!(reopened.get_document("a").expect("get").is_some());
    }

    #[test]
    fn upsert_replaces_tags() {
        let (_temp, store) = make_store();
        let mut d = doc("a", &["finance", "hr"]);
        store.save_document(&d).expect("save");
        assert_eq!(store.documents_by_tag("hr").expect("by tag").len(), 1);

        d.metadata.tags = BTreeSet::from(["finance".to_string()]);
        store.save_document(&d).expect("resave");
        assert!(store.documents_by_tag("hr").expect("by tag").is_empty());
        assert_eq!(store.all_documents().expect("all").len(), 1);
    }

    #[test]
    fn delete_cascades_tags() {
        let (_temp, store) = make_store();
        store.save_document(&doc("a", &["finance"])).expect("save");
        store.delete_document("a").expect("delete");
        assert!(store.get_document("a").expect("get").is_none());
        assert!(store.documents_by_tag("finance").expect("by tag").is_empty());
    }
}
