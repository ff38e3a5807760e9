//! [`KnowledgeService`] — document lifecycle orchestration.
//!
//! Every mutation follows the same sequence under the service write lock:
//! load from the store, check permissions, extract references, persist,
//! re-index, snapshot, refresh the cache, then reconcile back-references on
//! the documents this one points at. Store calls run on the blocking pool.
//!
//! The lock is shared by every handle produced with
//! [`KnowledgeService::as_user`], so at most one mutation touches the store and
//! index at a time. A cache-miss read holds it shared across load-and-cache, so
//! a completed mutation is never overwritten by an older copy. Cache hits,
//! search and mentions do not take it.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::{debug, info, warn};

use crate::config::{Config, StoreBackend};
use crate::error::AppError;

use super::cache::DocumentCache;
use super::index::KnowledgeIndex;
use super::mention::{FlatRanker, MentionCandidates, MentionSource, PrefixDispatch};
use super::references::extract_references;
use super::registry::Registry;
use super::store::DocumentStore;
use super::stores::tmp::TmpStore;
use super::types::{
    DocumentMetadata, DocumentReference, DocumentType, DocumentUpdate, DocumentVersion,
    IndexStats, KnowledgeDocument, MentionSuggestion, Permissions, PublishingStatus,
    ReferenceType, SearchResult,
};

/// Largest file accepted by [`KnowledgeService::import_file`].
pub const MAX_IMPORT_BYTES: u64 = 2_000_000;

const IMPORT_EXTENSIONS: &[&str] = &["md", "txt"];

/// Tunables for a service instance.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Acting user: owner/author of created documents, subject of permission checks.
    pub user: String,
    pub cache_capacity: usize,
    pub content_token_cap: usize,
    pub prefix_dispatch: PrefixDispatch,
    pub flat_ranker: FlatRanker,
}

impl ServiceOptions {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            user: config.user.clone(),
            cache_capacity: config.cache_capacity,
            content_token_cap: config.content_token_cap,
            prefix_dispatch: PrefixDispatch {
                document_limit: config.mentions.flat_document_cap,
            },
            flat_ranker: FlatRanker {
                document_cap: config.mentions.flat_document_cap,
                per_category: config.mentions.per_category,
                empty_query_fill: config.mentions.empty_query_fill,
                result_cap: config.mentions.flat_result_cap,
            },
        }
    }
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            user: "local".to_string(),
            cache_capacity: super::cache::DEFAULT_CACHE_CAPACITY,
            content_token_cap: super::index::DEFAULT_CONTENT_TOKEN_CAP,
            prefix_dispatch: PrefixDispatch::default(),
            flat_ranker: FlatRanker::default(),
        }
    }
}

#[derive(Clone)]
pub struct KnowledgeService {
    user: String,
    store: Arc<dyn DocumentStore>,
    index: Arc<KnowledgeIndex>,
    cache: Arc<Mutex<DocumentCache>>,
    write_lock: Arc<AsyncRwLock<()>>,
    registry: Registry,
    prefix_dispatch: PrefixDispatch,
    flat_ranker: FlatRanker,
}

impl std::fmt::Debug for KnowledgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeService")
            .field("user", &self.user)
            .field("store", &self.store.store_type())
            .field("indexed", &self.index.len())
            .finish()
    }
}

impl KnowledgeService {
    /// Wire a service around an explicit store. The index starts empty; call
    /// [`rebuild_index`](Self::rebuild_index) when the store already has data.
    pub fn new(store: Arc<dyn DocumentStore>, registry: Registry, options: ServiceOptions) -> Self {
        Self {
            user: options.user,
            store,
            index: Arc::new(KnowledgeIndex::new(options.content_token_cap)),
            cache: Arc::new(Mutex::new(DocumentCache::new(options.cache_capacity))),
            write_lock: Arc::new(AsyncRwLock::new(())),
            registry,
            prefix_dispatch: options.prefix_dispatch,
            flat_ranker: options.flat_ranker,
        }
    }

    /// Open the configured store and rebuild the index from it.
    pub async fn open(config: &Config, registry: Registry) -> Result<Self, AppError> {
        let store: Arc<dyn DocumentStore> = match config.store {
            StoreBackend::Tmp => Arc::new(TmpStore::new()),
            #[cfg(feature = "isqlite")]
            StoreBackend::Sqlite => {
                let work_dir = config.work_dir.clone();
                let store = tokio::task::spawn_blocking(move || {
                    super::stores::sqlite::SqliteStore::open(&work_dir)
                })
                .await
                .map_err(|e| AppError::Store(format!("open store join: {e}")))??;
                Arc::new(store)
            }
            #[cfg(not(feature = "isqlite"))]
            StoreBackend::Sqlite => {
                return Err(AppError::Config(
                    "store = \"sqlite\" requires the `isqlite` feature".into(),
                ));
            }
        };

        let service = Self::new(store, registry, ServiceOptions::from_config(config));
        let indexed = service.rebuild_index().await?;
        info!(
            store = service.store.store_type(),
            user = %service.user,
            indexed,
            "knowledge service opened"
        );
        Ok(service)
    }

    /// Release the service. Store handles close when the last clone drops.
    pub fn close(self) {
        info!(
            store = self.store.store_type(),
            indexed = self.index.len(),
            "knowledge service closed"
        );
    }

    /// Handle acting as `user`, sharing store, index, cache and write lock.
    pub fn as_user(&self, user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..self.clone()
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    /// Cached ids, most recently used first.
    pub fn cached_ids(&self) -> Vec<String> {
        self.cache().ids()
    }

    /// Re-index every stored document, oldest first. Returns the count.
    pub async fn rebuild_index(&self) -> Result<usize, AppError> {
        let mut docs = self.blocking("all_documents", |s| s.all_documents()).await?;
        docs.sort_by(|a, b| {
            a.metadata
                .created
                .cmp(&b.metadata.created)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.index.rebuild(&docs);
        Ok(docs.len())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────

    pub async fn create_document(
        &self,
        title: &str,
        content: &str,
        doc_type: DocumentType,
        tags: Vec<String>,
    ) -> Result<KnowledgeDocument, AppError> {
        let _guard = self.write_lock.write().await;

        let now = Utc::now();
        let doc = KnowledgeDocument {
            id: uuid::Uuid::now_v7().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            doc_type,
            metadata: DocumentMetadata {
                author: self.user.clone(),
                created: now,
                modified: now,
                tags: normalise_tags(tags),
                references: extract_references(content),
                referenced_by: BTreeSet::new(),
                version: 1,
                size: Some(content.len() as u64),
            },
            permissions: Permissions::owned_by(&self.user),
            publishing_status: PublishingStatus::Draft,
            embedding: None,
        };

        self.persist(&doc).await?;
        self.index.index_document(&doc);
        self.snapshot(&doc).await?;
        self.cache().put(doc.clone());
        self.sync_back_references(&doc.id, &BTreeSet::new(), &doc.knowledge_targets())
            .await?;

        info!(
            doc_id = %doc.id,
            doc_type = %doc.doc_type,
            references = doc.metadata.references.len(),
            "document created"
        );
        Ok(doc)
    }

    pub async fn update_document(
        &self,
        id: &str,
        updates: DocumentUpdate,
    ) -> Result<KnowledgeDocument, AppError> {
        let _guard = self.write_lock.write().await;

        let mut doc = self.load(id).await?;
        if !doc.permissions.can_edit(&self.user) {
            return Err(self.denied("edit", id));
        }
        if let Some(expected) = updates.expected_version {
            if expected != doc.metadata.version {
                return Err(AppError::Conflict {
                    document_id: id.to_string(),
                    expected,
                    actual: doc.metadata.version,
                });
            }
        }

        let before = doc.knowledge_targets();
        if let Some(title) = updates.title {
            doc.title = title;
        }
        if let Some(tags) = updates.tags {
            doc.metadata.tags = normalise_tags(tags);
        }
        if let Some(content) = updates.content {
            if content != doc.content {
                doc.metadata.references = extract_references(&content);
                doc.metadata.size = Some(content.len() as u64);
                doc.content = content;
            }
        }
        doc.metadata.modified = Utc::now();
        doc.metadata.version += 1;

        self.persist(&doc).await?;
        self.index.update_document(&doc);
        self.snapshot(&doc).await?;
        self.cache().put(doc.clone());
        self.sync_back_references(&doc.id, &before, &doc.knowledge_targets())
            .await?;

        info!(doc_id = %id, version = doc.metadata.version, "document updated");
        Ok(doc)
    }

    pub async fn delete_document(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.write().await;

        let doc = self.load(id).await?;
        if !doc.permissions.is_owner(&self.user) {
            return Err(self.denied("delete", id));
        }

        let owned = id.to_string();
        self.blocking("delete_document", move |s| {
            s.delete_document(&owned)?;
            s.delete_versions(&owned)
        })
        .await?;
        self.index.remove_document(id);
        self.cache().remove(id);
        self.sync_back_references(id, &doc.knowledge_targets(), &BTreeSet::new())
            .await?;

        info!(doc_id = %id, "document deleted");
        Ok(())
    }

    pub async fn publish_document(&self, id: &str) -> Result<KnowledgeDocument, AppError> {
        self.set_status(id, PublishingStatus::Published, "publish").await
    }

    /// Back to draft, from either published or archived.
    pub async fn unpublish_document(&self, id: &str) -> Result<KnowledgeDocument, AppError> {
        self.set_status(id, PublishingStatus::Draft, "unpublish").await
    }

    /// Owner only.
    pub async fn archive_document(&self, id: &str) -> Result<KnowledgeDocument, AppError> {
        self.set_status(id, PublishingStatus::Archived, "archive").await
    }

    /// Grant `user` view access, and edit access when `can_edit`. Owner only.
    pub async fn share_document(
        &self,
        id: &str,
        user: &str,
        can_edit: bool,
    ) -> Result<KnowledgeDocument, AppError> {
        let _guard = self.write_lock.write().await;

        let mut doc = self.load(id).await?;
        if !doc.permissions.is_owner(&self.user) {
            return Err(self.denied("share", id));
        }
        doc.permissions.shared_with.insert(user.to_string());
        doc.permissions.viewable_by.insert(user.to_string());
        if can_edit {
            doc.permissions.editable_by.insert(user.to_string());
        }

        self.persist(&doc).await?;
        self.index.update_document(&doc);
        self.cache().put(doc.clone());
        info!(doc_id = %id, shared_with = %user, can_edit, "document shared");
        Ok(doc)
    }

    /// Re-apply a snapshot's content and tags as a new forward version,
    /// keeping the current title.
    pub async fn restore_version(
        &self,
        document_id: &str,
        version_id: &str,
    ) -> Result<KnowledgeDocument, AppError> {
        let (doc_id, ver_id) = (document_id.to_string(), version_id.to_string());
        let snapshot = self
            .blocking("get_version", move |s| s.get_version(&doc_id, &ver_id))
            .await?
            .ok_or_else(|| AppError::VersionNotFound {
                document_id: document_id.to_string(),
                version_id: version_id.to_string(),
            })?;

        let restored = self
            .update_document(
                document_id,
                DocumentUpdate {
                    title: None,
                    content: Some(snapshot.content),
                    tags: Some(snapshot.metadata.tags.into_iter().collect()),
                    expected_version: None,
                },
            )
            .await?;

        info!(
            doc_id = %document_id,
            from_version = snapshot.version,
            version = restored.metadata.version,
            "version restored"
        );
        Ok(restored)
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// Cache first, then the store. Every hit becomes most recently used.
    pub async fn get_document(&self, id: &str) -> Result<KnowledgeDocument, AppError> {
        if let Some(doc) = self.cache().get(id) {
            debug!(doc_id = %id, "cache hit");
            return Ok(doc);
        }
        debug!(doc_id = %id, "cache miss");
        let _guard = self.write_lock.read().await;
        let doc = self.load(id).await?;
        self.cache().put(doc.clone());
        Ok(doc)
    }

    pub async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>, AppError> {
        self.blocking("all_documents", |s| s.all_documents()).await
    }

    pub async fn documents_by_type(
        &self,
        doc_type: DocumentType,
    ) -> Result<Vec<KnowledgeDocument>, AppError> {
        self.blocking("documents_by_type", move |s| s.documents_by_type(doc_type))
            .await
    }

    pub async fn documents_by_tag(&self, tag: &str) -> Result<Vec<KnowledgeDocument>, AppError> {
        let tag = tag.to_string();
        self.blocking("documents_by_tag", move |s| s.documents_by_tag(&tag))
            .await
    }

    /// Snapshots, newest first. Empty for unknown or deleted ids.
    pub async fn version_history(&self, id: &str) -> Result<Vec<DocumentVersion>, AppError> {
        let id = id.to_string();
        self.blocking("version_history", move |s| s.version_history(&id))
            .await
    }

    /// Documents whose content mentions `id`.
    pub async fn backlinks(&self, id: &str) -> Result<Vec<KnowledgeDocument>, AppError> {
        let doc = self.get_document(id).await?;
        let mut out = Vec::new();
        for source in &doc.metadata.referenced_by {
            match self.index.get(source) {
                Some(d) => out.push(d),
                None => warn!(doc_id = %id, source = %source, "back-reference to unindexed document"),
            }
        }
        Ok(out)
    }

    /// The document's references with display names looked up in the agent
    /// registry, catalogs and document titles. Unknown entities keep their id.
    pub async fn resolve_references(&self, id: &str) -> Result<Vec<DocumentReference>, AppError> {
        let doc = self.get_document(id).await?;
        let agents = self.registry.agents.all_agents();
        let catalog = &self.registry.catalog;

        Ok(doc
            .metadata
            .references
            .into_iter()
            .map(|mut r| {
                let name = match r.ref_type {
                    ReferenceType::Agent => agents
                        .iter()
                        .find(|a| a.id == r.entity_id)
                        .map(|a| a.name.clone()),
                    ReferenceType::Skill => catalog
                        .skills
                        .iter()
                        .find(|e| e.id == r.entity_id)
                        .map(|e| e.name.clone()),
                    ReferenceType::Tool => catalog
                        .tools
                        .iter()
                        .find(|e| e.id == r.entity_id)
                        .map(|e| e.name.clone()),
                    ReferenceType::Knowledge => self.index.get(&r.entity_id).map(|d| d.title),
                };
                if let Some(name) = name {
                    r.entity_name = name;
                }
                r
            })
            .collect())
    }

    // ── Search & mentions ─────────────────────────────────────────────

    pub fn search_documents(&self, query: &str) -> Vec<SearchResult> {
        self.index.search(query)
    }

    pub fn get_suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.index.get_suggestions(prefix, limit)
    }

    pub fn get_stats(&self) -> IndexStats {
        self.index.get_stats()
    }

    /// Category-prefix dispatch; `query` includes the leading `@`.
    pub fn get_mention_suggestions(&self, query: &str) -> Vec<MentionSuggestion> {
        self.suggest_with(&self.prefix_dispatch, query)
    }

    /// Flat aggregate filter; `query` has the leading `@` stripped.
    pub fn get_simple_mention_suggestions(&self, query: &str) -> Vec<MentionSuggestion> {
        self.suggest_with(&self.flat_ranker, query)
    }

    fn suggest_with(&self, source: &dyn MentionSource, query: &str) -> Vec<MentionSuggestion> {
        let document_limit = self
            .flat_ranker
            .document_cap
            .max(self.prefix_dispatch.document_limit);
        let candidates = MentionCandidates {
            agents: self.registry.agents.all_agents(),
            catalog: &self.registry.catalog,
            documents: self.index.documents(document_limit),
            index: &self.index,
        };
        let out = source.suggest(query, &candidates);
        debug!(strategy = source.name(), query, results = out.len(), "mention suggestions");
        out
    }

    // ── Ingestion ─────────────────────────────────────────────────────

    /// Create a document from a `.md` / `.txt` file. The file stem becomes the
    /// title. Any read or validation failure is reported as `UploadFailed`.
    pub async fn import_file(
        &self,
        path: &Path,
        doc_type: DocumentType,
        tags: Vec<String>,
    ) -> Result<KnowledgeDocument, AppError> {
        let owned = path.to_path_buf();
        let (title, content) = tokio::task::spawn_blocking(move || read_import(&owned))
            .await
            .map_err(|e| AppError::UploadFailed(format!("import join: {e}")))?
            .inspect_err(|e| warn!(path = %path.display(), error = %e, "import rejected"))?;

        self.create_document(&title, &content, doc_type, tags).await
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn cache(&self) -> std::sync::MutexGuard<'_, DocumentCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn denied(&self, action: &'static str, id: &str) -> AppError {
        AppError::PermissionDenied {
            user: self.user.clone(),
            action,
            document_id: id.to_string(),
        }
    }

    async fn blocking<T, F>(&self, op: &'static str, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentStore) -> Result<T, AppError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| AppError::Store(format!("{op} join: {e}")))?
    }

    async fn load(&self, id: &str) -> Result<KnowledgeDocument, AppError> {
        let owned = id.to_string();
        self.blocking("get_document", move |s| s.get_document(&owned))
            .await?
            .ok_or_else(|| AppError::DocumentNotFound(id.to_string()))
    }

    async fn persist(&self, doc: &KnowledgeDocument) -> Result<(), AppError> {
        let doc = doc.clone();
        self.blocking("save_document", move |s| s.save_document(&doc))
            .await
    }

    async fn snapshot(&self, doc: &KnowledgeDocument) -> Result<(), AppError> {
        let version = DocumentVersion::snapshot(doc, &self.user);
        self.blocking("save_version", move |s| s.save_version(&version))
            .await
    }

    async fn set_status(
        &self,
        id: &str,
        status: PublishingStatus,
        action: &'static str,
    ) -> Result<KnowledgeDocument, AppError> {
        let _guard = self.write_lock.write().await;

        let mut doc = self.load(id).await?;
        let allowed = match status {
            PublishingStatus::Archived => doc.permissions.is_owner(&self.user),
            _ => doc.permissions.can_edit(&self.user),
        };
        if !allowed {
            return Err(self.denied(action, id));
        }
        if doc.publishing_status == status {
            return Ok(doc);
        }

        doc.publishing_status = status;
        self.persist(&doc).await?;
        self.index.update_document(&doc);
        self.cache().put(doc.clone());
        info!(doc_id = %id, status = ?status, "publishing status changed");
        Ok(doc)
    }

    /// Move `source` between the `referenced_by` sets of its old and new
    /// knowledge targets. Targets missing from the store are skipped. Callers
    /// hold the write lock.
    async fn sync_back_references(
        &self,
        source: &str,
        before: &BTreeSet<String>,
        after: &BTreeSet<String>,
    ) -> Result<(), AppError> {
        let removed = before.difference(after).map(|t| (t, false));
        let added = after.difference(before).map(|t| (t, true));

        for (target, link) in removed.chain(added) {
            if target == source {
                continue;
            }
            let owned = target.clone();
            let Some(mut doc) = self
                .blocking("get_document", move |s| s.get_document(&owned))
                .await?
            else {
                debug!(source = %source, target = %target, "dangling knowledge reference");
                continue;
            };

            let changed = if link {
                doc.metadata.referenced_by.insert(source.to_string())
            } else {
                doc.metadata.referenced_by.remove(source)
            };
            if changed {
                self.persist(&doc).await?;
                self.index.update_document(&doc);
                self.cache().put(doc);
            }
        }
        Ok(())
    }
}

fn normalise_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn read_import(path: &Path) -> Result<(String, String), AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !IMPORT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::UploadFailed(format!(
            "{}: unsupported file type '{ext}'",
            path.display()
        )));
    }

    let meta = std::fs::metadata(path)
        .map_err(|e| AppError::UploadFailed(format!("{}: {e}", path.display())))?;
    if meta.len() > MAX_IMPORT_BYTES {
        return Err(AppError::UploadFailed(format!(
            "{}: {} bytes exceeds limit of {MAX_IMPORT_BYTES}",
            path.display(),
            meta.len()
        )));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::UploadFailed(format!("{}: {e}", path.display())))?;
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();
    Ok((title, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::knowledge::registry::Agent;

    fn service() -> KnowledgeService {
        KnowledgeService::new(
            Arc::new(TmpStore::new()),
            Registry::with_agents(vec![Agent::new("planner", "Planner", "Plans")]),
            ServiceOptions::for_user("alice"),
        )
    }

    #[tokio::test]
    async fn create_sets_initial_state() {
        let svc = service();
        let doc = svc
            .create_document("Intro", "Ask @agent/planner", DocumentType::Note, vec!["a".into()])
            .await
            .unwrap();
        assert_eq!(doc.metadata.version, 1);
        assert_eq!(doc.publishing_status, PublishingStatus::Draft);
        assert_eq!(doc.permissions.owner, "alice");
        assert_eq!(doc.metadata.author, "alice");
        assert_eq!(doc.metadata.references.len(), 1);
        assert_eq!(svc.version_history(&doc.id).await.unwrap().len(), 1);
        assert!(svc.index().references_id(&doc.id));
    }

    #[tokio::test]
    async fn unchanged_content_keeps_reference_ids() {
        let svc = service();
        let doc = svc
            .create_document("T", "@tool/calculator", DocumentType::Note, vec![])
            .await
            .unwrap();
        let updated = svc
            .update_document(
                &doc.id,
                DocumentUpdate {
                    title: Some("T2".into()),
                    content: Some(doc.content.clone()),
                    ..DocumentUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.metadata.references, doc.metadata.references);
        assert_eq!(updated.title, "T2");
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let svc = service();
        let doc = svc
            .create_document("T", "v1", DocumentType::Note, vec![])
            .await
            .unwrap();
        svc.update_document(&doc.id, DocumentUpdate::content("v2"))
            .await
            .unwrap();
        let err = svc
            .update_document(
                &doc.id,
                DocumentUpdate {
                    content: Some("v3".into()),
                    expected_version: Some(1),
                    ..DocumentUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { expected: 1, actual: 2, .. }));
    }

    #[tokio::test]
    async fn publish_does_not_bump_version() {
        let svc = service();
        let doc = svc
            .create_document("T", "body", DocumentType::Note, vec![])
            .await
            .unwrap();
        let published = svc.publish_document(&doc.id).await.unwrap();
        assert_eq!(published.publishing_status, PublishingStatus::Published);
        assert_eq!(published.metadata.version, 1);
        let draft = svc.unpublish_document(&doc.id).await.unwrap();
        assert_eq!(draft.publishing_status, PublishingStatus::Draft);
    }

    #[tokio::test]
    async fn resolve_uses_registry_names() {
        let svc = service();
        let doc = svc
            .create_document(
                "T",
                "@agent/planner @tool/web-search @skill/nope",
                DocumentType::Note,
                vec![],
            )
            .await
            .unwrap();
        let refs = svc.resolve_references(&doc.id).await.unwrap();
        assert_eq!(refs[0].entity_name, "Planner");
        assert_eq!(refs[1].entity_name, "Web Search");
        assert_eq!(refs[2].entity_name, "nope");
    }

    #[test]
    fn import_rejects_unknown_extension() {
        let err = read_import(Path::new("/tmp/report.pdf")).unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        let tags = normalise_tags(vec![" hr ".into(), "hr".into(), "".into()]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["hr"]);
    }
}
