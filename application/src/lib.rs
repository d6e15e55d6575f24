use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Author, AuthorMatch, Document, DocumentId, DomainError, SearchRequest};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Infrastructure error: {0}")]
    InfrastructureError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Domain validation error: {0}")]
    DomainError(#[from] DomainError), // Propagate domain errors cleanly
}

// --- Configuration ---

/// Environment variable selecting the author rule used by the dedup scan.
pub const AUTHOR_MATCH_ENV: &str = "DOCSTORE_AUTHOR_MATCH";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default)]
    pub author_match: AuthorMatch,
}

impl StoreConfig {
    /// Reads the configuration from the environment, falling back to the
    /// defaults (with a warning) when a value cannot be used.
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Invalid {} value: {}. Using default author match '{}'.",
                    AUTHOR_MATCH_ENV,
                    e,
                    AuthorMatch::default()
                );
                Self::default()
            }
        }
    }

    pub fn try_from_env() -> Result<Self, ApplicationError> {
        Self::from_lookup(env::var(AUTHOR_MATCH_ENV))
    }

    fn from_lookup(value: Result<String, env::VarError>) -> Result<Self, ApplicationError> {
        match value {
            Ok(raw) => {
                let author_match = raw.parse::<AuthorMatch>()?;
                info!(
                    "Using author match '{}' from environment variable {}.",
                    author_match, AUTHOR_MATCH_ENV
                );
                Ok(Self { author_match })
            }
            Err(env::VarError::NotPresent) => {
                info!(
                    "{} environment variable not set. Using default author match '{}'.",
                    AUTHOR_MATCH_ENV,
                    AuthorMatch::default()
                );
                Ok(Self::default())
            }
            Err(env::VarError::NotUnicode(_)) => Err(ApplicationError::Config(format!(
                "{} is not valid unicode",
                AUTHOR_MATCH_ENV
            ))),
        }
    }
}

// --- Shared document records ---

/// Live reference to a stored document. Clones share the same record, so a
/// write through any handle is visible to every later read of the store.
///
/// The lock is only taken inside [`with`](Self::with) / [`update`](Self::update)
/// and the owned getters; no guard ever outlives the call.
#[derive(Debug, Clone)]
pub struct DocumentHandle(Arc<RwLock<Document>>);

impl DocumentHandle {
    pub fn new(document: Document) -> Self {
        Self(Arc::new(RwLock::new(document)))
    }

    /// Runs `f` against the current state of the record.
    pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&*self.0.read())
    }

    /// Runs `f` with mutable access to the record.
    pub fn update<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut *self.0.write())
    }

    pub fn title(&self) -> String {
        self.with(|doc| doc.title().to_string())
    }

    pub fn content(&self) -> String {
        self.with(|doc| doc.content().to_string())
    }

    pub fn author(&self) -> Author {
        self.with(|doc| doc.author().clone())
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.with(Document::created)
    }

    /// Detached copy of the current state.
    pub fn snapshot(&self) -> Document {
        self.0.read().clone()
    }

    pub fn id(&self) -> Option<DocumentId> {
        self.0.read().id().cloned()
    }

    /// True when both handles point at the same stored record.
    pub fn ptr_eq(&self, other: &DocumentHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// --- Infrastructure Interfaces (Traits) ---

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Ordered storage for documents. Insertion order is preserved and nothing is
/// ever removed.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Appends a document after every stored one and returns its handle.
    async fn append(&self, document: Document) -> Result<DocumentHandle, ApplicationError>;
    /// Returns handles to every stored document in insertion order.
    async fn list(&self) -> Result<Vec<DocumentHandle>, ApplicationError>;
    /// Number of stored documents.
    async fn count(&self) -> Result<usize, ApplicationError>;
    /// Returns the first stored document accepted by `predicate`.
    async fn find_first(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Document) -> bool + Send + Sync),
    ) -> Result<Option<DocumentHandle>, ApplicationError> {
        // Simple default: scan a snapshot of the sequence
        let documents = self.list().await?;
        Ok(documents
            .into_iter()
            .find(|handle| handle.with(|doc| predicate(doc))))
    }
}

// --- Application Services (Use Cases) ---

/// Upsert, lookup-by-id and multi-criteria search over a document repository.
pub struct DocumentStore {
    repository: Arc<dyn DocumentRepository>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    // Held across the dedup scan and the write that follows it
    save_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        clock: Arc<dyn Clock>,
        config: StoreConfig,
    ) -> Self {
        Self {
            repository,
            clock,
            config,
            save_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Upserts a document.
    ///
    /// The first stored document with the same content (and a compatible
    /// author under the configured [`AuthorMatch`]) takes over the incoming
    /// id and title and is returned; its content, author and creation time
    /// stay as they were. Otherwise the incoming document is stamped with the
    /// current time and appended. A missing or blank id is replaced by a
    /// fresh UUID either way. `None` is a no-op that returns `None`.
    #[instrument(skip(self, document))]
    pub async fn save(
        &self,
        document: Option<Document>,
    ) -> Result<Option<DocumentHandle>, ApplicationError> {
        let Some(mut document) = document else {
            debug!("Save called without a document, nothing stored");
            return Ok(None);
        };

        let _guard = self.save_lock.lock().await;

        let author_match = self.config.author_match;
        let existing = self
            .repository
            .find_first(&|stored: &Document| stored.merges_with(&document, author_match))
            .await?;

        let id = match document.id() {
            Some(id) if !id.is_blank() => id.clone(),
            _ => {
                let generated = DocumentId::new(Uuid::new_v4().to_string());
                debug!(doc_id = %generated, "Generated id for document");
                generated
            }
        };
        document.set_id(id.clone());

        match existing {
            Some(handle) => {
                handle.update(|stored| {
                    stored.set_id(id.clone());
                    stored.set_title(document.title());
                });
                info!(doc_id = %id, author_match = %author_match, "Merged document into existing record with identical content");
                Ok(Some(handle))
            }
            None => {
                let created = self.clock.now();
                document.set_created(created);
                let handle = self.repository.append(document).await?;
                info!(doc_id = %id, created = %created, "Inserted new document");
                Ok(Some(handle))
            }
        }
    }

    /// Every stored document passing all filters of `request`, in insertion
    /// order. `None` yields no documents.
    #[instrument(skip(self, request))]
    pub async fn search(
        &self,
        request: Option<&SearchRequest>,
    ) -> Result<Vec<DocumentHandle>, ApplicationError> {
        let Some(request) = request else {
            debug!("Search called without a request, returning no documents");
            return Ok(Vec::new());
        };

        let documents = self.repository.list().await?;
        let scanned = documents.len();
        let hits: Vec<DocumentHandle> = documents
            .into_iter()
            .filter(|handle| handle.with(|doc| request.matches(doc)))
            .collect();

        debug!(scanned, hits = hits.len(), "Search finished");
        Ok(hits)
    }

    /// First stored document whose id equals `id` exactly. Missing or blank
    /// ids are never found.
    #[instrument(skip(self))]
    pub async fn find_by_id(
        &self,
        id: Option<&str>,
    ) -> Result<Option<DocumentHandle>, ApplicationError> {
        let Some(id) = id.filter(|id| !id.trim().is_empty()) else {
            debug!("Lookup called with a blank id");
            return Ok(None);
        };

        let found = self
            .repository
            .find_first(&|stored: &Document| stored.id().is_some_and(|doc_id| doc_id.as_str() == id))
            .await?;
        debug!(found = found.is_some(), "Lookup finished");
        Ok(found)
    }

    pub async fn len(&self) -> Result<usize, ApplicationError> {
        self.repository.count().await
    }

    pub async fn is_empty(&self) -> Result<bool, ApplicationError> {
        Ok(self.len().await? == 0)
    }
}
