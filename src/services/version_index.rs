//! src/services/version_index.rs
//!
//! VersionIndex: the in-memory mapping from document id to the current
//! store object, plus the document operations served from it.
//!
//! The store is append-only, so the mapping is a cache that can always be
//! rebuilt from a listing. Deleting a document only drops its entry: the
//! physical objects are untouched and the next rebuild brings it back.

use crate::{
    models::{
        document::{Document, DocumentError, VersionStamp},
        entry::{DocumentEntry, DocumentSummary, RebuildReport},
    },
    services::{
        codec::{Codec, CodecError},
        ids::IdGenerator,
        reconcile::reconcile,
        store_client::{ObjectStore, StoreClientError},
    },
    timestamps::{StampClock, format_created, parse_created},
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Owner recorded on documents when no store user is configured.
pub const PUBLIC_OWNER: &str = "public";

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Store(#[from] StoreClientError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreClientError),
    #[error("document `{0}` does not exist")]
    NotFound(String),
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
    #[error("document `{id}` cannot be read: {source}")]
    ReadFailure {
        id: String,
        #[source]
        source: FailureCause,
    },
    #[error("document `{id}` cannot be saved: {source}")]
    WriteFailure {
        id: String,
        #[source]
        source: FailureCause,
    },
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Settings for one managed collection of documents.
#[derive(Clone, Debug)]
pub struct IndexSettings {
    /// Value of the `type` attribute used to list and tag objects.
    pub object_type: String,
    /// Restrict listings to this owner and record it on writes.
    pub user: Option<String>,
}

/// Lock discipline: List/Exists/Read share the mapping lock. Write, Delete
/// and Rebuild are serialized by `writer`, which Write and Rebuild hold across
/// their store call. The mapping lock is never held across a store call.
#[derive(Clone)]
pub struct VersionIndex {
    store: Arc<dyn ObjectStore>,
    codec: Arc<dyn Codec>,
    ids: Arc<dyn IdGenerator>,
    settings: Arc<IndexSettings>,
    entries: Arc<RwLock<HashMap<String, DocumentEntry>>>,
    writer: Arc<Mutex<()>>,
    clock: Arc<StampClock>,
    last_rebuild: Arc<RwLock<Option<RebuildReport>>>,
}

impl VersionIndex {
    /// Create an empty index. Call [`VersionIndex::rebuild`] to populate it.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        codec: Arc<dyn Codec>,
        ids: Arc<dyn IdGenerator>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            store,
            codec,
            ids,
            settings: Arc::new(settings),
            entries: Arc::new(RwLock::new(HashMap::new())),
            writer: Arc::new(Mutex::new(())),
            clock: Arc::new(StampClock::new()),
            last_rebuild: Arc::new(RwLock::new(None)),
        }
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Replace the mapping with one reconciled from a fresh store listing.
    ///
    /// Holds `writer` from the listing through the swap, so a write can never
    /// land between the two and be overwritten by an older snapshot. The
    /// mapping lock is only taken for the swap. If the listing fails the
    /// previous mapping is left exactly as it was.
    pub async fn rebuild(&self) -> IndexResult<RebuildReport> {
        let _writer = self.writer.lock().await;
        let objects = self
            .store
            .query(&self.settings.object_type, self.settings.user.as_deref())
            .await?;
        let reconciled = reconcile(objects);

        let report = RebuildReport {
            documents: reconciled.entries.len(),
            stats: reconciled.stats,
            completed_at: Utc::now(),
        };

        *self.entries.write().await = reconciled.entries;
        *self.last_rebuild.write().await = Some(report.clone());

        info!(
            "index rebuilt: {} documents from {} objects ({} incomplete, {} tombstoned, {} without uuid, {} superseded)",
            report.documents,
            report.stats.listed,
            report.stats.incomplete,
            report.stats.tombstoned,
            report.stats.unidentified,
            report.stats.superseded
        );
        Ok(report)
    }

    pub async fn last_rebuild(&self) -> Option<RebuildReport> {
        self.last_rebuild.read().await.clone()
    }

    /// Every document, ordered by name and then by id.
    pub async fn list(&self) -> Vec<DocumentSummary> {
        let mut rows: Vec<DocumentSummary> =
            self.entries.read().await.values().map(DocumentEntry::summary).collect();
        rows.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        rows
    }

    pub async fn exists(&self, document_id: &str) -> bool {
        self.entries.read().await.contains_key(document_id)
    }

    /// Fetch and decode the current version of a document.
    ///
    /// `last_modified` comes from the winner's `created` attribute; when that
    /// is absent or unparseable the current time is used instead.
    pub async fn read(&self, document_id: &str) -> IndexResult<(DateTime<Utc>, Document)> {
        let entry = self
            .entries
            .read()
            .await
            .get(document_id)
            .cloned()
            .ok_or_else(|| IndexError::NotFound(document_id.to_string()))?;

        let read_failure = |source: FailureCause| IndexError::ReadFailure {
            id: document_id.to_string(),
            source,
        };
        let bytes = self
            .store
            .fetch_content(&entry.backing_object.object_id)
            .await
            .map_err(|err| read_failure(err.into()))?;
        let document = self
            .codec
            .decode(&bytes)
            .map_err(|err| read_failure(err.into()))?;

        let last_modified = match entry.backing_object.created() {
            Some(raw) => parse_created(raw).unwrap_or_else(|| {
                warn!(
                    "document {} has unparseable created value `{}`",
                    document_id, raw
                );
                Utc::now()
            }),
            None => Utc::now(),
        };
        Ok((last_modified, document))
    }

    /// Save a new version of a document and make it current.
    ///
    /// Without `document_id` a new id is minted and the document is new; if
    /// the minted id is somehow already indexed, that entry is replaced.
    /// With one, the document must already be in the mapping.
    pub async fn write(
        &self,
        mut document: Document,
        document_id: Option<&str>,
    ) -> IndexResult<String> {
        let name = document
            .name()
            .map(str::to_string)
            .ok_or(DocumentError::MissingName)?;

        let _writer = self.writer.lock().await;

        let (document_id, floor) = match document_id {
            Some(id) => {
                let entries = self.entries.read().await;
                let current = entries
                    .get(id)
                    .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
                let floor = current.backing_object.created().and_then(parse_created);
                (id.to_string(), floor)
            }
            None => {
                let id = self.ids.new_id(&name);
                if self.exists(&id).await {
                    warn!("minted document id {} is already indexed", id);
                }
                (id, None)
            }
        };

        let created = self.clock.next_after(floor);
        let attributes = document.stamp(&VersionStamp {
            created: format_created(created),
            user: self.settings.user.as_deref().unwrap_or(PUBLIC_OWNER),
            object_type: &self.settings.object_type,
            uuid: &document_id,
        })?;

        let write_failure = |source: FailureCause| IndexError::WriteFailure {
            id: document_id.clone(),
            source,
        };
        let content = self
            .codec
            .encode(&document)
            .map_err(|err| write_failure(err.into()))?;
        let object = self
            .store
            .create_object(&name, content, &attributes)
            .await
            .map_err(|err| write_failure(err.into()))?;

        debug!(
            "saved document {} as object {}",
            document_id, object.object_id
        );
        let entry = DocumentEntry::from_object(document_id.clone(), object);
        self.entries.write().await.insert(document_id.clone(), entry);
        Ok(document_id)
    }

    /// Forget a document locally. Nothing is removed from the store.
    pub async fn delete(&self, document_id: &str) -> IndexResult<()> {
        let _writer = self.writer.lock().await;
        match self.entries.write().await.remove(document_id) {
            Some(_) => {
                debug!("dropped document {} from the index", document_id);
                Ok(())
            }
            None => Err(IndexError::NotFound(document_id.to_string())),
        }
    }
}
