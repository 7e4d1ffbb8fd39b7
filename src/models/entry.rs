//! Reconciled, in-memory views derived from store objects.

use crate::models::remote_object::RemoteObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The current version of one logical document.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentEntry {
    /// Equal to the `uuid` attribute shared by every version.
    pub document_id: String,
    pub display_name: String,
    /// The object chosen as current for this document.
    pub backing_object: RemoteObject,
}

impl DocumentEntry {
    pub fn from_object(document_id: impl Into<String>, object: RemoteObject) -> Self {
        let document_id = document_id.into();
        let display_name = object
            .name()
            .map(str::to_string)
            .or_else(|| (!object.file.name.is_empty()).then(|| object.file.name.clone()))
            .unwrap_or_else(|| document_id.clone());
        Self {
            document_id,
            display_name,
            backing_object: object,
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            document_id: self.document_id.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// One row of a document listing.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentSummary {
    pub document_id: String,
    pub name: String,
}

/// Counters gathered while reconciling a store listing.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Objects returned by the store query.
    pub listed: usize,
    /// Skipped because the upload never completed (size 0).
    pub incomplete: usize,
    /// Skipped because they carry a `deleted` attribute.
    pub tombstoned: usize,
    /// Skipped because they have no `uuid` to group by.
    pub unidentified: usize,
    /// Older versions that lost to a later `created`.
    pub superseded: usize,
}

/// Outcome of a successful index rebuild.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct RebuildReport {
    pub documents: usize,
    pub stats: ReconcileStats,
    pub completed_at: DateTime<Utc>,
}
