//! Rebuilds the document-id → current-object mapping from a raw listing.
//!
//! The listing is unordered and may hold several versions of a document,
//! unfinished uploads, and tombstones. Rules:
//! 1. Skip objects with size 0 (incomplete upload).
//! 2. Skip objects carrying a `deleted` attribute (tombstone).
//! 3. Group the rest by `uuid`; the latest `created` wins within a group.
//!
//! `created` values are compared as instants when both parse, so `Z` and
//! naive UTC forms order correctly against each other; otherwise they are
//! compared as strings. Ties are broken by the greater `object_id`, so the
//! winner does not depend on listing order.

use crate::{
    models::{
        entry::{DocumentEntry, ReconcileStats},
        remote_object::RemoteObject,
    },
    timestamps::parse_created,
};
use std::{cmp::Ordering, collections::HashMap};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct Reconciled {
    pub entries: HashMap<String, DocumentEntry>,
    pub stats: ReconcileStats,
}

pub fn reconcile(objects: Vec<RemoteObject>) -> Reconciled {
    let mut stats = ReconcileStats {
        listed: objects.len(),
        ..ReconcileStats::default()
    };
    let mut winners: HashMap<String, RemoteObject> = HashMap::new();

    for object in objects {
        if object.is_incomplete() {
            debug!("skipping incomplete object {}", object.object_id);
            stats.incomplete += 1;
            continue;
        }
        if object.is_tombstone() {
            debug!("skipping tombstoned object {}", object.object_id);
            stats.tombstoned += 1;
            continue;
        }
        let Some(uuid) = object.uuid().map(str::to_string) else {
            warn!("object {} has no uuid attribute, ignoring it", object.object_id);
            stats.unidentified += 1;
            continue;
        };

        match winners.get_mut(&uuid) {
            Some(current) => {
                stats.superseded += 1;
                if newer_than(&object, current) {
                    *current = object;
                }
            }
            None => {
                winners.insert(uuid, object);
            }
        }
    }

    let entries = winners
        .into_iter()
        .map(|(uuid, object)| {
            let entry = DocumentEntry::from_object(uuid.clone(), object);
            (uuid, entry)
        })
        .collect();

    Reconciled { entries, stats }
}

/// Order used to pick a winner: `created` first, then `object_id`.
/// A missing `created` sorts before any present value.
fn version_order(a: &RemoteObject, b: &RemoteObject) -> Ordering {
    let by_created = match (a.created(), b.created()) {
        (Some(x), Some(y)) => match (parse_created(x), parse_created(y)) {
            (Some(px), Some(py)) => px.cmp(&py),
            _ => x.cmp(y),
        },
        (x, y) => x.cmp(&y),
    };
    by_created.then_with(|| a.object_id.cmp(&b.object_id))
}

fn newer_than(candidate: &RemoteObject, current: &RemoteObject) -> bool {
    version_order(candidate, current) == Ordering::Greater
}
