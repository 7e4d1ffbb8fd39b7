//! Identifier minting for new logical documents.

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    /// Mint an opaque, collision-free document identifier.
    fn new_id(&self, name: &str) -> String;
}

/// Random v4 UUIDs; the document name plays no part.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self, _name: &str) -> String {
        Uuid::new_v4().to_string()
    }
}
