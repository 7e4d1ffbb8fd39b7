//! Encoding of document content to and from stored bytes.

use crate::models::document::Document;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("malformed document: {0}")]
pub struct CodecError(String);

pub trait Codec: Send + Sync {
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError>;
}

/// JSON codec; documents are stored pretty-printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, document: &Document) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(document).map_err(|err| CodecError(err.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Document, CodecError> {
        serde_json::from_slice(bytes).map_err(|err| CodecError(err.to_string()))
    }
}
