//! Document content as seen by the index: an opaque JSON object whose
//! `metadata` block carries the name and the stamped version attributes.

use crate::models::remote_object::{ATTR_CREATED, ATTR_NAME, ATTR_TYPE, ATTR_USER, ATTR_UUID};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub metadata: Value,

    /// Every other top-level field, preserved untouched.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// Attribute values stamped onto a document before it is submitted.
#[derive(Clone, Debug)]
pub struct VersionStamp<'a> {
    pub created: String,
    pub user: &'a str,
    pub object_type: &'a str,
    pub uuid: &'a str,
}

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("missing document name")]
    MissingName,
    #[error("document metadata must be an object, found {0}")]
    MetadataNotObject(&'static str),
}

impl Document {
    pub fn name(&self) -> Option<&str> {
        self.metadata.get(ATTR_NAME).and_then(Value::as_str)
    }

    /// Write the version attributes into `metadata` and return the resulting
    /// attribute set, which is a copy of the stamped metadata.
    pub fn stamp(&mut self, stamp: &VersionStamp<'_>) -> Result<Map<String, Value>, DocumentError> {
        let metadata = match &mut self.metadata {
            Value::Object(map) => map,
            other => return Err(DocumentError::MetadataNotObject(json_kind(other))),
        };
        metadata.insert(ATTR_CREATED.into(), Value::String(stamp.created.clone()));
        metadata.insert(ATTR_USER.into(), Value::String(stamp.user.to_string()));
        metadata.insert(ATTR_TYPE.into(), Value::String(stamp.object_type.to_string()));
        metadata.insert(ATTR_UUID.into(), Value::String(stamp.uuid.to_string()));
        Ok(metadata.clone())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
