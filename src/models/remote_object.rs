//! Represents one object as returned by a store listing or creation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const ATTR_UUID: &str = "uuid";
pub const ATTR_NAME: &str = "name";
pub const ATTR_CREATED: &str = "created";
pub const ATTR_DELETED: &str = "deleted";
pub const ATTR_USER: &str = "user";
pub const ATTR_TYPE: &str = "type";

/// A single physical object in the append-only store.
///
/// Objects are never updated in place. Successive versions of one logical
/// document are separate objects sharing the same `uuid` attribute.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RemoteObject {
    /// Store-assigned identifier, unique per physical object and never reused.
    #[serde(rename = "id")]
    pub object_id: String,

    /// Information about the uploaded payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub file: FileInfo,

    /// Attribute set submitted alongside the payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
}

/// Payload details of a stored object.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FileInfo {
    #[serde(default)]
    pub name: String,

    /// Zero means the upload never completed.
    #[serde(default, rename = "size")]
    pub size_bytes: u64,
}

impl RemoteObject {
    pub fn size_bytes(&self) -> u64 {
        self.file.size_bytes
    }

    pub fn uuid(&self) -> Option<&str> {
        self.attribute_str(ATTR_UUID)
    }

    pub fn name(&self) -> Option<&str> {
        self.attribute_str(ATTR_NAME)
    }

    pub fn created(&self) -> Option<&str> {
        self.attribute_str(ATTR_CREATED)
    }

    /// Tombstones carry a `deleted` attribute; its value is irrelevant.
    pub fn is_tombstone(&self) -> bool {
        self.attributes.contains_key(ATTR_DELETED)
    }

    pub fn is_incomplete(&self) -> bool {
        self.size_bytes() == 0
    }

    fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
