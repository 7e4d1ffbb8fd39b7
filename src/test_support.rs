//! In-process stand-ins for the object store, shared by unit tests.

use crate::models::remote_object::{FileInfo, RemoteObject};
use crate::services::store_client::{ObjectStore, StoreClientError, StoreClientResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value, json};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

pub fn remote(object_id: &str, uuid: &str, name: &str, created: &str, size: u64) -> RemoteObject {
    let Value::Object(attributes) = json!({ "uuid": uuid, "name": name, "created": created })
    else {
        unreachable!()
    };
    RemoteObject {
        object_id: object_id.into(),
        file: FileInfo {
            name: format!("{}.json", name),
            size_bytes: size,
        },
        attributes,
    }
}

#[derive(Default)]
struct MockState {
    objects: Vec<RemoteObject>,
    contents: HashMap<String, Vec<u8>>,
    queries: Vec<(String, Option<String>)>,
    query_failure: Option<StoreClientError>,
    fetch_failure: Option<StoreClientError>,
    create_failure: Option<StoreClientError>,
    next_id: usize,
}

/// Append-only store held in memory. Failures can be injected per operation.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Seed an object with the given raw content.
    pub fn insert(&self, object: RemoteObject, content: &[u8]) {
        let mut state = self.state();
        state
            .contents
            .insert(object.object_id.clone(), content.to_vec());
        state.objects.push(object);
    }

    pub fn objects(&self) -> Vec<RemoteObject> {
        self.state().objects.clone()
    }

    pub fn queries(&self) -> Vec<(String, Option<String>)> {
        self.state().queries.clone()
    }

    pub fn fail_query(&self, err: Option<StoreClientError>) {
        self.state().query_failure = err;
    }

    pub fn fail_fetch(&self, err: Option<StoreClientError>) {
        self.state().fetch_failure = err;
    }

    pub fn fail_create(&self, err: Option<StoreClientError>) {
        self.state().create_failure = err;
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn query(
        &self,
        object_type: &str,
        user: Option<&str>,
    ) -> StoreClientResult<Vec<RemoteObject>> {
        let mut state = self.state();
        state
            .queries
            .push((object_type.to_string(), user.map(str::to_string)));
        if let Some(err) = state.query_failure.clone() {
            return Err(err);
        }
        Ok(state
            .objects
            .iter()
            .filter(|obj| {
                obj.attributes
                    .get("type")
                    .and_then(Value::as_str)
                    .is_none_or(|t| t == object_type)
            })
            .cloned()
            .collect())
    }

    async fn fetch_content(&self, object_id: &str) -> StoreClientResult<Bytes> {
        let state = self.state();
        if let Some(err) = state.fetch_failure.clone() {
            return Err(err);
        }
        state
            .contents
            .get(object_id)
            .map(|c| Bytes::from(c.clone()))
            .ok_or_else(|| StoreClientError::Store {
                status: 404,
                message: format!("node {} not found", object_id),
            })
    }

    async fn create_object(
        &self,
        name: &str,
        content: Vec<u8>,
        attributes: &Map<String, Value>,
    ) -> StoreClientResult<RemoteObject> {
        let mut state = self.state();
        if let Some(err) = state.create_failure.clone() {
            return Err(err);
        }
        state.next_id += 1;
        let object = RemoteObject {
            object_id: format!("created-{}", state.next_id),
            file: FileInfo {
                name: format!("{}.json", name),
                size_bytes: content.len() as u64,
            },
            attributes: attributes.clone(),
        };
        state.contents.insert(object.object_id.clone(), content);
        state.objects.push(object.clone());
        Ok(object)
    }
}
