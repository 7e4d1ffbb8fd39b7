//! src/services/store_client.rs
//!
//! Client for the append-only object store. Three operations are used:
//! listing objects by type, downloading one object's content, and creating a
//! new object from content plus an attribute set. Listing and creation replies
//! are wrapped in the status/data/error envelope; downloads are raw bytes.

use crate::models::remote_object::RemoteObject;
use crate::services::envelope::Envelope;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    RequestBuilder, Url,
    multipart::{Form, Part},
};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const NODE_RESOURCE: &str = "node";
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreClientError {
    #[error("unable to reach object store at {url}: {reason}")]
    Connection { url: String, reason: String },
    #[error("malformed store response: {0}")]
    Protocol(String),
    #[error("object store error ({status}): {message}")]
    Store { status: i64, message: String },
    #[error("invalid store url `{0}`")]
    InvalidUrl(String),
}

pub type StoreClientResult<T> = Result<T, StoreClientError>;

/// The remote operations the version index depends on.
///
/// A single attempt is made per call; retries belong to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object of `object_type`, optionally restricted to one owner.
    /// An empty listing is a valid result.
    async fn query(
        &self,
        object_type: &str,
        user: Option<&str>,
    ) -> StoreClientResult<Vec<RemoteObject>>;

    /// Download the raw content of one object.
    async fn fetch_content(&self, object_id: &str) -> StoreClientResult<Bytes>;

    /// Create a new object and return it as the store echoes it back.
    async fn create_object(
        &self,
        name: &str,
        content: Vec<u8>,
        attributes: &Map<String, Value>,
    ) -> StoreClientResult<RemoteObject>;
}

/// HTTP implementation of [`ObjectStore`].
#[derive(Clone, Debug)]
pub struct HttpStoreClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpStoreClient {
    /// Create a client targeting `base_url` (e.g. `http://store:7445`).
    ///
    /// Without a timeout a stalled store blocks the calling operation for as
    /// long as the transport allows.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> StoreClientResult<Self> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|_| StoreClientError::InvalidUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreClientError::InvalidUrl(base_url.to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|err| StoreClientError::Connection {
            url: trimmed.to_string(),
            reason: format!("failed to build HTTP client: {}", err),
        })?;

        Ok(Self {
            base_url: parsed,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/node[/{object_id}]`
    fn node_url(&self, object_id: Option<&str>) -> StoreClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreClientError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(NODE_RESOURCE);
            if let Some(id) = object_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> StoreClientResult<(reqwest::StatusCode, Bytes)> {
        let resp = request.send().await.map_err(|err| connection_error(url, err))?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|err| connection_error(url, err))?;
        debug!("{} answered {} with {} bytes", url, status, body.len());
        Ok((status, body))
    }

    /// Send a request whose reply is enveloped and return the envelope data.
    async fn send_enveloped(&self, request: RequestBuilder, url: &Url) -> StoreClientResult<Value> {
        let (status, body) = self.send(request, url).await?;
        match Envelope::from_slice(&body) {
            Ok(envelope) => envelope.into_data(),
            Err(_) if !status.is_success() => Err(StoreClientError::Store {
                status: i64::from(status.as_u16()),
                message: body_snippet(&body),
            }),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStoreClient {
    /// GET /node?query&type=T[&user=U]
    async fn query(
        &self,
        object_type: &str,
        user: Option<&str>,
    ) -> StoreClientResult<Vec<RemoteObject>> {
        let mut url = self.node_url(None)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_key_only("query").append_pair("type", object_type);
            if let Some(user) = user {
                pairs.append_pair("user", user);
            }
        }

        let data = self.send_enveloped(self.http.get(url.clone()), &url).await?;
        match data {
            Value::Null => Ok(Vec::new()),
            Value::Array(_) => serde_json::from_value(data).map_err(|err| {
                StoreClientError::Protocol(format!("query data is not a list of objects: {}", err))
            }),
            other => Err(StoreClientError::Protocol(format!(
                "query data should be a list, found {}",
                other
            ))),
        }
    }

    /// GET /node/{id}?download
    async fn fetch_content(&self, object_id: &str) -> StoreClientResult<Bytes> {
        let mut url = self.node_url(Some(object_id))?;
        url.query_pairs_mut().append_key_only("download");

        let (status, body) = self.send(self.http.get(url.clone()), &url).await?;
        if !status.is_success() {
            return Err(StoreClientError::Store {
                status: i64::from(status.as_u16()),
                message: body_snippet(&body),
            });
        }
        Ok(body)
    }

    /// POST /node with multipart parts `file` and `attributes`.
    async fn create_object(
        &self,
        name: &str,
        content: Vec<u8>,
        attributes: &Map<String, Value>,
    ) -> StoreClientResult<RemoteObject> {
        let url = self.node_url(None)?;
        let attributes = serde_json::to_vec(attributes).map_err(|err| {
            StoreClientError::Protocol(format!("attributes could not be encoded: {}", err))
        })?;
        let form = Form::new()
            .part("file", Part::bytes(content).file_name(format!("{}.json", name)))
            .part(
                "attributes",
                Part::bytes(attributes).file_name(format!("{}_metadata.json", name)),
            );

        let data = self
            .send_enveloped(self.http.post(url.clone()).multipart(form), &url)
            .await?;
        if !data.is_object() {
            return Err(StoreClientError::Protocol(format!(
                "create data should be an object, found {}",
                data
            )));
        }
        serde_json::from_value(data).map_err(|err| {
            StoreClientError::Protocol(format!("create data is not an object record: {}", err))
        })
    }
}

fn connection_error(url: &Url, err: reqwest::Error) -> StoreClientError {
    StoreClientError::Connection {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut snippet: String = text.chars().take(ERROR_BODY_LIMIT).collect();
    if snippet.len() < text.len() {
        snippet.push('…');
    }
    snippet
}
