//! HTTP handlers for document operations.
//! Every handler maps one-to-one onto a `VersionIndex` operation; none of them
//! talks to the object store directly.

use crate::{
    errors::AppError,
    models::{
        document::Document,
        entry::{DocumentSummary, RebuildReport},
    },
    services::version_index::VersionIndex,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub document_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub document_id: String,
    pub last_modified: String,
    pub content: Document,
}

/// GET `/documents`: every indexed document, ordered by name.
pub async fn list_documents(State(index): State<VersionIndex>) -> Json<Vec<DocumentSummary>> {
    Json(index.list().await)
}

/// HEAD `/documents/{id}`: 200 if indexed, 404 otherwise.
pub async fn document_exists(
    State(index): State<VersionIndex>,
    Path(id): Path<String>,
) -> StatusCode {
    if index.exists(&id).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET `/documents/{id}`: current version with its modification time.
pub async fn read_document(
    State(index): State<VersionIndex>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (last_modified, content) = index.read(&id).await?;
    let body = ReadResponse {
        document_id: id,
        last_modified: last_modified.to_rfc3339_opts(SecondsFormat::Micros, true),
        content,
    };

    let mut response = Json(body).into_response();
    set_last_modified(&mut response, last_modified);
    Ok(response)
}

/// POST `/documents`: save a brand-new document under a minted id.
pub async fn create_document(
    State(index): State<VersionIndex>,
    Json(document): Json<Document>,
) -> Result<impl IntoResponse, AppError> {
    let document_id = index.write(document, None).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse { document_id })))
}

/// PUT `/documents/{id}`: save a new version of an existing document.
pub async fn write_document(
    State(index): State<VersionIndex>,
    Path(id): Path<String>,
    Json(document): Json<Document>,
) -> Result<Json<WriteResponse>, AppError> {
    let document_id = index.write(document, Some(&id)).await?;
    Ok(Json(WriteResponse { document_id }))
}

/// DELETE `/documents/{id}`: drop the document from the index only.
/// The stored versions remain and reappear on the next rebuild.
pub async fn delete_document(
    State(index): State<VersionIndex>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    index.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/index/rebuild`: resynchronize the index from the store.
pub async fn rebuild_index(
    State(index): State<VersionIndex>,
) -> Result<Json<RebuildReport>, AppError> {
    Ok(Json(index.rebuild().await?))
}

/// HTTP-date form (RFC 9110), which `to_rfc2822` does not produce.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn set_last_modified(response: &mut Response, at: DateTime<Utc>) {
    let formatted = at.format(HTTP_DATE_FORMAT).to_string();
    match HeaderValue::from_str(&formatted) {
        Ok(value) => {
            response.headers_mut().insert(header::LAST_MODIFIED, value);
        }
        Err(err) => warn!("cannot build Last-Modified header from `{}`: {}", formatted, err),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        routes::routes::routes,
        services::{
            codec::JsonCodec,
            ids::UuidIdGenerator,
            store_client::StoreClientError,
            version_index::{IndexSettings, VersionIndex},
        },
        test_support::{MockStore, remote},
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app(store: Arc<MockStore>) -> (Router, VersionIndex) {
        let index = VersionIndex::new(
            store,
            Arc::new(JsonCodec),
            Arc::new(UuidIdGenerator),
            IndexSettings {
                object_type: "document".into(),
                user: Some("alice".into()),
            },
        );
        index.rebuild().await.unwrap();
        (routes().with_state(index.clone()), index)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn seeded() -> Arc<MockStore> {
        let store = Arc::new(MockStore::new());
        let content = json!({ "metadata": { "name": "notes" }, "cells": [] });
        store.insert(
            remote("o1", "u1", "notes", "2012-06-01T00:00:00", 10),
            content.to_string().as_bytes(),
        );
        store
    }

    #[tokio::test]
    async fn lists_and_reads_documents() {
        let (app, _) = app(seeded()).await;

        let (status, body) = call(&app, Method::GET, "/documents", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "document_id": "u1", "name": "notes" }]));

        let response = app
            .clone()
            .oneshot(Request::get("/documents/u1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Fri, 01 Jun 2012 00:00:00 GMT"
        );

        let (status, body) = call(&app, Method::GET, "/documents/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["last_modified"], "2012-06-01T00:00:00.000000Z");
        assert_eq!(body["content"]["metadata"]["name"], "notes");

        let (status, body) = call(&app, Method::GET, "/documents/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn head_reports_existence() {
        let (app, _) = app(seeded()).await;
        let (status, _) = call(&app, Method::HEAD, "/documents/u1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::HEAD, "/documents/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn creates_updates_and_deletes() {
        let store = seeded();
        let (app, index) = app(store.clone()).await;

        let doc = json!({ "metadata": { "name": "draft" }, "cells": [1] });
        let (status, body) = call(&app, Method::POST, "/documents", Some(doc.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["document_id"].as_str().unwrap().to_string();
        assert!(index.exists(&id).await);

        let (_, body) = call(&app, Method::GET, &format!("/documents/{}", id), None).await;
        assert_eq!(body["content"]["metadata"]["user"], "alice");
        assert_eq!(body["content"]["cells"], json!([1]));

        let (status, body) = call(&app, Method::PUT, "/documents/u1", Some(doc.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document_id"], "u1");

        let (status, _) = call(&app, Method::PUT, "/documents/ghost", Some(doc)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::POST, "/documents", Some(json!({ "metadata": {} }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let objects = store.objects().len();
        let (status, _) = call(&app, Method::DELETE, "/documents/u1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!index.exists("u1").await);
        assert_eq!(store.objects().len(), objects);

        let (status, _) = call(&app, Method::DELETE, "/documents/u1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::POST, "/index/rebuild", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["documents"], 2);
        assert!(index.exists("u1").await);
    }

    #[tokio::test]
    async fn rebuild_failure_surfaces_store_status() {
        let store = seeded();
        let (app, index) = app(store.clone()).await;
        store.fail_query(Some(StoreClientError::Store {
            status: 403,
            message: "forbidden".into(),
        }));

        let (status, body) = call(&app, Method::POST, "/index/rebuild", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("forbidden"));
        assert!(index.exists("u1").await);
    }

    #[test]
    fn last_modified_uses_http_date_form() {
        use super::set_last_modified;
        use axum::response::IntoResponse;
        use chrono::{Duration, TimeZone, Utc};

        let at = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 9).unwrap() + Duration::microseconds(250);
        let mut response = StatusCode::OK.into_response();
        set_last_modified(&mut response, at);
        assert_eq!(
            response.headers()[header::LAST_MODIFIED],
            "Thu, 29 Feb 2024 13:05:09 GMT"
        );
    }
}
