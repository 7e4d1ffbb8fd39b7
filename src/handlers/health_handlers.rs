//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness: the index has been built from the store

use crate::{models::entry::RebuildReport, services::version_index::VersionIndex};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Very small liveness check; always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// HTTP 200 with the latest rebuild report once the index has been built at
/// least once; HTTP 503 before that. Does not contact the store.
pub async fn readyz(State(index): State<VersionIndex>) -> impl IntoResponse {
    let last_rebuild = index.last_rebuild().await;
    let status = if last_rebuild.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if last_rebuild.is_some() {
            "ok".into()
        } else {
            "index not built".into()
        },
        object_type: index.settings().object_type.clone(),
        last_rebuild,
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    object_type: String,
    last_rebuild: Option<RebuildReport>,
}
