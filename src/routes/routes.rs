//! Defines routes for the document surface exposed to the host application.
//!
//! ## Structure
//! - **Collection endpoints**
//!   - `GET    /documents` -> list documents ordered by name
//!   - `POST   /documents` -> save a new document under a minted id
//!
//! - **Document endpoints**
//!   - `GET    /documents/{id}` -> read the current version
//!   - `HEAD   /documents/{id}` -> existence check only
//!   - `PUT    /documents/{id}` -> save a new version
//!   - `DELETE /documents/{id}` -> drop from the index (store untouched)
//!
//! - **Index maintenance**
//!   - `POST   /index/rebuild` -> resynchronize from the store

use crate::{
    handlers::{
        document_handlers::{
            create_document, delete_document, document_exists, list_documents, read_document,
            rebuild_index, write_document,
        },
        health_handlers::{healthz, readyz},
    },
    services::version_index::VersionIndex,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all document routes.
///
/// The router carries shared state (`VersionIndex`) to all handlers.
pub fn routes() -> Router<VersionIndex> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Document-level routes
        .route(
            "/documents/{id}",
            get(read_document)
                .head(document_exists)
                .put(write_document)
                .delete(delete_document),
        )
        // Collection-level routes
        .route("/documents", get(list_documents).post(create_document))
        .route("/index/rebuild", post(rebuild_index))
}
