use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod timestamps;

#[cfg(test)]
mod test_support;

use services::{
    codec::JsonCodec,
    ids::UuidIdGenerator,
    store_client::HttpStoreClient,
    version_index::{IndexSettings, VersionIndex},
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + list flag ---
    let (cfg, list_only) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting document-index with config: {:?}", cfg);

    // --- Initialize store client + index ---
    let store = HttpStoreClient::new(&cfg.store_url, cfg.store_timeout)
        .with_context(|| format!("configuring object store client for {}", cfg.store_url))?;
    tracing::info!(
        "Serving {} documents from object store for user {}: {}",
        cfg.object_type,
        cfg.store_user.as_deref().unwrap_or("<any>"),
        store.base_url()
    );
    let index = VersionIndex::new(
        Arc::new(store),
        Arc::new(JsonCodec),
        Arc::new(UuidIdGenerator),
        IndexSettings {
            object_type: cfg.object_type.clone(),
            user: cfg.store_user.clone(),
        },
    );

    // --- Handle list mode ---
    if list_only {
        index
            .rebuild()
            .await
            .context("building document index from store")?;
        println!("{}", serde_json::to_string_pretty(&index.list().await)?);
        return Ok(()); // exit after listing
    }

    // --- Initial rebuild; a store outage is not fatal ---
    if let Err(err) = index.rebuild().await {
        tracing::warn!(
            "Initial index rebuild failed, serving an empty index until POST /index/rebuild succeeds: {}",
            err
        );
    }

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(index);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
