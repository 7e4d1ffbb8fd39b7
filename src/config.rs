use anyhow::{Context, Result};
use clap::Parser;
use std::{env, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_url: String,
    pub store_user: Option<String>,
    pub object_type: String,
    pub store_timeout: Option<Duration>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Versioned document index over an append-only object store")]
pub struct Args {
    /// Host to bind to (overrides DOCUMENT_INDEX_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides DOCUMENT_INDEX_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store base URL (overrides DOCUMENT_INDEX_STORE_URL)
    #[arg(long)]
    pub store_url: Option<String>,

    /// Owning user for listings and writes (overrides DOCUMENT_INDEX_STORE_USER)
    #[arg(long)]
    pub store_user: Option<String>,

    /// Object type managed by this index (overrides DOCUMENT_INDEX_OBJECT_TYPE)
    #[arg(long)]
    pub object_type: Option<String>,

    /// Store request timeout in seconds (overrides DOCUMENT_INDEX_STORE_TIMEOUT_SECS)
    #[arg(long)]
    pub store_timeout_secs: Option<u64>,

    /// Build the index, print the document list as JSON and exit
    #[arg(long)]
    pub list: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and list flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<(Self, bool)> {
        // --- Environment fallback ---
        let env_host = env::var("DOCUMENT_INDEX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match args.port {
            Some(port) => port,
            None => parse_env("DOCUMENT_INDEX_PORT")?.unwrap_or(3000),
        };
        let env_store_url = env::var("DOCUMENT_INDEX_STORE_URL")
            .unwrap_or_else(|_| "http://localhost:7445".into());
        let env_store_user = env::var("DOCUMENT_INDEX_STORE_USER").ok();
        let env_object_type =
            env::var("DOCUMENT_INDEX_OBJECT_TYPE").unwrap_or_else(|_| "document".into());
        let timeout_secs = match args.store_timeout_secs {
            Some(secs) => Some(secs),
            None => parse_env("DOCUMENT_INDEX_STORE_TIMEOUT_SECS")?,
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port,
            store_url: args.store_url.unwrap_or(env_store_url),
            store_user: args
                .store_user
                .or(env_store_user)
                .filter(|user| !user.trim().is_empty()),
            object_type: args.object_type.unwrap_or(env_object_type),
            store_timeout: timeout_secs.map(Duration::from_secs),
        };

        Ok((cfg, args.list))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
