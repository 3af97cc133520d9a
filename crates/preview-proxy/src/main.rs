//! Preview Proxy - caching image preview service
//!
//! Fetches remote images, fill-crops them to the requested dimensions, and
//! serves repeats from a size-bounded on-disk cache.

mod error;
mod fetcher;
mod key;
mod server;
mod transform;
mod types;

use crate::error::{PreviewError, Result};
use crate::fetcher::ImageFetcher;
use crate::server::{start_server, ServerState, SharedState};
use crate::types::PreviewProxyConfig;
use artifact_cache::ArtifactCache;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("preview_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Preview Proxy...");

    // Load configuration from environment
    let config = load_config();
    info!("Port: {}", config.port);
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Cache capacity: {} previews", config.cache_capacity);
    info!("Fetch timeout: {} seconds", config.fetch_timeout_secs);

    tokio::fs::create_dir_all(&config.cache_dir).await?;

    // Create cache and fetcher
    let cache = ArtifactCache::with_file_release(config.cache_capacity)
        .map_err(|e| PreviewError::Config(e.to_string()))?;
    let fetcher = ImageFetcher::new(
        Duration::from_secs(config.fetch_timeout_secs),
        Duration::from_secs(config.fetch_timeout_secs),
    )?;

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(cache, fetcher, config.cache_dir));

    // Start HTTP server (blocking)
    start_server(state, config.port)
        .await
        .map_err(|e| PreviewError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

fn load_config() -> PreviewProxyConfig {
    let defaults = PreviewProxyConfig::default();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let cache_dir = std::env::var("CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.cache_dir);

    let cache_capacity = std::env::var("CACHE_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(defaults.cache_capacity);

    let fetch_timeout_secs = std::env::var("FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(defaults.fetch_timeout_secs);

    PreviewProxyConfig {
        port,
        cache_dir,
        cache_capacity,
        fetch_timeout_secs,
    }
}
