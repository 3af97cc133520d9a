//! Core types for the preview proxy

use artifact_cache::CacheStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the preview proxy
#[derive(Debug, Clone)]
pub struct PreviewProxyConfig {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub cache_capacity: usize,
    pub fetch_timeout_secs: u64,
}

impl Default for PreviewProxyConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cache_dir: PathBuf::from("./cache/previews"),
            cache_capacity: 512,
            fetch_timeout_secs: 25,
        }
    }
}

/// Query parameters accepted by the preview endpoint
#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}
