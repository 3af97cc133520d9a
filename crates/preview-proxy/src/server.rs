//! HTTP server for the preview endpoints
//!
//! Provides /health and /preview?url=&width=&height=.

use crate::error::{PreviewError, Result};
use crate::fetcher::ImageFetcher;
use crate::key::preview_key;
use crate::transform;
use crate::types::{HealthResponse, PreviewParams};
use artifact_cache::ArtifactCache;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: Mutex<ArtifactCache>,
    pub fetcher: ImageFetcher,
    pub cache_dir: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: ArtifactCache, fetcher: ImageFetcher, cache_dir: PathBuf) -> Self {
        Self {
            cache: Mutex::new(cache),
            fetcher,
            cache_dir,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/preview", get(preview))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.lock().await.stats();
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Serve a cached or freshly rendered preview of a remote image
async fn preview(
    State(state): State<SharedState>,
    Query(params): Query<PreviewParams>,
    headers: HeaderMap,
) -> Response {
    if params.url.is_empty() || params.width == 0 || params.height == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "url, width and height must be non-empty".to_string(),
            }),
        )
            .into_response();
    }

    match render_preview(&state, &params, &headers).await {
        Ok((data, from_cache)) => {
            let cache_header = if from_cache { "HIT" } else { "MISS" };

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "image/jpeg")
                .header(header::CACHE_CONTROL, "public, max-age=86400")
                .header("X-Cache", cache_header)
                .body(Body::from(data))
                .unwrap()
        }
        Err(e) => {
            warn!(url = %params.url, error = %e, "Failed to render preview");
            let status = match e {
                PreviewError::Io(_) | PreviewError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_GATEWAY,
            };
            (
                status,
                Json(ErrorResponse {
                    error: "Failed to render preview".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Render a preview, using the artifact cache when possible.
///
/// The cache lock is held only around index operations; file and network I/O
/// run outside it.
async fn render_preview(
    state: &ServerState,
    params: &PreviewParams,
    headers: &HeaderMap,
) -> Result<(Vec<u8>, bool)> {
    let key = preview_key(&params.url, params.width, params.height);

    let cached = {
        let mut cache = state.cache.lock().await;
        cache.lookup(&key).map(Path::to_path_buf)
    };
    if let Some(path) = cached {
        match fs::read(&path).await {
            Ok(data) => return Ok((data, true)),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached preview, dropping entry");
                state.cache.lock().await.invalidate(&key);
            }
        }
    }

    let raw = state.fetcher.fetch(&params.url, headers).await?;
    let data = transform::fill(&raw, params.width, params.height)?;

    // Persist first; a failed write leaves no index entry behind.
    let path = state.cache_dir.join(format!("{}.jpeg", key));
    fs::write(&path, &data).await?;
    state.cache.lock().await.store(key, path);

    Ok((data, false))
}
