use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use bp_core::{Error, Post};
use bp_scrapers::{Dispatch, RunStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use crate::error::ApiError;
use crate::AppState;

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.storage.latest().await?))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .storage
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("post {}", id)))?;
    Ok(Json(post))
}

/// Queue a scrape run and answer right away.
pub async fn trigger_fetch(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = match state.jobs.dispatch() {
        Dispatch::Queued { run, .. } => {
            info!("📬 Queued scrape run #{}", run);
            json!({ "status": "queued", "run": run })
        }
        Dispatch::AlreadyRunning => json!({ "status": "already_running" }),
    };
    (StatusCode::ACCEPTED, Json(body))
}

pub async fn fetch_status(State(state): State<Arc<AppState>>) -> Json<Option<RunStatus>> {
    Json(state.jobs.last_status().await)
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    url: Option<String>,
}

/// Relay a remote image so the frontend avoids hotlinking and mixed-content issues.
pub async fn proxy_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProxyQuery>,
) -> impl IntoResponse {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return (StatusCode::BAD_REQUEST, "Missing url parameter").into_response(),
    };

    match state.fetcher.fetch_asset(&url).await {
        Ok(asset) => {
            let content_type = asset
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], asset.bytes).into_response()
        }
        Err(e) => {
            warn!("⚠️ Image proxy could not fetch {}: {}", url, e);
            (StatusCode::NOT_FOUND, "Image not found").into_response()
        }
    }
}
