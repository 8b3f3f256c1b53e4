use crate::{
    aggregate::{aggregate, SourceOutcome},
    error::{ApiError, ApiResult},
    models::AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/video", get(list_videos_handler).post(upload_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "clip-catalog"
    }))
}

/// List every video known to either index, keyed by filename
pub async fn list_videos_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let start_time = Instant::now();

    let indexes = state.config.twelvelabs.require().map_err(|e| {
        error!("[GET /api/video] ❌ Configuration error: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "[GET /api/video] ⏱️  START - primary={} secondary={}",
        indexes.primary, indexes.secondary
    );

    let result = aggregate(
        state.listing.list_videos(&indexes.primary),
        state.listing.list_videos(&indexes.secondary),
    )
    .await;

    for (name, outcome) in [("Marengo", &result.primary), ("Pegasus", &result.secondary)] {
        if let SourceOutcome::Partial { reason } = outcome {
            warn!("[GET /api/video] ⚠️  {} listing incomplete: {}", name, reason);
        }
    }

    let body = serde_json::to_value(&result.collection).map_err(|e| {
        error!("[GET /api/video] ❌ Failed to encode videos: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "[GET /api/video] ✅ SUCCESS - {} videos in {:.2}s",
        result.collection.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(Json(body))
}

/// Uploads go straight to the storage service
pub async fn upload_handler() -> ApiError {
    ApiError::UploadNotAvailable
}
