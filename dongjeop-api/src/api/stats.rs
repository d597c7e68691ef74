//! Dataset-wide aggregates and explicit reload

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use dongjeop_common::stats::{Statistics, Summary};

/// GET /api/statistics
pub async fn get_statistics(State(state): State<AppState>) -> Json<Statistics> {
    let records = state.store.load(false);
    Json(Statistics::from_records(&records))
}

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<Summary> {
    let records = state.store.load(false);
    Json(Summary::from_records(&records))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub total_images: usize,
}

/// POST /api/reload
///
/// Re-reads the dataset file, picking up records appended by analysis.
/// The read runs on the blocking pool.
pub async fn reload_dataset(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let store = Arc::clone(&state.store);
    let records = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| ApiError::Internal(format!("Dataset reload task failed: {}", e)))?;

    info!("Dataset reloaded: {} records", records.len());
    Ok(Json(ReloadResponse {
        total_images: records.len(),
    }))
}
