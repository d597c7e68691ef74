//! Vision analysis trigger

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::analysis::{self, AnalysisReport};
use crate::collection;
use crate::error::{ApiError, ApiResult};
use crate::vision::VisionAnalyzer;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_paths: Vec<String>,
}

/// POST /api/analyze/images
///
/// Runs for the whole batch inside the request. Per-image failures are part
/// of the report; only an empty request or a missing analyzer fail the call.
pub async fn analyze_images(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalysisReport>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.image_paths.is_empty() {
        return Err(ApiError::BadRequest("image_paths must not be empty".to_string()));
    }

    let analyzer = configured_analyzer(&state)?;

    let report = analysis::analyze_images(
        &request.image_paths,
        &state.paths.collection,
        analyzer,
        &state.store,
        state.request_interval,
    )
    .await;

    Ok(Json(report))
}

/// POST /api/batches/:batch/analyze
///
/// Analyzes every supported image in one collected batch. 404 when the
/// batch directory does not exist.
pub async fn analyze_batch(
    State(state): State<AppState>,
    Path(batch): Path<String>,
) -> ApiResult<Json<AnalysisReport>> {
    let images = collection::list_batch_images(&state.paths.collection, &batch).await?;
    let analyzer = configured_analyzer(&state)?;

    let image_paths: Vec<String> = images
        .iter()
        .map(|name| format!("{}/{}", batch, name))
        .collect();

    let report = analysis::analyze_images(
        &image_paths,
        &state.paths.collection,
        analyzer,
        &state.store,
        state.request_interval,
    )
    .await;

    Ok(Json(report))
}

fn configured_analyzer(state: &AppState) -> ApiResult<&dyn VisionAnalyzer> {
    state.analyzer.as_deref().ok_or_else(|| {
        ApiError::NotConfigured("Vision analysis is not configured (no API key)".to_string())
    })
}
