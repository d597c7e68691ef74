//! Collected batch listing
//!
//! Both endpoints answer with a bare JSON array of names.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::collection;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/batches
pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let batches = collection::list_batches(&state.paths.collection).await?;
    Ok(Json(batches))
}

/// GET /api/batches/:batch/images
///
/// 404 when the batch directory does not exist.
pub async fn list_batch_images(
    State(state): State<AppState>,
    Path(batch): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let images = collection::list_batch_images(&state.paths.collection, &batch).await?;
    Ok(Json(images))
}
