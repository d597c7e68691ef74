//! Labeled image browsing
//!
//! Every record leaves the service together with its computed accessibility
//! score; the detail view adds improvement suggestions.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::pagination::{PageWindow, DEFAULT_LIMIT};
use crate::AppState;
use dongjeop_common::query::{query, ImageFilter, Page};
use dongjeop_common::recommend::{recommendations, Recommendation};
use dongjeop_common::{score, AccessibilityRecord, ChairType, ScoreResult, WidthClass};

/// Query parameters for GET /api/images
#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    #[serde(default)]
    pub skip: i64,

    #[serde(default = "default_limit")]
    pub limit: i64,

    pub has_step: Option<bool>,
    pub width_class: Option<WidthClass>,
    pub chair_type: Option<ChairType>,
    pub needs_relabeling: Option<bool>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl ImagesQuery {
    fn filter(&self) -> ImageFilter {
        ImageFilter {
            has_step: self.has_step,
            width_class: self.width_class,
            chair_type: self.chair_type,
            needs_relabeling: self.needs_relabeling,
        }
    }
}

/// A record with its accessibility score
#[derive(Debug, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: AccessibilityRecord,
    pub accessibility: ScoreResult,
}

impl ScoredRecord {
    pub fn new(record: AccessibilityRecord) -> Self {
        let accessibility = score(&record);
        Self {
            record,
            accessibility,
        }
    }
}

/// Detail view of one record
#[derive(Debug, Serialize)]
pub struct ImageDetail {
    #[serde(flatten)]
    pub scored: ScoredRecord,
    pub recommendations: Vec<Recommendation>,
}

/// GET /api/images
///
/// Filtered, paginated listing. Malformed query values are rejected with 400.
pub async fn list_images(
    State(state): State<AppState>,
    params: Result<Query<ImagesQuery>, QueryRejection>,
) -> ApiResult<Json<Page<ScoredRecord>>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let window = PageWindow::new(params.skip, params.limit)?;

    let records = state.store.load(false);
    let page = query(&records, &params.filter(), window.skip, window.limit)
        .map(|record| ScoredRecord::new(record.clone()));

    Ok(Json(page))
}

/// GET /api/images/*file_path
///
/// `file_path` may contain slashes, e.g. `/api/images/batch_00/photo.webp`.
pub async fn get_image(
    State(state): State<AppState>,
    Path(file_path): Path<String>,
) -> ApiResult<Json<ImageDetail>> {
    let record = state
        .store
        .find(&file_path)
        .ok_or_else(|| ApiError::NotFound(format!("Image not found: {}", file_path)))?;

    let recommendations = recommendations(&record);
    Ok(Json(ImageDetail {
        scored: ScoredRecord::new(record),
        recommendations,
    }))
}
