//! Collected photo batches on disk
//!
//! The collection root holds one `batch_*` directory per crawl batch, each
//! containing image files. Image paths exchanged over the API are always
//! `"<batch>/<filename>"` relative to that root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ApiError, ApiResult};

/// Directory-name prefix that marks a batch
pub const BATCH_PREFIX: &str = "batch_";

/// Media type for a supported image file name (case-insensitive extension)
pub fn media_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
}

/// Reject batch names that could escape the collection root
pub fn validate_batch_name(batch: &str) -> ApiResult<()> {
    if is_safe_segment(batch) && !batch.contains("..") {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid batch name: {}", batch)))
    }
}

/// Split `"<batch>/<filename>"` into its two segments
///
/// # Examples
/// ```
/// use dongjeop_api::collection::split_image_path;
///
/// assert_eq!(split_image_path("batch_01/a.webp"), Some(("batch_01", "a.webp")));
/// assert_eq!(split_image_path("a.webp"), None);
/// assert_eq!(split_image_path("../etc/passwd"), None);
/// ```
pub fn split_image_path(image_path: &str) -> Option<(&str, &str)> {
    let (batch, file_name) = image_path.split_once('/')?;
    if is_safe_segment(batch) && is_safe_segment(file_name) {
        Some((batch, file_name))
    } else {
        None
    }
}

/// Absolute location of an image path under the collection root
pub fn resolve_image(root: &Path, batch: &str, file_name: &str) -> PathBuf {
    root.join(batch).join(file_name)
}

/// Names of the `batch_*` directories under `root`, sorted
///
/// A missing root is an empty collection, not an error.
pub async fn list_batches(root: &Path) -> ApiResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Collection directory not found: {}", root.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "Failed to read {}: {}",
                root.display(),
                e
            )))
        }
    };

    let mut batches = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(BATCH_PREFIX) {
            continue;
        }
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            batches.push(name);
        }
    }

    batches.sort();
    Ok(batches)
}

/// Supported image file names inside one batch, sorted
///
/// # Errors
/// `BadRequest` for an unsafe batch name, `NotFound` when the batch
/// directory does not exist.
pub async fn list_batch_images(root: &Path, batch: &str) -> ApiResult<Vec<String>> {
    validate_batch_name(batch)?;

    let dir = root.join(batch);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("Batch not found: {}", batch)))
        }
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "Failed to read {}: {}",
                dir.display(),
                e
            )))
        }
    };

    let mut images = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file && media_type_for(&name).is_some() {
            images.push(name);
        }
    }

    images.sort();
    Ok(images)
}
