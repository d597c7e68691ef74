//! Batch analysis of collected photos
//!
//! Images are labeled one at a time through the configured
//! [`VisionAnalyzer`], with a pause between calls to respect the hosted
//! model's rate limits. Every failure is recorded against its image and the
//! batch carries on.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::{media_type_for, resolve_image, split_image_path};
use crate::vision::VisionAnalyzer;
use dongjeop_common::{AccessibilityRecord, RecordStore};

/// Failure of one image in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageError {
    pub image_path: String,
    pub error: String,
}

/// Outcome of one analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub success: usize,
    pub errors: usize,
    pub results: Vec<AccessibilityRecord>,
    pub error_details: Vec<ImageError>,
    pub message: String,
}

impl AnalysisReport {
    fn finish(results: Vec<AccessibilityRecord>, error_details: Vec<ImageError>) -> Self {
        let message = format!(
            "Analysis complete: {} succeeded, {} failed",
            results.len(),
            error_details.len()
        );
        Self {
            success: results.len(),
            errors: error_details.len(),
            results,
            error_details,
            message,
        }
    }
}

/// Label each image and append the resulting records to the store
///
/// Appended records become visible to queries after the next reload.
pub async fn analyze_images(
    image_paths: &[String],
    collection_root: &Path,
    analyzer: &dyn VisionAnalyzer,
    store: &RecordStore,
    request_interval: Duration,
) -> AnalysisReport {
    info!(
        "Analyzing {} images with {} analyzer",
        image_paths.len(),
        analyzer.name()
    );

    let mut results = Vec::new();
    let mut error_details = Vec::new();

    for (index, image_path) in image_paths.iter().enumerate() {
        if index > 0 && !request_interval.is_zero() {
            tokio::time::sleep(request_interval).await;
        }

        debug!("[{}/{}] {}", index + 1, image_paths.len(), image_path);
        match analyze_one(image_path, collection_root, analyzer, store).await {
            Ok(record) => results.push(record),
            Err(error) => {
                warn!("Failed to analyze {}: {}", image_path, error);
                error_details.push(ImageError {
                    image_path: image_path.clone(),
                    error,
                });
            }
        }
    }

    let report = AnalysisReport::finish(results, error_details);
    info!("{}", report.message);
    report
}

async fn analyze_one(
    image_path: &str,
    collection_root: &Path,
    analyzer: &dyn VisionAnalyzer,
    store: &RecordStore,
) -> Result<AccessibilityRecord, String> {
    let (batch, file_name) =
        split_image_path(image_path).ok_or_else(|| "Invalid path format".to_string())?;

    let full_path = resolve_image(collection_root, batch, file_name);
    if !tokio::fs::try_exists(&full_path).await.unwrap_or(false) {
        return Err("File not found".to_string());
    }

    let media_type = media_type_for(file_name).ok_or_else(|| "Unsupported image type".to_string())?;

    let bytes = tokio::fs::read(&full_path)
        .await
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let outcome = analyzer
        .analyze(&bytes, media_type)
        .await
        .map_err(|e| e.to_string())?;
    if outcome.is_fallback() {
        warn!("Stored fallback label for {}", image_path);
    }

    let record = outcome.into_record(image_path.to_string(), batch.to_string());
    store
        .append(&record)
        .await
        .map_err(|e| format!("Failed to save result: {}", e))?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{AnalyzedLabel, VisionError, VisionLabel};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    use dongjeop_common::WidthClass;

    /// Answers with a fixed label; bytes equal to `b"fail"` produce an API error
    struct StubAnalyzer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VisionAnalyzer for StubAnalyzer {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn analyze(&self, image: &[u8], _media_type: &str) -> Result<AnalyzedLabel, VisionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match image {
                b"fail" => Err(VisionError::Api("status 500".to_string())),
                b"prose" => Ok(AnalyzedLabel::Fallback(VisionLabel::fallback())),
                _ => Ok(AnalyzedLabel::Parsed(VisionLabel {
                    has_step: true,
                    width_class: BTreeSet::from([WidthClass::Wide]),
                    chair: Default::default(),
                    confidence: 0.9,
                })),
            }
        }
    }

    fn setup() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let batch = dir.path().join("spider/batch_00");
        std::fs::create_dir_all(&batch).unwrap();
        std::fs::write(batch.join("ok.webp"), b"image").unwrap();
        std::fs::write(batch.join("bad.jpg"), b"fail").unwrap();
        std::fs::write(batch.join("vague.png"), b"prose").unwrap();
        std::fs::write(batch.join("doc.gif"), b"image").unwrap();
        let store = RecordStore::new(dir.path().join("gt/gt.jsonl"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_each_image() {
        let (dir, store) = setup();
        let analyzer = StubAnalyzer { calls: AtomicUsize::new(0) };
        let paths: Vec<String> = [
            "batch_00/ok.webp",
            "batch_00/missing.webp",
            "no_batch.webp",
            "batch_00/doc.gif",
            "batch_00/bad.jpg",
            "batch_00/vague.png",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();

        let report = analyze_images(
            &paths,
            &dir.path().join("spider"),
            &analyzer,
            &store,
            Duration::ZERO,
        )
        .await;

        assert_eq!(report.success, 2);
        assert_eq!(report.errors, 4);
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);

        let errors: Vec<(&str, &str)> = report
            .error_details
            .iter()
            .map(|e| (e.image_path.as_str(), e.error.as_str()))
            .collect();
        assert_eq!(errors[0], ("batch_00/missing.webp", "File not found"));
        assert_eq!(errors[1], ("no_batch.webp", "Invalid path format"));
        assert_eq!(errors[2], ("batch_00/doc.gif", "Unsupported image type"));
        assert_eq!(errors[3].0, "batch_00/bad.jpg");
        assert!(errors[3].1.contains("status 500"));

        assert_eq!(report.results[0].file_path, "batch_00/ok.webp");
        assert_eq!(report.results[0].batch.as_deref(), Some("batch_00"));
        assert_eq!(report.results[1].confidence, Some(0.5));
    }

    #[tokio::test]
    async fn test_results_are_appended_not_cached() {
        let (dir, store) = setup();
        let analyzer = StubAnalyzer { calls: AtomicUsize::new(0) };
        assert!(store.load(false).is_empty());

        let paths = vec!["batch_00/ok.webp".to_string()];
        analyze_images(&paths, &dir.path().join("spider"), &analyzer, &store, Duration::ZERO).await;

        assert_eq!(store.reload().len(), 1);
        assert!(store.find("batch_00/ok.webp").is_some());
    }

    #[tokio::test]
    async fn test_empty_batch_message() {
        let (dir, store) = setup();
        let analyzer = StubAnalyzer { calls: AtomicUsize::new(0) };
        let report = analyze_images(&[], dir.path(), &analyzer, &store, Duration::ZERO).await;
        assert_eq!(report.success, 0);
        assert_eq!(report.message, "Analysis complete: 0 succeeded, 0 failed");
    }
}
