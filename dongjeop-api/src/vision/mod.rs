//! Vision analysis adapter
//!
//! The hosted vision-language model is reached through the [`VisionAnalyzer`]
//! capability so batch analysis can run against a stub in tests. The model is
//! asked for the record schema as JSON; an answer that does not parse turns
//! into a low-confidence fallback label instead of failing the image.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

use dongjeop_common::{AccessibilityRecord, ChairInfo, WidthClass};

pub mod openai;

pub use openai::OpenAiVisionClient;

/// Confidence assumed when the model omits one
pub const DEFAULT_CONFIDENCE: f32 = 0.85;

/// Confidence of the fallback label
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Vision adapter errors (per image; never abort a batch)
#[derive(Debug, Error)]
pub enum VisionError {
    /// No credentials available
    #[error("Vision analysis not configured: {0}")]
    NotConfigured(String),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// External API returned an error
    #[error("API error: {0}")]
    Api(String),

    /// Response envelope did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Attributes produced by the model for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionLabel {
    #[serde(default)]
    pub has_step: bool,
    #[serde(default)]
    pub width_class: BTreeSet<WidthClass>,
    #[serde(default)]
    pub chair: ChairInfo,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

impl VisionLabel {
    /// Canonical label used when the model's answer cannot be parsed
    pub fn fallback() -> Self {
        Self {
            has_step: false,
            width_class: BTreeSet::from([WidthClass::Normal]),
            chair: ChairInfo {
                has_movable_chair: true,
                ..ChairInfo::default()
            },
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

/// Outcome of analyzing one image
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzedLabel {
    /// The model answered with the expected schema
    Parsed(VisionLabel),
    /// The answer was unusable; carries [`VisionLabel::fallback`]
    Fallback(VisionLabel),
}

impl AnalyzedLabel {
    pub fn label(&self) -> &VisionLabel {
        match self {
            AnalyzedLabel::Parsed(label) | AnalyzedLabel::Fallback(label) => label,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalyzedLabel::Fallback(_))
    }

    /// Attach the image identity to produce a storable record
    pub fn into_record(self, file_path: String, batch: String) -> AccessibilityRecord {
        let label = match self {
            AnalyzedLabel::Parsed(label) | AnalyzedLabel::Fallback(label) => label,
        };
        AccessibilityRecord {
            file_path,
            batch: Some(batch),
            has_step: label.has_step,
            width_class: label.width_class,
            chair: label.chair,
            confidence: Some(label.confidence),
        }
    }
}

/// Capability: label one image
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyzer name for logs
    fn name(&self) -> &'static str;

    /// Label raw image bytes of the given media type (e.g. `image/webp`)
    ///
    /// # Errors
    /// Transport and API failures; an unparseable answer is NOT an error
    /// but an [`AnalyzedLabel::Fallback`].
    async fn analyze(&self, image: &[u8], media_type: &str) -> Result<AnalyzedLabel, VisionError>;
}

/// Interpret the model's text answer
///
/// Accepts bare JSON or JSON wrapped in a Markdown code fence.
pub fn parse_label_response(content: &str) -> AnalyzedLabel {
    let mut body = content.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    }
    if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    let body = body.trim();

    match serde_json::from_str::<VisionLabel>(body) {
        Ok(mut label) => {
            label.confidence = label.confidence.clamp(0.0, 1.0);
            AnalyzedLabel::Parsed(label)
        }
        Err(e) => {
            let preview: String = body.chars().take(200).collect();
            warn!("Unparseable vision response ({}), using fallback label: {}", e, preview);
            AnalyzedLabel::Fallback(VisionLabel::fallback())
        }
    }
}
