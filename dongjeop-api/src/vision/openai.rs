//! OpenAI chat-completions vision client
//!
//! Sends one image as a base64 data URL together with the labeling prompt
//! and reads the model's text answer.
//!
//! # API Reference
//! - Endpoint: https://api.openai.com/v1/chat/completions
//! - Documentation: https://platform.openai.com/docs/guides/vision

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{parse_label_response, AnalyzedLabel, VisionAnalyzer, VisionError};
use dongjeop_common::config::VisionSettings;

const MAX_TOKENS: u32 = 500;

/// Low temperature keeps labels consistent between runs
const TEMPERATURE: f32 = 0.1;

const LABELING_PROMPT: &str = r#"This is an interior photo of a restaurant or shop. Assess it for wheelchair accessibility:

1. has_step: is there a step, stair or raised threshold a wheelchair user cannot roll over? (boolean)
2. width_class: passage widths visible in the photo, one entry per distinct passage:
   - "wide": a wheelchair passes comfortably (about 90cm or more)
   - "normal": passable but tight (about 70-90cm)
   - "narrow": very hard to pass (about 50-70cm)
   - "not_passable": a wheelchair cannot pass (under 50cm)
3. chair: seating present (each boolean):
   - has_movable_chair: ordinary movable chairs or stools
   - has_high_movable_chair: movable chairs with armrests or adjustable height
   - has_fixed_chair: fixed seating such as benches or booths
   - has_floor_chair: floor seating
4. confidence: your overall confidence from 0.0 to 1.0

Answer with JSON only, in exactly this shape:
{
  "has_step": boolean,
  "width_class": ["wide" | "normal" | "narrow" | "not_passable"],
  "chair": {
    "has_movable_chair": boolean,
    "has_high_movable_chair": boolean,
    "has_fixed_chair": boolean,
    "has_floor_chair": boolean
  },
  "confidence": number
}"#;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Hosted vision-language model client
pub struct OpenAiVisionClient {
    http_client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiVisionClient {
    pub fn new(
        api_key: String,
        model: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, VisionError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VisionError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            model,
            endpoint,
        })
    }

    /// Build a client from resolved settings
    ///
    /// # Errors
    /// `VisionError::NotConfigured` when no API key was resolved.
    pub fn from_settings(settings: &VisionSettings) -> Result<Self, VisionError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            VisionError::NotConfigured("no API key".to_string())
        })?;
        Self::new(
            api_key,
            settings.model.clone(),
            settings.endpoint.clone(),
            settings.timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, image: &[u8], media_type: &str) -> serde_json::Value {
        let encoded = general_purpose::STANDARD.encode(image);
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": LABELING_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:{};base64,{}", media_type, encoded) }
                    }
                ]
            }],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
        })
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiVisionClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn analyze(&self, image: &[u8], media_type: &str) -> Result<AnalyzedLabel, VisionError> {
        debug!("Requesting label from {} ({} bytes)", self.model, image.len());

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image, media_type))
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(300).collect();
            return Err(VisionError::Api(format!("status {}: {}", status, preview)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(format!("Invalid chat response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VisionError::Parse("Response contained no message content".to_string()))?;

        Ok(parse_label_response(&content))
    }
}
