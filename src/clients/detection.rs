//! Image-detection collaborator.
//!
//! Two operations against a managed vision service: text extraction and
//! moderation-category detection with a minimum-confidence cutoff. The
//! service filters by confidence server-side; we forward the threshold and
//! take the returned labels as-is.
//!
//! `VisionHttpScanner` posts annotate requests with base64 image content
//! and a feature selector, bearer-authenticated.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DetectionError;

/// One fragment of text found in an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
}

/// One moderation category detected in an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationLabel {
    pub name: String,
    pub confidence: f32,
}

/// Text and moderation-category detection over raw image bytes.
#[async_trait]
pub trait ImageScanner: Send + Sync {
    /// Extract all text fragments from an image.
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<TextFragment>, DetectionError>;

    /// Detect moderation categories at or above `min_confidence` (percent).
    async fn detect_moderation_labels(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> Result<Vec<ModerationLabel>, DetectionError>;
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateRequestItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequestItem {
    image: ImageContent,
    features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_confidence: Option<f32>,
}

#[derive(Serialize)]
struct ImageContent {
    /// Base64-encoded image bytes.
    content: String,
}

#[derive(Serialize)]
struct Feature {
    r#type: String,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    responses: Vec<Annotations>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Annotations {
    #[serde(default)]
    text_annotations: Option<Vec<TextAnnotation>>,
    #[serde(default)]
    moderation_labels: Option<Vec<ModerationAnnotation>>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    description: String,
}

#[derive(Deserialize)]
struct ModerationAnnotation {
    name: String,
    confidence: f32,
}

// ── HTTP client ─────────────────────────────────────────────────────

/// Vision-service client: JSON over HTTP, one image per request.
pub struct VisionHttpScanner {
    endpoint: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl VisionHttpScanner {
    pub fn new(endpoint: String, api_key: SecretString) -> Self {
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    async fn annotate(
        &self,
        image: &[u8],
        feature: &str,
        min_confidence: Option<f32>,
    ) -> Result<Annotations, DetectionError> {
        let request = AnnotateRequest {
            requests: vec![AnnotateRequestItem {
                image: ImageContent {
                    content: BASE64.encode(image),
                },
                features: vec![Feature {
                    r#type: feature.to_string(),
                }],
                min_confidence,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| DetectionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::RequestFailed(format!(
                "{feature} returned {status}: {body}"
            )));
        }

        let mut parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;

        if parsed.responses.is_empty() {
            return Err(DetectionError::InvalidResponse(
                "empty responses array".to_string(),
            ));
        }
        Ok(parsed.responses.swap_remove(0))
    }
}

#[async_trait]
impl ImageScanner for VisionHttpScanner {
    async fn detect_text(&self, image: &[u8]) -> Result<Vec<TextFragment>, DetectionError> {
        let annotations = self.annotate(image, "TEXT_DETECTION", None).await?;
        let fragments: Vec<TextFragment> = annotations
            .text_annotations
            .unwrap_or_default()
            .into_iter()
            .map(|a| TextFragment { text: a.description })
            .collect();
        debug!(fragments = fragments.len(), "Text detection complete");
        Ok(fragments)
    }

    async fn detect_moderation_labels(
        &self,
        image: &[u8],
        min_confidence: f32,
    ) -> Result<Vec<ModerationLabel>, DetectionError> {
        let annotations = self
            .annotate(image, "MODERATION_DETECTION", Some(min_confidence))
            .await?;
        let labels: Vec<ModerationLabel> = annotations
            .moderation_labels
            .unwrap_or_default()
            .into_iter()
            .map(|a| ModerationLabel {
                name: a.name,
                confidence: a.confidence,
            })
            .collect();
        debug!(labels = labels.len(), min_confidence, "Moderation detection complete");
        Ok(labels)
    }
}
