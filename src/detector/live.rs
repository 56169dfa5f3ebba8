use super::DetectionBackend;
use crate::error::{EmberAidError, Result};
use emberaid_common::{DetectedItem, ImageUpload};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

const DETECT_PATH: &str = "/api/detect-objects";

/// エラー応答 `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// 検出サービスのクライアント
#[derive(Debug, Clone)]
pub struct LiveDetector {
    client: reqwest::Client,
    endpoint: String,
}

impl LiveDetector {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmberAidError::Detection(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            client,
            endpoint: detect_endpoint(api_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub(crate) fn detect_endpoint(api_url: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), DETECT_PATH)
}

impl DetectionBackend for LiveDetector {
    async fn detect(&self, image: &ImageUpload) -> Result<Vec<DetectedItem>> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| EmberAidError::Detection(format!("invalid MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(endpoint = %self.endpoint, bytes = image.bytes.len(), "posting image");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EmberAidError::Detection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| "Failed to process image".to_string());
            return Err(EmberAidError::Detection(format!("{} ({})", detail, status)));
        }

        response
            .json::<Vec<DetectedItem>>()
            .await
            .map_err(|e| EmberAidError::Detection(format!("invalid response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_endpoint() {
        assert_eq!(
            detect_endpoint("http://localhost:8000"),
            "http://localhost:8000/api/detect-objects"
        );
        assert_eq!(
            detect_endpoint("https://claims.example.com/"),
            "https://claims.example.com/api/detect-objects"
        );
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "File must be an image"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("File must be an image"));
    }
}
