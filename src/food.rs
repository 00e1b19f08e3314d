//! Client for the food scanner endpoint, which estimates nutrition
//! from a photo of a meal.
use std::path::Path;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coach::CoachError;
use crate::core::AppConfig;

/// Largest photo accepted for a scan
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct FoodScanRequest {
    /// The photo as a `data:` URL
    pub image: String,
}

impl FoodScanRequest {
    /// Encode image bytes as a base64 `data:` URL.
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, CoachError> {
        if !mime_type.starts_with("image/") {
            return Err(CoachError::InvalidRequest(
                "Please select an image file".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(CoachError::InvalidRequest("No image provided".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(CoachError::InvalidRequest(
                "File too large, max 10MB".to_string(),
            ));
        }
        Ok(Self {
            image: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, CoachError> {
        let mime_type = image_mime_type(path).ok_or_else(|| {
            CoachError::InvalidRequest("Please select an image file".to_string())
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            CoachError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes, mime_type)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Nutrition {
    pub food_name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    #[serde(default)]
    pub serving_size: String,
    /// "high", "medium" or "low"
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub tips: Option<String>,
}

fn parse_nutrition(body: &Value) -> Result<Nutrition, CoachError> {
    if !body["nutrition"].is_null() {
        return serde_json::from_value(body["nutrition"].clone())
            .map_err(|e| CoachError::InvalidResponse(e.to_string()));
    }
    let message = body["error"]
        .as_str()
        .unwrap_or("Could not analyze the food");
    Err(CoachError::InvalidResponse(message.to_string()))
}

#[derive(Clone, Debug)]
pub struct FoodScanClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    request_timeout: Duration,
}

impl FoodScanClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.food_scanner_url(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub async fn scan(&self, request: &FoodScanRequest) -> Result<Nutrition, CoachError> {
        tracing::debug!(
            "Sending {} byte image to {}",
            request.image.len(),
            self.url
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("Food scan failed with {}: {}", status, body);
            return Err(CoachError::from_status(status.as_u16(), &body));
        }

        let body: Value = serde_json::from_str(&body)
            .map_err(|e| CoachError::InvalidResponse(e.to_string()))?;
        parse_nutrition(&body)
    }
}
