//! Thin HTTP client for the Hugging Face inference API.
//!
//! - `generate` posts the styled prompt to `/models/<model>` and writes the
//!   returned bytes to a fresh file under the output directory.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use super::{ImageGenerator, ImageSize};
use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const INFERENCE_STEPS: u32 = 50;
pub const GUIDANCE_SCALE: f64 = 7.5;
pub const NEGATIVE_PROMPT: &str = "low quality, blurry, distorted";

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters<'a>,
}

#[derive(Serialize)]
struct GenerationParameters<'a> {
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f64,
    negative_prompt: &'a str,
}

#[derive(Clone)]
pub struct HuggingFaceClient {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: String,
    style: String,
}

impl HuggingFaceClient {
    pub fn new(base_url: String, model_name: String, api_key: String, style: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        tracing::info!("Image client initialized with model: {}", model_name);
        HuggingFaceClient {
            client: Client::new(),
            base_url: base,
            model_name,
            api_key,
            style,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn set_model(&mut self, model_name: String) {
        tracing::info!("Image model changed to: {}", model_name);
        self.model_name = model_name;
    }

    pub fn set_style(&mut self, style: String) {
        tracing::info!("Image style changed to: {}", style);
        self.style = style;
    }

    pub fn api_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model_name)
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceClient {
    /// Generate one image and persist it under `output_dir`.
    ///
    /// Non-success statuses surface as `AppError::ImageBackend` carrying the
    /// status and response body; nothing is written in that case.
    async fn generate(&self, prompt: &str, output_dir: &Path, size: ImageSize) -> AppResult<PathBuf> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput("prompt must not be empty".to_string()));
        }
        if size.width == 0 || size.height == 0 {
            return Err(AppError::InvalidInput(format!(
                "image size must be positive, got {}x{}",
                size.width, size.height
            )));
        }

        let full_prompt = apply_style(prompt, &self.style);
        let body = GenerationRequest {
            inputs: &full_prompt,
            parameters: GenerationParameters {
                width: size.width,
                height: size.height,
                num_inference_steps: INFERENCE_STEPS,
                guidance_scale: GUIDANCE_SCALE,
                negative_prompt: NEGATIVE_PROMPT,
            },
        };

        let url = self.api_url();
        tracing::info!("Generating image with prompt: {}", full_prompt);
        tracing::debug!("Image backend URL: {}", url);

        let response = self.client.post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            let error_message = format!("Image request failed. Status: {}, Body: {}", status, error_body);
            tracing::error!("{}", error_message);
            return Err(AppError::ImageBackend(error_message));
        }

        let bytes = response.bytes().await.map_err(AppError::HttpClient)?;
        let file_path = output_dir.join(unique_image_name(Local::now()));
        tokio::fs::write(&file_path, &bytes).await?;

        tracing::info!("Image generated successfully: {} ({} bytes)", file_path.display(), bytes.len());
        Ok(file_path)
    }
}

/// Append `", {style}"` unless the prompt already mentions the style.
pub fn apply_style(prompt: &str, style: &str) -> String {
    if prompt.to_lowercase().contains(&style.to_lowercase()) {
        prompt.to_string()
    } else {
        format!("{}, {}", prompt, style)
    }
}

/// `generated_image_<timestamp>_<8 hex chars>.png`
pub fn unique_image_name(now: DateTime<Local>) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("generated_image_{}_{}.png", now.format("%Y%m%d_%H%M%S"), &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_style_is_appended_when_missing() {
        assert_eq!(
            apply_style("a fox in the snow", "digital art"),
            "a fox in the snow, digital art"
        );
    }

    #[test]
    fn test_style_detection_is_case_insensitive() {
        let prompt = "A fox, Digital Art, dramatic light";
        assert_eq!(apply_style(prompt, "digital art"), prompt);
    }

    #[test]
    fn test_empty_style_keeps_prompt() {
        assert_eq!(apply_style("a fox", ""), "a fox");
    }

    #[test]
    fn test_unique_image_name_layout() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let name = unique_image_name(now);
        assert!(name.starts_with("generated_image_20240309_070501_"));
        assert!(name.ends_with(".png"));
        let id = name
            .trim_start_matches("generated_image_20240309_070501_")
            .trim_end_matches(".png");
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_names_differ_within_same_second() {
        let now = Local::now();
        assert_ne!(unique_image_name(now), unique_image_name(now));
    }

    #[test]
    fn test_model_and_style_changes() {
        let mut client = HuggingFaceClient::new(
            "https://example.test/".to_string(),
            "stabilityai/sdxl".to_string(),
            "key".to_string(),
            "digital art".to_string(),
        );
        assert_eq!(client.api_url(), "https://example.test/models/stabilityai/sdxl");
        client.set_model("runwayml/sd-1.5".to_string());
        client.set_style("anime".to_string());
        assert_eq!(client.model_name(), "runwayml/sd-1.5");
        assert_eq!(client.style(), "anime");
        assert_eq!(client.api_url(), "https://example.test/models/runwayml/sd-1.5");
    }
}
