//! Anthropic Messages API client.
//!
//! Covers the two request shapes the caption pipeline needs: a vision request
//! with one text block and one base64 image block, and a plain single-turn
//! text request with a sampling temperature.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";
pub const DESCRIBE_MAX_TOKENS: u32 = 300;
pub const DESCRIBE_INSTRUCTION: &str = "Describe this image in detail for use in an Instagram caption.";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Blocks(Vec<ContentBlock<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        tracing::info!("Caption client initialized with model: {}", model);
        AnthropicClient { client: Client::new(), base_url: base, model, api_key }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: String) {
        tracing::info!("Caption model changed to: {}", model);
        self.model = model;
    }

    async fn send(&self, request: &MessagesRequest<'_>) -> AppResult<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let response = self.client.post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(AppError::CaptionBackend(format!(
                "Messages request failed. Status: {}, Body: {}",
                status, error_body
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(AppError::HttpClient)?;
        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| AppError::CaptionBackend("Response contained no text content".to_string()))
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn describe_image(&self, image_base64: &str, media_type: &str) -> AppResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: DESCRIBE_MAX_TOKENS,
            temperature: None,
            messages: vec![Message {
                role: "user",
                content: MessageContent::Blocks(vec![
                    ContentBlock::Text { text: DESCRIBE_INSTRUCTION },
                    ContentBlock::Image {
                        source: ImageSource { kind: "base64", media_type, data: image_base64 },
                    },
                ]),
            }],
        };
        self.send(&request).await
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f64) -> AppResult<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature: Some(temperature),
            messages: vec![Message { role: "user", content: MessageContent::Text(prompt) }],
        };
        self.send(&request).await
    }
}
