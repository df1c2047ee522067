//! Caption generation.
//!
//! - `anthropic`: Messages API client implementing `LanguageModel`.
//! - `generator`: image description and caption pipeline with local fallbacks.
//! - `phrases`: opener/closer lists with an injectable RNG.
//! - `template`: `{placeholder}` rendering for the caption prompt.
use async_trait::async_trait;

use crate::error::AppResult;

pub mod anthropic;
pub mod generator;
pub mod phrases;
pub mod template;

pub use generator::CaptionGenerator;

/// Language-model backend used for image description and caption writing.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Ask a vision-capable model to describe a base64-encoded image.
    async fn describe_image(&self, image_base64: &str, media_type: &str) -> AppResult<String>;

    /// Single-turn text completion.
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f64) -> AppResult<String>;
}

/// A value that either came from the backend or from a local fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated<T> {
    Backend(T),
    Fallback(T),
}

impl<T> Generated<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Generated::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Generated::Backend(v) | Generated::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Generated::Backend(v) | Generated::Fallback(v) => v,
        }
    }
}
