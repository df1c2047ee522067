//! Image generation backend.
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AppResult;

pub mod client;

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        ImageSize { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }
}

/// Turns a prompt into an image file on disk.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the path of the newly written image.
    async fn generate(&self, prompt: &str, output_dir: &Path, size: ImageSize) -> AppResult<PathBuf>;
}
