//! Public URLs for local images.
//!
//! The Graph API only accepts images by URL, so every post needs a host that
//! makes the generated file reachable from the internet.
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Make `image_path` publicly reachable and return its URL.
    async fn public_url(&self, image_path: &Path) -> AppResult<String>;
}

fn file_name(image_path: &Path) -> AppResult<String> {
    image_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::Hosting(format!("Image path has no usable file name: {}", image_path.display())))
}

/// Returns `<base_url>/<file name>` without uploading anything.
///
/// Useful against a backend that never fetches the URL, or when the output
/// directory is already served at `base_url`.
pub struct PlaceholderHost {
    base_url: String,
}

impl PlaceholderHost {
    pub fn new(base_url: String) -> Self {
        PlaceholderHost { base_url: base_url.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl ImageHost for PlaceholderHost {
    async fn public_url(&self, image_path: &Path) -> AppResult<String> {
        let url = format!("{}/{}", self.base_url, file_name(image_path)?);
        tracing::warn!("No upload performed for {}; using placeholder URL {}", image_path.display(), url);
        Ok(url)
    }
}

/// Copies images into a directory served by a static web server.
pub struct StaticDriveHost {
    directory: PathBuf,
    public_base_url: String,
}

impl StaticDriveHost {
    pub fn new(directory: PathBuf, public_base_url: String) -> Self {
        StaticDriveHost {
            directory,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageHost for StaticDriveHost {
    async fn public_url(&self, image_path: &Path) -> AppResult<String> {
        let name = file_name(image_path)?;
        tokio::fs::create_dir_all(&self.directory).await?;
        let target = self.directory.join(&name);
        let bytes = tokio::fs::copy(image_path, &target).await.map_err(|e| {
            AppError::Hosting(format!("Failed to copy {} to {}: {}", image_path.display(), target.display(), e))
        })?;
        tracing::info!("Copied {} ({} bytes) to static drive", name, bytes);
        Ok(format!("{}/{}", self.public_base_url, name))
    }
}
