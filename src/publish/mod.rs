//! Publishing to the social platform.
//!
//! - `instagram`: Graph API client (container create + publish, account info).
//! - `host`: where the local image gets a public URL before publishing.
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub mod host;
pub mod instagram;

pub use host::{ImageHost, PlaceholderHost, StaticDriveHost};
pub use instagram::GraphClient;

/// Publishes an image and caption as one post.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn post(&self, image_path: &Path, caption: &str, hashtags: &[String]) -> AppResult<PostResult>;
}

/// A staged, not yet visible post.
///
/// Deliberately neither `Clone` nor `Copy`: publishing takes it by value.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaContainer {
    id: String,
}

impl MediaContainer {
    pub(crate) fn new(id: String) -> Self {
        MediaContainer { id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Publish confirmation returned by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResult {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub media_count: Option<u64>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub follows_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_result_keeps_extra_fields() {
        let result: PostResult = serde_json::from_value(json!({"id": "1789", "permalink": "https://x"})).unwrap();
        assert_eq!(result.id, "1789");
        assert_eq!(result.extra.get("permalink"), Some(&json!("https://x")));
    }

    #[test]
    fn test_post_result_requires_id() {
        assert!(serde_json::from_value::<PostResult>(json!({"status": "ok"})).is_err());
    }

    #[test]
    fn test_account_info_tolerates_missing_fields() {
        let info: AccountInfo = serde_json::from_value(json!({"username": "studio", "media_count": 12})).unwrap();
        assert_eq!(info.username.as_deref(), Some("studio"));
        assert_eq!(info.media_count, Some(12));
        assert_eq!(info.followers_count, None);
    }
}
