//! Instagram Graph API client.
//!
//! Posting is two requests: `POST /<user>/media` stages a container for an
//! image URL and caption, then `POST /<user>/media_publish` makes it visible.
//! There is no status polling between the two, only a fixed delay.
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::{AccountInfo, ImageHost, MediaContainer, PostResult, Publisher};
use crate::error::{AppError, AppResult};
use crate::utils::hashtags::append_hashtags;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v18.0";
pub const DEFAULT_PUBLISH_DELAY: Duration = Duration::from_secs(5);
pub const ACCOUNT_FIELDS: &str = "username,name,profile_picture_url,media_count,followers_count,follows_count";

#[derive(Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

pub struct GraphClient {
    client: Client,
    base_url: String,
    user_id: String,
    access_token: String,
    host: Box<dyn ImageHost>,
    publish_delay: Duration,
}

impl GraphClient {
    pub fn new(
        base_url: &str,
        api_version: &str,
        user_id: String,
        access_token: String,
        host: Box<dyn ImageHost>,
    ) -> Self {
        let base = format!("{}/{}", base_url.trim_end_matches('/'), api_version.trim_matches('/'));
        tracing::info!("Graph client initialized for user ID: {}", user_id);
        GraphClient {
            client: Client::new(),
            base_url: base,
            user_id,
            access_token,
            host,
            publish_delay: DEFAULT_PUBLISH_DELAY,
        }
    }

    /// Delay between creating a container and publishing it.
    pub fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    fn endpoint(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}/{}", self.base_url, self.user_id)
        } else {
            format!("{}/{}/{}", self.base_url, self.user_id, suffix)
        }
    }

    /// Stage a container for the image and caption.
    pub async fn create_media_container(&self, image_path: &Path, caption: &str) -> AppResult<MediaContainer> {
        let image_url = self.host.public_url(image_path).await?;
        let response = self.client.post(self.endpoint("media"))
            .form(&[
                ("image_url", image_url.as_str()),
                ("caption", caption),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        let response = expect_ok(response, "Failed to create media container").await?;
        let body: IdResponse = response.json().await.map_err(AppError::HttpClient)?;
        match body.id.filter(|id| !id.is_empty()) {
            Some(id) => {
                tracing::info!("Media container created: {}", id);
                Ok(MediaContainer::new(id))
            }
            None => {
                tracing::error!("Container ID not found in response");
                Err(AppError::Publishing("Container ID not found in response".to_string()))
            }
        }
    }

    /// Publish a staged container. Consumes it so it cannot be published twice.
    pub async fn publish_container(&self, container: MediaContainer) -> AppResult<PostResult> {
        tokio::time::sleep(self.publish_delay).await;

        let response = self.client.post(self.endpoint("media_publish"))
            .form(&[
                ("creation_id", container.id()),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        let response = expect_ok(response, "Failed to publish media").await?;
        let result: PostResult = response.json().await.map_err(AppError::HttpClient)?;
        tracing::info!("Media published successfully: {}", result.id);
        Ok(result)
    }

    /// Fetch profile metadata for the configured account.
    pub async fn account_info(&self) -> AppResult<AccountInfo> {
        let response = self.client.get(self.endpoint(""))
            .query(&[("fields", ACCOUNT_FIELDS), ("access_token", self.access_token.as_str())])
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        let response = expect_ok(response, "Failed to get account info").await?;
        let info: AccountInfo = response.json().await.map_err(AppError::HttpClient)?;
        tracing::info!("Retrieved account info for: {}", info.username.as_deref().unwrap_or("Unknown"));
        Ok(info)
    }
}

#[async_trait]
impl Publisher for GraphClient {
    async fn post(&self, image_path: &Path, caption: &str, hashtags: &[String]) -> AppResult<PostResult> {
        if !tokio::fs::try_exists(image_path).await.unwrap_or(false) {
            tracing::error!("Image file not found: {}", image_path.display());
            return Err(AppError::FileNotFound(image_path.to_path_buf()));
        }

        let full_caption = append_hashtags(caption, hashtags);
        tracing::info!("Preparing to post image: {}", image_path.display());
        tracing::info!("Caption length: {} characters", full_caption.chars().count());

        let container = self.create_media_container(image_path, &full_caption).await?;
        let result = self.publish_container(container).await?;
        tracing::info!("Successfully posted. Post ID: {}", result.id);
        Ok(result)
    }
}

/// The Graph API signals success with exactly 200.
async fn expect_ok(response: Response, context: &str) -> AppResult<Response> {
    if response.status() == StatusCode::OK {
        return Ok(response);
    }
    let status = response.status();
    let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
    let error_message = format!("{}. Status: {}, Body: {}", context, status, error_body);
    tracing::error!("{}", error_message);
    Err(AppError::Publishing(error_message))
}
