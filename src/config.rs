//! Configuration for the pipeline.
//!
//! Settings come from a JSON file; credentials can be overridden from the
//! process environment. `dotenv` is loaded on demand by the binary so a local
//! `.env` file feeds those overrides. Everything except credentials, the
//! image model, the default prompt and the caption template has a default.
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::caption::anthropic;
use crate::error::{AppError, AppResult};
use crate::image::{ImageSize, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::logging::LoggingConfig;
use crate::publish::instagram;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

pub const ENV_HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_INSTAGRAM_ACCESS_TOKEN: &str = "INSTAGRAM_ACCESS_TOKEN";
pub const ENV_INSTAGRAM_USER_ID: &str = "INSTAGRAM_USER_ID";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_keys: ApiKeys,
    pub image_generator: ImageGeneratorConfig,
    pub description_generator: DescriptionGeneratorConfig,
    #[serde(default)]
    pub instagram_poster: PosterConfig,
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub huggingface: String,
    #[serde(default)]
    pub anthropic: String,
    #[serde(default)]
    pub instagram: InstagramKeys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstagramKeys {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageGeneratorConfig {
    pub model_name: String,
    #[serde(default = "default_style")]
    pub style: String,
    pub default_prompt: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl ImageGeneratorConfig {
    pub fn size(&self) -> ImageSize {
        ImageSize { width: self.width, height: self.height }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionGeneratorConfig {
    pub prompt_template: String,
    #[serde(default = "default_caption_model")]
    pub model: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default)]
    pub openers: Option<Vec<String>>,
    #[serde(default)]
    pub closers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PosterConfig {
    #[serde(default)]
    pub default_hashtags: Vec<String>,
    #[serde(default = "default_post_frequency_hours")]
    pub post_frequency_hours: f64,
    #[serde(default = "default_scheduled_posts_count")]
    pub scheduled_posts_count: u32,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_publish_delay_secs")]
    pub publish_delay_secs: f64,
    #[serde(default)]
    pub image_host: ImageHostConfig,
}

impl Default for PosterConfig {
    fn default() -> Self {
        PosterConfig {
            default_hashtags: Vec::new(),
            post_frequency_hours: default_post_frequency_hours(),
            scheduled_posts_count: default_scheduled_posts_count(),
            api_version: default_api_version(),
            publish_delay_secs: default_publish_delay_secs(),
            image_host: ImageHostConfig::default(),
        }
    }
}

impl PosterConfig {
    /// Interval between scheduled posts.
    pub fn post_interval(&self) -> AppResult<Duration> {
        Duration::try_from_secs_f64(self.post_frequency_hours * 3600.0).map_err(|e| {
            AppError::Config(format!(
                "instagram_poster.post_frequency_hours is invalid ({}): {}",
                self.post_frequency_hours, e
            ))
        })
    }

    pub fn publish_delay(&self) -> AppResult<Duration> {
        Duration::try_from_secs_f64(self.publish_delay_secs).map_err(|e| {
            AppError::Config(format!(
                "instagram_poster.publish_delay_secs is invalid ({}): {}",
                self.publish_delay_secs, e
            ))
        })
    }
}

/// Where generated images are made publicly reachable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageHostConfig {
    Placeholder {
        #[serde(default = "default_placeholder_base_url")]
        base_url: String,
    },
    StaticDrive {
        directory: PathBuf,
        public_base_url: String,
    },
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        ImageHostConfig::Placeholder { base_url: default_placeholder_base_url() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_image_backend")]
    pub image_backend: String,
    #[serde(default = "default_caption_backend")]
    pub caption_backend: String,
    #[serde(default = "default_graph")]
    pub graph: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            image_backend: default_image_backend(),
            caption_backend: default_caption_backend(),
            graph: default_graph(),
        }
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_style() -> String {
    "digital art".to_string()
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_caption_model() -> String {
    "claude-3-opus-20240229".to_string()
}

fn default_max_length() -> u32 {
    crate::caption::generator::DEFAULT_MAX_LENGTH
}

fn default_post_frequency_hours() -> f64 {
    24.0
}

fn default_scheduled_posts_count() -> u32 {
    5
}

fn default_api_version() -> String {
    instagram::DEFAULT_API_VERSION.to_string()
}

fn default_publish_delay_secs() -> f64 {
    instagram::DEFAULT_PUBLISH_DELAY.as_secs_f64()
}

fn default_placeholder_base_url() -> String {
    "https://example.com/temp_images".to_string()
}

fn default_image_backend() -> String {
    crate::image::client::DEFAULT_BASE_URL.to_string()
}

fn default_caption_backend() -> String {
    anthropic::DEFAULT_BASE_URL.to_string()
}

fn default_graph() -> String {
    instagram::DEFAULT_BASE_URL.to_string()
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    /// Read, parse, apply environment overrides and validate.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let mut config = Config::from_json(&raw)?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Replace credentials with non-empty values from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_HUGGINGFACE_API_KEY) {
            self.api_keys.huggingface = v;
        }
        if let Some(v) = get(ENV_ANTHROPIC_API_KEY) {
            self.api_keys.anthropic = v;
        }
        if let Some(v) = get(ENV_INSTAGRAM_ACCESS_TOKEN) {
            self.api_keys.instagram.access_token = v;
        }
        if let Some(v) = get(ENV_INSTAGRAM_USER_ID) {
            self.api_keys.instagram.user_id = v;
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.image_generator.model_name.trim().is_empty() {
            return Err(AppError::Config("image_generator.model_name must not be empty".to_string()));
        }
        if self.image_generator.default_prompt.trim().is_empty() {
            return Err(AppError::Config("image_generator.default_prompt must not be empty".to_string()));
        }
        if self.image_generator.width == 0 || self.image_generator.height == 0 {
            return Err(AppError::Config("image_generator width and height must be positive".to_string()));
        }
        if self.description_generator.prompt_template.trim().is_empty() {
            return Err(AppError::Config("description_generator.prompt_template must not be empty".to_string()));
        }
        if self.description_generator.max_length == 0 {
            return Err(AppError::Config("description_generator.max_length must be positive".to_string()));
        }
        for (name, list) in [
            ("openers", &self.description_generator.openers),
            ("closers", &self.description_generator.closers),
        ] {
            if matches!(list, Some(items) if items.is_empty()) {
                return Err(AppError::Config(format!("description_generator.{} must not be empty when set", name)));
            }
        }
        self.instagram_poster.post_interval()?;
        self.instagram_poster.publish_delay()?;
        Ok(())
    }

    /// Log which credentials are present without revealing them.
    pub fn log_summary(&self) {
        let keys = [
            ("huggingface", &self.api_keys.huggingface),
            ("anthropic", &self.api_keys.anthropic),
            ("instagram.access_token", &self.api_keys.instagram.access_token),
            ("instagram.user_id", &self.api_keys.instagram.user_id),
        ];
        for (name, value) in keys {
            if value.is_empty() {
                tracing::warn!("Credential {} is not set", name);
            } else {
                tracing::info!("Credential {}: {}", name, mask(value));
            }
        }
        tracing::info!(
            "Image model: {}, caption model: {}, output directory: {}",
            self.image_generator.model_name,
            self.description_generator.model,
            self.output_directory.display()
        );
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
