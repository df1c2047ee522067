//! Generate an image, caption it and publish it to Instagram.
//!
//! Modules:
//! - `image`: Hugging Face inference client that writes generated images to disk.
//! - `caption`: Anthropic-backed captioning with local fallbacks.
//! - `publish`: Graph API client plus the image hosts that give files a public URL.
//! - `workflow`: Single-post and scheduled runs wiring the three clients together.
//! - `utils`: Hashtag formatting shared by captioning and publishing.
//! - `config`: JSON configuration with environment overrides for credentials.
//! - `logging`: Console + log file subscriber setup.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `Pipeline`,
//! `HuggingFaceClient`, `CaptionGenerator` and `GraphClient`.
pub mod caption;
pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod publish;
pub mod utils;
pub mod workflow;

pub use caption::CaptionGenerator;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use image::client::HuggingFaceClient;
pub use publish::GraphClient;
pub use workflow::Pipeline;
