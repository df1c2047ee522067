//! Post workflow: image → caption → publish, once or on a fixed schedule.
//!
//! A single run is strictly linear and aborts on the first error. The
//! scheduled loop never aborts: a failed iteration is logged, recorded in the
//! returned [`ScheduleReport`] and the loop moves on to the next slot.
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::Instrument;

use crate::caption::anthropic::AnthropicClient;
use crate::caption::phrases::PhrasePicker;
use crate::caption::template::CaptionTemplate;
use crate::caption::{CaptionGenerator, Generated};
use crate::config::{Config, ImageHostConfig};
use crate::error::AppResult;
use crate::image::client::HuggingFaceClient;
use crate::image::{ImageGenerator, ImageSize};
use crate::publish::{GraphClient, ImageHost, PlaceholderHost, PostResult, Publisher, StaticDriveHost};

/// Suspends the workflow between scheduled posts.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What every post in this process is made from.
#[derive(Debug, Clone)]
pub struct PostPlan {
    pub prompt: String,
    pub hashtags: Vec<String>,
    pub size: ImageSize,
    pub max_caption_length: u32,
    pub output_dir: PathBuf,
}

impl PostPlan {
    pub fn from_config(config: &Config) -> Self {
        PostPlan {
            prompt: config.image_generator.default_prompt.clone(),
            hashtags: config.instagram_poster.default_hashtags.clone(),
            size: config.image_generator.size(),
            max_caption_length: config.description_generator.max_length,
            output_dir: config.output_directory.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostOutcome {
    pub image_path: PathBuf,
    pub caption: Generated<String>,
    pub result: PostResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledFailure {
    /// 1-based position in the schedule.
    pub index: u32,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    pub attempted: u32,
    pub published: Vec<PostResult>,
    pub failures: Vec<ScheduledFailure>,
}

impl ScheduleReport {
    pub fn succeeded(&self) -> usize {
        self.published.len()
    }
}

pub struct Pipeline {
    images: Box<dyn ImageGenerator>,
    captions: CaptionGenerator,
    publisher: Box<dyn Publisher>,
    pause: Box<dyn Pause>,
    plan: PostPlan,
}

impl Pipeline {
    pub fn new(
        images: Box<dyn ImageGenerator>,
        captions: CaptionGenerator,
        publisher: Box<dyn Publisher>,
        pause: Box<dyn Pause>,
        plan: PostPlan,
    ) -> Self {
        Pipeline { images, captions, publisher, pause, plan }
    }

    /// Wire the real backends from configuration.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let images = HuggingFaceClient::new(
            config.endpoints.image_backend.clone(),
            config.image_generator.model_name.clone(),
            config.api_keys.huggingface.clone(),
            config.image_generator.style.clone(),
        );

        let model = AnthropicClient::new(
            config.endpoints.caption_backend.clone(),
            config.description_generator.model.clone(),
            config.api_keys.anthropic.clone(),
        );
        let captions = CaptionGenerator::new(
            Box::new(model),
            CaptionTemplate::new(config.description_generator.prompt_template.clone()),
            phrase_picker(config)?,
        );

        let publisher = graph_client(config)?;

        Ok(Pipeline::new(
            Box::new(images),
            captions,
            Box::new(publisher),
            Box::new(TokioPause),
            PostPlan::from_config(config),
        ))
    }

    pub fn plan(&self) -> &PostPlan {
        &self.plan
    }

    pub fn plan_mut(&mut self) -> &mut PostPlan {
        &mut self.plan
    }

    /// Generate, caption and publish one post.
    pub async fn run_single_post(&self) -> AppResult<PostOutcome> {
        let plan = &self.plan;

        let image_path = self.images.generate(&plan.prompt, &plan.output_dir, plan.size).await?;
        tracing::info!("Image generated: {}", image_path.display());

        let caption = self.captions
            .generate(&plan.prompt, Some(&image_path), plan.max_caption_length)
            .await;
        if caption.is_fallback() {
            tracing::warn!("Using fallback caption");
        }
        tracing::info!("Caption generated: {}...", preview(caption.value(), 50));

        let result = self.publisher.post(&image_path, caption.value(), &plan.hashtags).await?;
        tracing::info!("Posted successfully: {}", result.id);

        Ok(PostOutcome { image_path, caption, result })
    }

    /// Run `total_posts` posts with `interval` between consecutive ones.
    ///
    /// Sleeps exactly `total_posts - 1` times, including after a failed post.
    pub async fn run_scheduled(&self, total_posts: u32, interval: Duration) -> ScheduleReport {
        tracing::info!(
            "Starting scheduled workflow. Posts: {}, Frequency: {:.2}h",
            total_posts,
            interval.as_secs_f64() / 3600.0
        );

        let mut report = ScheduleReport::default();
        for index in 1..=total_posts {
            let span = tracing::info_span!("post", index, total = total_posts);
            async {
                tracing::info!("Executing scheduled post {}/{}", index, total_posts);
                report.attempted += 1;
                match self.run_single_post().await {
                    Ok(outcome) => report.published.push(outcome.result),
                    Err(e) => {
                        tracing::error!("Error in post {}: {}", index, e);
                        report.failures.push(ScheduledFailure { index, error: e.to_string() });
                    }
                }
            }
            .instrument(span)
            .await;

            if index < total_posts {
                log_next_post(interval);
                self.pause.pause(interval).await;
            }
        }

        tracing::info!(
            "Scheduled workflow finished: {} attempted, {} published, {} failed",
            report.attempted,
            report.succeeded(),
            report.failures.len()
        );
        report
    }
}

fn log_next_post(interval: Duration) {
    let next = chrono::Duration::from_std(interval)
        .ok()
        .and_then(|delta| Local::now().checked_add_signed(delta));
    match next {
        Some(at) => tracing::info!(
            "Next post scheduled at {}, sleeping for {:.2} hours",
            at.format("%Y-%m-%d %H:%M:%S"),
            interval.as_secs_f64() / 3600.0
        ),
        None => tracing::info!("Sleeping for {:?} before the next post", interval),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn phrase_picker(config: &Config) -> AppResult<PhrasePicker> {
    let settings = &config.description_generator;
    let defaults = PhrasePicker::with_defaults();
    let openers = settings.openers.clone().unwrap_or_else(|| defaults.openers().to_vec());
    let closers = settings.closers.clone().unwrap_or_else(|| defaults.closers().to_vec());
    PhrasePicker::new(openers, closers, StdRng::from_entropy())
}

/// Build the Graph API client with the configured image host.
pub fn graph_client(config: &Config) -> AppResult<GraphClient> {
    let host: Box<dyn ImageHost> = match &config.instagram_poster.image_host {
        ImageHostConfig::Placeholder { base_url } => Box::new(PlaceholderHost::new(base_url.clone())),
        ImageHostConfig::StaticDrive { directory, public_base_url } => {
            Box::new(StaticDriveHost::new(directory.clone(), public_base_url.clone()))
        }
    };
    let client = GraphClient::new(
        &config.endpoints.graph,
        &config.instagram_poster.api_version,
        config.api_keys.instagram.user_id.clone(),
        config.api_keys.instagram.access_token.clone(),
        host,
    )
    .with_publish_delay(config.instagram_poster.publish_delay()?);
    Ok(client)
}
