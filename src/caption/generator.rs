//! Caption pipeline: image description, templated caption request and the
//! local fallbacks that keep a post going when the language model is down.
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::phrases::PhrasePicker;
use super::template::{CaptionTemplate, TemplateInputs};
use super::{Generated, LanguageModel};
use crate::error::{AppError, AppResult};
use crate::utils::hashtags;

pub const IMAGE_DESCRIPTION_FALLBACK: &str = "An amazing image";
pub const NO_IMAGE_DESCRIPTION: &str = "an amazing image";
pub const IMAGE_MEDIA_TYPE: &str = "image/png";
pub const CAPTION_TEMPERATURE: f64 = 0.8;
pub const DEFAULT_MAX_LENGTH: u32 = 2000;

pub struct CaptionGenerator {
    model: Box<dyn LanguageModel>,
    template: CaptionTemplate,
    phrases: PhrasePicker,
}

impl CaptionGenerator {
    pub fn new(model: Box<dyn LanguageModel>, template: CaptionTemplate, phrases: PhrasePicker) -> Self {
        CaptionGenerator { model, template, phrases }
    }

    pub fn phrases(&self) -> &PhrasePicker {
        &self.phrases
    }

    /// Describe the image with the vision model.
    ///
    /// Never fails: any error yields `Generated::Fallback` with a fixed text.
    pub async fn describe_image(&self, image_path: &Path) -> Generated<String> {
        match self.request_description(image_path).await {
            Ok(description) => Generated::Backend(description),
            Err(e) => {
                tracing::warn!("Failed to get image description for {}: {}", image_path.display(), e);
                Generated::Fallback(IMAGE_DESCRIPTION_FALLBACK.to_string())
            }
        }
    }

    async fn request_description(&self, image_path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(image_path).await?;
        let encoded = STANDARD.encode(bytes);
        self.model.describe_image(&encoded, IMAGE_MEDIA_TYPE).await
    }

    /// Produce a caption for `prompt`, optionally informed by the image.
    ///
    /// Never fails: on any error the caption is synthesized locally from a
    /// random opener, the prompt and a random closer.
    pub async fn generate(&self, prompt: &str, image_path: Option<&Path>, max_length: u32) -> Generated<String> {
        tracing::info!("Generating caption for prompt: {}", prompt);
        match self.request_caption(prompt, image_path, max_length).await {
            Ok(caption) => {
                tracing::info!("Caption generated successfully ({} chars)", caption.chars().count());
                Generated::Backend(caption)
            }
            Err(e) => {
                tracing::error!("Failed to generate caption: {}", e);
                Generated::Fallback(self.fallback_caption(prompt))
            }
        }
    }

    async fn request_caption(&self, prompt: &str, image_path: Option<&Path>, max_length: u32) -> AppResult<String> {
        let description = match image_path {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
                let described = self.describe_image(path).await;
                if !described.is_fallback() {
                    tracing::info!("Image description obtained");
                }
                described.into_inner()
            }
            _ => NO_IMAGE_DESCRIPTION.to_string(),
        };

        let opener = self.phrases.opener();
        let closer = self.phrases.closer();
        let rendered = self.template.render(&TemplateInputs {
            prompt,
            image_description: &description,
            opener: &opener,
            closer: &closer,
        })?;

        let text = self.model.complete(&rendered, max_length, CAPTION_TEMPERATURE).await?;
        let caption = text.trim();
        if caption.is_empty() {
            return Err(AppError::CaptionBackend("Model returned an empty caption".to_string()));
        }
        Ok(caption.to_string())
    }

    pub fn fallback_caption(&self, prompt: &str) -> String {
        format!("{} {} {}", self.phrases.opener(), prompt, self.phrases.closer())
    }

    pub fn add_hashtags<S: AsRef<str>>(&self, caption: &str, tags: &[S]) -> String {
        hashtags::append_hashtags(caption, tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        describe: usize,
        prompts: Vec<String>,
    }

    struct ScriptedModel {
        description: Option<String>,
        caption: Option<String>,
        calls: Arc<Mutex<Calls>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn describe_image(&self, image_base64: &str, media_type: &str) -> AppResult<String> {
            assert_eq!(media_type, IMAGE_MEDIA_TYPE);
            assert!(!image_base64.is_empty());
            self.calls.lock().unwrap().describe += 1;
            self.description
                .clone()
                .ok_or_else(|| AppError::CaptionBackend("vision down".to_string()))
        }

        async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f64) -> AppResult<String> {
            assert_eq!(temperature, CAPTION_TEMPERATURE);
            assert!(max_tokens > 0);
            self.calls.lock().unwrap().prompts.push(prompt.to_string());
            self.caption
                .clone()
                .ok_or_else(|| AppError::CaptionBackend("text down".to_string()))
        }
    }

    fn generator(description: Option<&str>, caption: Option<&str>, template: &str) -> (CaptionGenerator, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let model = ScriptedModel {
            description: description.map(String::from),
            caption: caption.map(String::from),
            calls: calls.clone(),
        };
        let phrases = PhrasePicker::new(vec!["OPEN".to_string()], vec!["CLOSE".to_string()], StdRng::seed_from_u64(3)).unwrap();
        (CaptionGenerator::new(Box::new(model), CaptionTemplate::new(template), phrases), calls)
    }

    #[tokio::test]
    async fn test_caption_uses_description_and_phrases() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        std::fs::write(&image, b"\x89PNG fake").unwrap();

        let (captions, calls) = generator(
            Some("a fox in snow"),
            Some("  Great caption  \n"),
            "{opener} | {prompt} | {image_description} | {closer}",
        );
        let caption = captions.generate("winter fox", Some(&image), DEFAULT_MAX_LENGTH).await;

        assert_eq!(caption, Generated::Backend("Great caption".to_string()));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.describe, 1);
        assert_eq!(calls.prompts, vec!["OPEN | winter fox | a fox in snow | CLOSE".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_image_skips_vision_call() {
        let (captions, calls) = generator(Some("unused"), Some("ok"), "{image_description}");
        let missing = Path::new("/definitely/not/here.png");
        let caption = captions.generate("p", Some(missing), 100).await;

        assert!(!caption.is_fallback());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.describe, 0);
        assert_eq!(calls.prompts, vec![NO_IMAGE_DESCRIPTION.to_string()]);
    }

    #[tokio::test]
    async fn test_describe_nonexistent_path_falls_back() {
        let (captions, calls) = generator(Some("never"), None, "{prompt}");
        let described = captions.describe_image(Path::new("/nope/missing.png")).await;
        assert_eq!(described, Generated::Fallback(IMAGE_DESCRIPTION_FALLBACK.to_string()));
        assert_eq!(calls.lock().unwrap().describe, 0);
    }

    #[tokio::test]
    async fn test_vision_failure_still_produces_backend_caption() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        std::fs::write(&image, b"bytes").unwrap();

        let (captions, calls) = generator(None, Some("caption"), "{image_description}");
        let caption = captions.generate("p", Some(&image), 100).await;

        assert_eq!(caption, Generated::Backend("caption".to_string()));
        assert_eq!(calls.lock().unwrap().prompts, vec![IMAGE_DESCRIPTION_FALLBACK.to_string()]);
    }

    #[tokio::test]
    async fn test_backend_outage_yields_fallback_with_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        std::fs::write(&image, b"bytes").unwrap();

        let (captions, _) = generator(None, None, "{prompt}");
        let caption = captions.generate("neon city at dusk", Some(&image), 100).await;

        assert!(caption.is_fallback());
        assert_eq!(caption.value(), "OPEN neon city at dusk CLOSE");
    }

    #[tokio::test]
    async fn test_bad_template_yields_fallback() {
        let (captions, calls) = generator(None, Some("unused"), "{unknown_key}");
        let caption = captions.generate("lake", None, 100).await;

        assert!(caption.is_fallback());
        assert!(caption.value().contains("lake"));
        assert!(calls.lock().unwrap().prompts.is_empty());
    }

    #[tokio::test]
    async fn test_blank_model_answer_yields_fallback() {
        let (captions, _) = generator(None, Some("   "), "{prompt}");
        let caption = captions.generate("lake", None, 100).await;
        assert_eq!(caption, Generated::Fallback("OPEN lake CLOSE".to_string()));
    }

    #[test]
    fn test_add_hashtags_paragraph() {
        let (captions, _) = generator(None, None, "{prompt}");
        assert_eq!(captions.add_hashtags("Hello", &["#a", "b"]), "Hello\n\n#a #b");
    }
}
