use super::{
    character::{build_character_profile, ensure_character_profile, profile_from_value},
    generator::{StoryGenerator, DEFAULT_ATTEMPTS},
    images::Illustrator,
    scene::{build_image_prompt_kor, SceneDescriber},
    text_utils::{strip_disallowed_chars, tail_chars},
};
use crate::{
    config::{Config, CostMode},
    error::{Result, StoryError},
    logger::Timer,
    models::{IllustratedStory, ImageResponse, ScenePrompt, StoryInput},
    openai::{ImageGenerator, OpenAIClient, TextGenerator},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const SUMMARY_CHARS: usize = 800;

/// Running summary of every paragraph already illustrated.
pub fn narrative_summary(previous: &[String]) -> String {
    tail_chars(&previous.join(" "), SUMMARY_CHARS)
}

/// Request-scoped story pipeline shared by all handlers.
pub struct StoryService {
    config: Arc<Config>,
    generator: StoryGenerator,
    describer: SceneDescriber,
    illustrator: Illustrator,
}

impl StoryService {
    pub fn new(
        config: Config,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            generator: StoryGenerator::new(text.clone(), config.clone()),
            describer: SceneDescriber::new(text, config.story_model_preview.clone()),
            illustrator: Illustrator::new(images, config.image_model.clone(), config.image_size),
            config,
        }
    }

    /// Wires the service to the hosted API described by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = OpenAIClient::new(&config)?;
        let text: Arc<dyn TextGenerator> = Arc::new(client.text().clone());
        let images: Arc<dyn ImageGenerator> = Arc::new(client.image().clone());
        Ok(Self::new(config, text, images))
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.generator = self.generator.with_retry_delay(delay);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the profile, the story and every chapter's scene prompt in order. With
    /// `with_images`, each chapter also gets an image; a failed image is `None`.
    pub async fn illustrate_story(
        &self,
        input: &StoryInput,
        mode: CostMode,
        with_images: bool,
    ) -> IllustratedStory {
        let _timer = Timer::new(&format!("story pipeline for {}", input.name));

        let profile = build_character_profile(&input.name, &input.age, &input.gender);
        let outcome = self.generator.generate(input, mode, DEFAULT_ATTEMPTS).await;
        let source = outcome.source();
        let story = outcome.into_story();

        let mut previous: Vec<String> = Vec::with_capacity(story.chapters.len());
        let mut scenes = Vec::with_capacity(story.chapters.len());

        for (idx, chapter) in story.chapters.iter().enumerate() {
            let scene_index = idx + 1;
            let summary = narrative_summary(&previous);

            let image_description = self
                .describer
                .describe(&chapter.paragraph, &profile, scene_index, &summary)
                .await;
            let image_prompt = build_image_prompt_kor(&image_description, &profile, scene_index);

            let image_url = if with_images {
                self.illustrator.generate_image_url(&image_prompt).await
            } else {
                None
            };

            log::debug!(
                "Scene {} ready (image: {})",
                scene_index,
                image_url.as_deref().unwrap_or("none")
            );

            scenes.push(ScenePrompt {
                image_description,
                image_prompt,
                image_url,
            });
            previous.push(chapter.paragraph.clone());
        }

        IllustratedStory {
            profile,
            story,
            source,
            scenes,
        }
    }

    /// Renders one scene for a profile handed back by the caller.
    pub async fn generate_single_image(
        &self,
        character_profile: Option<&Value>,
        image_description: &str,
        scene_index: usize,
    ) -> Result<ImageResponse> {
        let normalized = character_profile.and_then(ensure_character_profile);
        let description = strip_disallowed_chars(image_description);

        let normalized = match normalized {
            Some(value) if !description.is_empty() => value,
            _ => {
                return Err(StoryError::MissingFields(
                    "character_profile and image_description are required".into(),
                ))
            }
        };

        let profile = profile_from_value(&normalized);
        let prompt = build_image_prompt_kor(&description, &profile, scene_index);

        let image_url = self
            .illustrator
            .generate_image_url(&prompt)
            .await
            .ok_or_else(|| StoryError::ImageUnavailable("image API returned no URL".into()))?;

        Ok(ImageResponse {
            image_url,
            prompt_used: prompt,
        })
    }
}
