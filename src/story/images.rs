use crate::{config::ImageSize, models::ImageGenerationRequest, openai::ImageGenerator};
use std::sync::Arc;

/// Image model wrapper that never fails a request: errors become `None`.
pub struct Illustrator {
    images: Arc<dyn ImageGenerator>,
    model: String,
    size: ImageSize,
}

impl Illustrator {
    pub fn new(images: Arc<dyn ImageGenerator>, model: impl Into<String>, size: ImageSize) -> Self {
        Self {
            images,
            model: model.into(),
            size,
        }
    }

    pub async fn generate_image_url(&self, prompt: &str) -> Option<String> {
        let request = ImageGenerationRequest {
            prompt: prompt.to_string(),
            model_id: Some(self.model.clone()),
            size: self.size,
            num_images: 1,
        };

        match self.images.generate(request).await {
            Ok(response) => {
                let url = response.urls.into_iter().next();
                if url.is_none() {
                    log::warn!("Image model {} returned no URL", self.model);
                }
                url
            }
            Err(e) => {
                log::warn!("Image generation failed: {}", e);
                None
            }
        }
    }
}
