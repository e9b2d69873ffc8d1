use super::{ApiTransport, ImageGenerator};
use crate::{
    error::{Result, StoryError},
    models::{ImageGenerationRequest, ImageGenerationResponse, OpenAIImageRequest, OpenAIImageResponse},
};
use async_trait::async_trait;

const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

#[derive(Clone)]
pub struct ImageClient {
    transport: ApiTransport,
}

impl ImageClient {
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let model_id = request.model_id.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL);

        let payload = OpenAIImageRequest {
            model: model_id,
            prompt: &request.prompt,
            size: request.size.as_str(),
            n: request.num_images.max(1),
        };

        log::info!(
            "Generating image with model: {} ({})",
            model_id,
            request.size.as_str()
        );

        let response: OpenAIImageResponse = self
            .transport
            .post_json("/images/generations", &payload)
            .await?;

        let revised_prompt = response
            .data
            .first()
            .and_then(|d| d.revised_prompt.clone());
        let urls: Vec<String> = response.data.into_iter().filter_map(|d| d.url).collect();

        if urls.is_empty() {
            return Err(StoryError::ResponseError("No images generated".into()));
        }

        Ok(ImageGenerationResponse {
            urls,
            model: model_id.to_string(),
            revised_prompt,
        })
    }
}
