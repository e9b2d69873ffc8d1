use crate::config::ImageSize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub model_id: Option<String>,
    pub size: ImageSize,
    pub num_images: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationResponse {
    pub urls: Vec<String>,
    pub model: String,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpenAIImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: &'a str,
    pub n: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    #[serde(default)]
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}
