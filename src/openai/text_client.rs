use super::{ApiTransport, TextGenerator};
use crate::{
    error::{Result, StoryError},
    models::{
        ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
        TextGenerationRequest, TextGenerationResponse,
    },
};
use async_trait::async_trait;

const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct TextClient {
    transport: ApiTransport,
}

impl TextClient {
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }

    fn build_payload(request: &TextGenerationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        ChatCompletionRequest {
            model: request
                .model_id
                .clone()
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TextGenerator for TextClient {
    async fn generate(&self, request: TextGenerationRequest) -> Result<TextGenerationResponse> {
        let payload = Self::build_payload(&request);

        log::info!("Invoking text model: {}", payload.model);
        log::debug!(
            "Text generation request: max_tokens={:?}, temperature={:?}, json_mode={}",
            payload.max_tokens,
            payload.temperature,
            request.json_mode
        );

        let response: ChatCompletionResponse = self
            .transport
            .post_json("/chat/completions", &payload)
            .await?;

        let usage = response.usage.as_ref();
        let tokens_prompt = usage.map(|u| u.prompt_tokens).unwrap_or(0);
        let tokens_generated = usage.map(|u| u.completion_tokens).unwrap_or(0);

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| StoryError::ResponseError("completion returned no choices".into()))?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(StoryError::ResponseError("completion content is empty".into()));
        }

        Ok(TextGenerationResponse {
            text,
            model: response.model.unwrap_or(payload.model),
            tokens_generated,
            tokens_prompt,
            finish_reason: choice.finish_reason,
        })
    }
}
