//! Scripted stand-ins for the hosted text and image models.

use crate::{
    error::{Result, StoryError},
    models::{
        ImageGenerationRequest, ImageGenerationResponse, TextGenerationRequest,
        TextGenerationResponse,
    },
    openai::{ImageGenerator, TextGenerator},
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A story completion with `chapters` chapters, each paragraph carrying `keyword`.
pub fn story_json(chapters: usize, keyword: &str) -> String {
    let chapters: Vec<_> = (1..=chapters)
        .map(|i| {
            json!({
                "title": format!("{}장", i),
                "paragraph": format!("{}장에서 민수는 숲길을 걸으며 {} 노래를 불렀어요.", i, keyword),
                "illustration": format!("숲길을 걷는 아이 {}", i),
            })
        })
        .collect();

    json!({
        "title": "민수의 모험",
        "character": "여섯 살 민수",
        "chapters": chapters,
        "ending": "민수는 웃으며 잠들었어요."
    })
    .to_string()
}

/// Story requests (JSON mode) are answered from a queue; scene requests get `scene`
/// or fail when it is `None`.
pub struct MockText {
    stories: Mutex<VecDeque<Result<String>>>,
    scene: Option<String>,
    requests: Mutex<Vec<TextGenerationRequest>>,
}

impl MockText {
    pub fn new(stories: Vec<Result<String>>) -> Self {
        Self {
            stories: Mutex::new(stories.into()),
            scene: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_scene(mut self, scene: &str) -> Self {
        self.scene = Some(scene.to_string());
        self
    }

    pub fn requests(&self) -> Vec<TextGenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockText {
    async fn generate(&self, request: TextGenerationRequest) -> Result<TextGenerationResponse> {
        let json_mode = request.json_mode;
        self.requests.lock().unwrap().push(request);

        let text = if json_mode {
            self.stories
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StoryError::RequestError("no scripted story".into())))?
        } else {
            self.scene
                .clone()
                .ok_or_else(|| StoryError::ApiError { status: 503, message: "scene model down".into() })?
        };

        Ok(TextGenerationResponse {
            text,
            model: "mock".to_string(),
            tokens_generated: 0,
            tokens_prompt: 0,
            finish_reason: Some("stop".to_string()),
        })
    }
}

/// Returns `https://img.test/{n}.png` for call `n` (1-based), failing the calls in `fail_on`.
pub struct MockImages {
    fail_on: Vec<usize>,
    prompts: Mutex<Vec<String>>,
}

impl MockImages {
    pub fn new() -> Self {
        Self::failing_on(Vec::new())
    }

    pub fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            fail_on,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImages {
    async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(request.prompt);
            prompts.len()
        };

        if self.fail_on.contains(&call) {
            return Err(StoryError::ApiError {
                status: 400,
                message: "content policy violation".into(),
            });
        }

        Ok(ImageGenerationResponse {
            urls: vec![format!("https://img.test/{}.png", call)],
            model: request.model_id.unwrap_or_default(),
            revised_prompt: None,
        })
    }
}
