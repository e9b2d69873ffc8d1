use super::fallback::fallback_story;
use super::parse::extract_json_payload;
use super::text_utils::count_self_choice_indicators;
use crate::{
    config::{Config, CostMode},
    error::{Result, StoryError},
    models::{Story, StoryInput, StoryOutcome, TextGenerationRequest},
    openai::TextGenerator,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 2;
pub const STORY_CHAPTERS: usize = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(300);

const STORY_SYSTEM_PROMPT: &str =
    "너는 4~7세 아이를 위한 한국어 그림책 작가야. 항상 요청된 스키마의 JSON 객체 하나만 출력해.";

pub fn build_story_prompt(input: &StoryInput) -> String {
    let StoryInput {
        name,
        age,
        gender,
        topic,
    } = input;

    format!(
        r#"아래 정보로 아이를 위한 짧은 한국어 그림책 이야기를 만들어 주세요.

- 주인공 이름: {name}
- 나이: {age}살
- 성별: {gender}
- 훈육 주제: {topic}

규칙:
1. 설명, 마크다운, 코드 블록 없이 아래 스키마와 똑같은 JSON 객체 하나만 출력하세요.
{{
  "title": "이야기 제목",
  "character": "주인공을 소개하는 한 문장",
  "chapters": [
    {{"title": "장 제목", "paragraph": "본문", "illustration": "삽화 힌트"}}
  ],
  "ending": "이야기를 마무리하는 한 문장"
}}
2. chapters는 정확히 5개입니다. 평범한 시작 → 문제 발견 → 갈등이 커짐 → {name}의 선택 → 따뜻한 마무리 순서로 긴장이 점점 높아지게 하세요.
3. 각 paragraph는 2~4문장입니다. 교훈을 말로 설명하지 말고 행동, 대화, 감각 묘사로 보여 주세요.
4. '{topic}'을(를) 의인화한 캐릭터 하나와 {name}을(를) 곁에서 돕는 조력자 캐릭터 하나를 등장시키세요.
5. {name}이(가) 스스로 고르고 직접 해 보는 장면을 꼭 넣으세요. (예: 스스로, 해 봤어요, 조심조심, 한 입 더)
6. illustration은 장면을 그림으로 설명하는 짧은 힌트입니다. 글자, 간판, 말풍선이 그림에 들어가지 않게 쓰세요."#
    )
}

/// Validates one raw completion. Accepts only an object with at least five chapters whose
/// first five paragraphs contain a self-choice keyword; extra chapters are dropped.
pub fn accept_story(raw: &str) -> Result<Story> {
    let value = extract_json_payload(raw)
        .ok_or_else(|| StoryError::ResponseError("no JSON object in completion".into()))?;

    let map = value
        .as_object()
        .ok_or_else(|| StoryError::ResponseError("completion JSON is not an object".into()))?;

    let chapters = map
        .get("chapters")
        .and_then(Value::as_array)
        .ok_or_else(|| StoryError::ResponseError("chapters missing or not a list".into()))?;

    if chapters.len() < STORY_CHAPTERS {
        return Err(StoryError::ResponseError(format!(
            "expected {} chapters, got {}",
            STORY_CHAPTERS,
            chapters.len()
        )));
    }

    let paragraphs: String = chapters
        .iter()
        .take(STORY_CHAPTERS)
        .filter_map(|c| c.get("paragraph").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    if count_self_choice_indicators(&paragraphs) == 0 {
        return Err(StoryError::ResponseError(
            "no self-choice indicator in chapter paragraphs".into(),
        ));
    }

    let mut story: Story = serde_json::from_value(value)?;
    story.chapters.truncate(STORY_CHAPTERS);
    Ok(story)
}

/// Runs the bounded attempt loop against the text model and falls back to the canned story.
pub struct StoryGenerator {
    text: Arc<dyn TextGenerator>,
    config: Arc<Config>,
    retry_delay: Duration,
}

impl StoryGenerator {
    pub fn new(text: Arc<dyn TextGenerator>, config: Arc<Config>) -> Self {
        Self {
            text,
            config,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub async fn generate(&self, input: &StoryInput, mode: CostMode, attempts: u32) -> StoryOutcome {
        let params = self.config.generation_params(mode);
        let prompt = build_story_prompt(input);

        for attempt in 1..=attempts {
            let request = TextGenerationRequest {
                prompt: prompt.clone(),
                system: Some(STORY_SYSTEM_PROMPT.to_string()),
                max_tokens: Some(params.max_tokens),
                temperature: Some(params.temperature),
                model_id: Some(params.model.clone()),
                json_mode: true,
            };

            let outcome = match self.text.generate(request).await {
                Ok(response) => accept_story(&response.text),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(story) => {
                    log::info!(
                        "Story generated on attempt {}/{} ({} mode, {})",
                        attempt,
                        attempts,
                        mode.as_str(),
                        params.model
                    );
                    return StoryOutcome::Generated(story);
                }
                Err(e) => {
                    log::warn!("Story attempt {}/{} rejected: {}", attempt, attempts, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }

        log::warn!(
            "All {} story attempts failed, serving fallback story for {}",
            attempts,
            input.name
        );
        StoryOutcome::Fallback(fallback_story(&input.name, &input.age, &input.gender))
    }
}
