use super::text_utils::{strip_disallowed_chars, truncate_chars};
use crate::{
    models::{CharacterProfile, TextGenerationRequest},
    openai::TextGenerator,
};
use std::sync::Arc;

const SCENE_TEMPERATURE: f32 = 0.2;
const SCENE_MAX_TOKENS: u32 = 160;
const FALLBACK_CHARS: usize = 100;
const FALLBACK_SUFFIX: &str = ", 따뜻한 조명, 수채화 느낌";

const STYLE_CLAUSE: &str = "부드러운 수채화 그림책 스타일, 따뜻한 조명, 파스텔 색감.";
const CONSISTENCY_CLAUSE: &str =
    "캐릭터의 머리 모양, 눈, 옷, 신체 비율은 절대 바꾸지 마세요. 그림 안에 글자, 텍스트, 말풍선을 넣지 마세요.";

pub fn build_scene_prompt(
    paragraph: &str,
    profile: &CharacterProfile,
    scene_index: usize,
    previous_summary: &str,
) -> String {
    let previous = if previous_summary.trim().is_empty() {
        "(첫 장면입니다)"
    } else {
        previous_summary.trim()
    };

    format!(
        "지금까지의 이야기: {}\n\
         현재 장면({}번째): {}\n\
         주인공 외형: {}\n\n\
         위 장면을 그림으로 옮길 수 있도록 주인공의 감정, 행동, 배경, 조명을 담은 시각적 묘사를 \
         한국어 한 문장으로 써 주세요. 그림 속에 글자, 텍스트, 말풍선이 들어가지 않게 하고 문장만 출력하세요.",
        previous,
        scene_index,
        paragraph.trim(),
        profile.canonical()
    )
}

/// Non-model description: the start of the paragraph plus a fixed style hint.
pub fn fallback_scene_description(paragraph: &str) -> String {
    strip_disallowed_chars(&format!(
        "{}{}",
        truncate_chars(paragraph.trim(), FALLBACK_CHARS),
        FALLBACK_SUFFIX
    ))
}

/// Combines the canonical descriptor, the scene sentence, and fixed style and
/// consistency clauses. Pure: identical inputs give identical prompts.
pub fn build_image_prompt_kor(
    scene_sentence: &str,
    profile: &CharacterProfile,
    scene_index: usize,
) -> String {
    format!(
        "{}. scene {}: {} {} {}",
        profile.canonical(),
        scene_index,
        scene_sentence,
        STYLE_CLAUSE,
        CONSISTENCY_CLAUSE
    )
}

/// Turns one chapter paragraph into a single visual sentence.
pub struct SceneDescriber {
    text: Arc<dyn TextGenerator>,
    model: String,
}

impl SceneDescriber {
    pub fn new(text: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            text,
            model: model.into(),
        }
    }

    pub async fn describe(
        &self,
        paragraph: &str,
        profile: &CharacterProfile,
        scene_index: usize,
        previous_summary: &str,
    ) -> String {
        let request = TextGenerationRequest {
            prompt: build_scene_prompt(paragraph, profile, scene_index, previous_summary),
            system: None,
            max_tokens: Some(SCENE_MAX_TOKENS),
            temperature: Some(SCENE_TEMPERATURE),
            model_id: Some(self.model.clone()),
            json_mode: false,
        };

        match self.text.generate(request).await {
            Ok(response) => {
                let sentence = strip_disallowed_chars(&response.text);
                if sentence.is_empty() {
                    log::warn!("Scene {} description came back empty, using fallback", scene_index);
                    fallback_scene_description(paragraph)
                } else {
                    sentence
                }
            }
            Err(e) => {
                log::warn!("Scene {} description failed, using fallback: {}", scene_index, e);
                fallback_scene_description(paragraph)
            }
        }
    }
}
