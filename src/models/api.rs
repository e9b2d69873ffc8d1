use super::{CharacterProfile, IllustratedStory, StorySource};
use crate::config::CostMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `/generate-story` and `/generate-full`. Fields stay loose so `age: 7` and
/// `age: "7"` both work.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoryRequestBody {
    pub name: Option<Value>,
    pub age: Option<Value>,
    pub gender: Option<Value>,
    pub topic: Option<Value>,
    pub education_goal: Option<Value>,
    pub cost_mode: Option<Value>,
}

/// Trimmed, validated story inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryInput {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub topic: String,
}

pub(crate) fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

impl StoryRequestBody {
    pub fn input(&self) -> StoryInput {
        let topic = match field_text(self.topic.as_ref()) {
            t if t.is_empty() => field_text(self.education_goal.as_ref()),
            t => t,
        };
        StoryInput {
            name: field_text(self.name.as_ref()),
            age: field_text(self.age.as_ref()),
            gender: field_text(self.gender.as_ref()),
            topic,
        }
    }

    pub fn cost_mode_or(&self, default: CostMode) -> CostMode {
        CostMode::parse_or(Some(&field_text(self.cost_mode.as_ref())), default)
    }
}

impl StoryInput {
    pub fn is_complete(&self) -> bool {
        !(self.name.is_empty()
            || self.age.is_empty()
            || self.gender.is_empty()
            || self.topic.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateImageBody {
    pub character_profile: Option<Value>,
    pub image_description: Option<Value>,
    pub scene_index: Option<Value>,
}

impl GenerateImageBody {
    pub fn scene_index(&self) -> usize {
        match &self.scene_index {
            Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or(1),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(1),
            _ => 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub title: String,
    pub character_profile: CharacterProfile,
    pub story_paragraphs: Vec<String>,
    pub image_descriptions: Vec<String>,
    pub image_prompts: Vec<String>,
    pub ending: String,
    pub cost_mode: CostMode,
    pub story_source: StorySource,
}

#[derive(Debug, Serialize)]
pub struct FullChapter {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FullStoryResponse {
    pub title: String,
    pub character_profile: CharacterProfile,
    pub chapters: Vec<FullChapter>,
    pub story_paragraphs: Vec<String>,
    pub image_descriptions: Vec<String>,
    pub image_prompts: Vec<String>,
    pub image_urls: Vec<Option<String>>,
    pub ending: String,
    pub cost_mode: CostMode,
    pub story_source: StorySource,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image_url: String,
    pub prompt_used: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub story_model_preview: String,
    pub story_model_full: String,
    pub image_model: String,
    pub image_size: String,
    pub timeout: f64,
    pub retries: u32,
}

impl StoryResponse {
    pub fn from_illustrated(illustrated: IllustratedStory, cost_mode: CostMode) -> Self {
        let IllustratedStory {
            profile,
            story,
            source,
            scenes,
        } = illustrated;
        StoryResponse {
            title: story.title,
            character_profile: profile,
            story_paragraphs: story.chapters.into_iter().map(|c| c.paragraph).collect(),
            image_descriptions: scenes.iter().map(|s| s.image_description.clone()).collect(),
            image_prompts: scenes.into_iter().map(|s| s.image_prompt).collect(),
            ending: story.ending,
            cost_mode,
            story_source: source,
        }
    }
}

impl FullStoryResponse {
    pub fn from_illustrated(illustrated: IllustratedStory, cost_mode: CostMode) -> Self {
        let IllustratedStory {
            profile,
            story,
            source,
            scenes,
        } = illustrated;

        let chapters = story
            .chapters
            .iter()
            .zip(scenes.iter())
            .map(|(chapter, scene)| FullChapter {
                title: chapter.title.clone(),
                paragraphs: vec![chapter.paragraph.clone()],
                image_url: scene.image_url.clone(),
            })
            .collect();

        FullStoryResponse {
            title: story.title,
            character_profile: profile,
            chapters,
            story_paragraphs: story.chapters.into_iter().map(|c| c.paragraph).collect(),
            image_descriptions: scenes.iter().map(|s| s.image_description.clone()).collect(),
            image_prompts: scenes.iter().map(|s| s.image_prompt.clone()).collect(),
            image_urls: scenes.into_iter().map(|s| s.image_url).collect(),
            ending: story.ending,
            cost_mode,
            story_source: source,
        }
    }
}
