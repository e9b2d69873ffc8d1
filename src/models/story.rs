use super::CharacterProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryChapter {
    pub title: String,
    pub paragraph: String,
    /// The model's own textless illustration hint.
    pub illustration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Story {
    pub title: String,
    pub character: String,
    pub chapters: Vec<StoryChapter>,
    pub ending: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorySource {
    Generated,
    Fallback,
}

/// Where a story came from: the text model, or the canned story after every attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryOutcome {
    Generated(Story),
    Fallback(Story),
}

impl StoryOutcome {
    pub fn source(&self) -> StorySource {
        match self {
            StoryOutcome::Generated(_) => StorySource::Generated,
            StoryOutcome::Fallback(_) => StorySource::Fallback,
        }
    }

    pub fn story(&self) -> &Story {
        match self {
            StoryOutcome::Generated(story) | StoryOutcome::Fallback(story) => story,
        }
    }

    pub fn into_story(self) -> Story {
        match self {
            StoryOutcome::Generated(story) | StoryOutcome::Fallback(story) => story,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePrompt {
    pub image_description: String,
    pub image_prompt: String,
    pub image_url: Option<String>,
}

/// A story plus its per-chapter scene prompts, built once per request.
#[derive(Debug, Clone)]
pub struct IllustratedStory {
    pub profile: CharacterProfile,
    pub story: Story,
    pub source: StorySource,
    pub scenes: Vec<ScenePrompt>,
}
