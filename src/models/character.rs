use serde::{Deserialize, Serialize};

/// Fixed visual traits of the story's main character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualProfile {
    /// Sentence reused verbatim in every image prompt of one story.
    pub canonical: String,
    pub hair: String,
    pub outfit: String,
    pub face: String,
    pub eyes: String,
    pub proportions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub style: String,
    pub visual: VisualProfile,
}

impl CharacterProfile {
    pub fn canonical(&self) -> &str {
        &self.visual.canonical
    }
}
