pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod openai;
pub mod server;
pub mod story;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, CostMode, GenerationParams, ImageSize};
pub use error::{Result, StoryError};
pub use models::{CharacterProfile, ScenePrompt, Story, StoryChapter, StoryInput, StoryOutcome, StorySource};
pub use openai::{ImageClient, ImageGenerator, OpenAIClient, TextClient, TextGenerator};
pub use story::StoryService;
