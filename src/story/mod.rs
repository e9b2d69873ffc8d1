pub mod character;
pub mod fallback;
pub mod generator;
pub mod images;
pub mod parse;
pub mod pipeline;
pub mod scene;
pub mod text_utils;

pub use character::{build_character_profile, ensure_character_profile, profile_from_value};
pub use fallback::fallback_story;
pub use generator::{accept_story, StoryGenerator, DEFAULT_ATTEMPTS, STORY_CHAPTERS};
pub use images::Illustrator;
pub use parse::extract_json_payload;
pub use pipeline::StoryService;
pub use scene::{build_image_prompt_kor, SceneDescriber};
pub use text_utils::{count_self_choice_indicators, strip_disallowed_chars};
