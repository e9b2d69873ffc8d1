use crate::error::{Result, StoryError};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Image sizes accepted by the image model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }

    /// Anything outside the allow-list resolves to square.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "1792x1024" => ImageSize::Landscape,
            "1024x1792" => ImageSize::Portrait,
            _ => ImageSize::Square,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMode {
    Preview,
    Full,
}

impl CostMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostMode::Preview => "preview",
            CostMode::Full => "full",
        }
    }

    pub fn parse_or(value: Option<&str>, default: CostMode) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("preview") => CostMode::Preview,
            Some("full") => CostMode::Full,
            _ => default,
        }
    }
}

/// Model and sampling parameters for one story completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub story_model_preview: String,
    pub story_model_full: String,
    pub image_model: String,
    pub image_size: ImageSize,
    pub log_level: String,
    /// `pretty` (default), `plain`, `dev` or `json`.
    pub log_format: String,
    pub log_file: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            story_model_preview: "gpt-4o-mini".to_string(),
            story_model_full: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: ImageSize::Square,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            log_file: None,
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the process environment once at startup. Fails only when the API key is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StoryError::ConfigError("OPENAI_API_KEY is not set".into()))?;

        let timeout = lookup("OPENAI_TIMEOUT")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(defaults.timeout);

        Ok(Config {
            api_key,
            base_url: lookup("OPENAI_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            timeout,
            max_retries: lookup("OPENAI_MAX_RETRIES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_retries),
            story_model_preview: lookup("STORY_MODEL_PREVIEW").unwrap_or(defaults.story_model_preview),
            story_model_full: lookup("STORY_MODEL_FULL").unwrap_or(defaults.story_model_full),
            image_model: lookup("IMAGE_MODEL").unwrap_or(defaults.image_model),
            image_size: lookup("IMAGE_SIZE")
                .map(|s| ImageSize::parse_or_default(&s))
                .unwrap_or_default(),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|format| format.trim().to_lowercase())
                .filter(|format| !format.is_empty())
                .unwrap_or(defaults.log_format),
            log_file: lookup("LOG_FILE")
                .map(|path| path.trim().to_string())
                .filter(|path| !path.is_empty()),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|port| port.trim().parse().ok())
                .unwrap_or(defaults.port),
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_story_models(
        mut self,
        preview: impl Into<String>,
        full: impl Into<String>,
    ) -> Self {
        self.story_model_preview = preview.into();
        self.story_model_full = full.into();
        self
    }

    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn generation_params(&self, mode: CostMode) -> GenerationParams {
        match mode {
            CostMode::Preview => GenerationParams {
                model: self.story_model_preview.clone(),
                temperature: 0.2,
                max_tokens: 900,
            },
            CostMode::Full => GenerationParams {
                model: self.story_model_full.clone(),
                temperature: 0.35,
                max_tokens: 1200,
            },
        }
    }
}
