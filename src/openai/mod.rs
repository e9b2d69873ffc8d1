pub mod image_client;
pub mod text_client;

use crate::{
    config::Config,
    error::{Result, StoryError},
    models::{
        ImageGenerationRequest, ImageGenerationResponse, TextGenerationRequest,
        TextGenerationResponse,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;

pub use image_client::ImageClient;
pub use text_client::TextClient;

/// Anything that can answer a single text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: TextGenerationRequest) -> Result<TextGenerationResponse>;
}

/// Anything that can turn a prompt into hosted image URLs.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: ImageGenerationRequest) -> Result<ImageGenerationResponse>;
}

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);

/// Exponential backoff for retry `attempt` (0-based), capped at `MAX_RETRY_DELAY`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// Authenticated JSON transport shared by the text and image clients.
#[derive(Clone)]
pub struct ApiTransport {
    http: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl ApiTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoryError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// POSTs `body` to `path`, retrying connection failures, 429 and 5xx responses.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            match self.post_once(&url, body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    log::warn!(
                        "Request to {} failed (attempt {}/{}), retrying in {}ms: {}",
                        path,
                        attempt + 1,
                        self.max_retries.saturating_add(1),
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(StoryError::ApiError {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| StoryError::ResponseError(e.to_string()))
    }
}

fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| trimmed.chars().take(500).collect())
}

/// Text and image clients sharing one connection pool.
#[derive(Clone)]
pub struct OpenAIClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl OpenAIClient {
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ApiTransport::new(config)?;

        Ok(Self {
            text_client: TextClient::new(transport.clone()),
            image_client: ImageClient::new(transport),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{dev::ServerHandle, http::StatusCode, web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers call `n` with `statuses[n]`, repeating the last status once the list runs out.
    struct ScriptedUpstream {
        statuses: Vec<u16>,
        calls: AtomicUsize,
    }

    async fn scripted(state: web::Data<ScriptedUpstream>) -> HttpResponse {
        let call = state.calls.fetch_add(1, Ordering::SeqCst);
        let status = state
            .statuses
            .get(call)
            .or(state.statuses.last())
            .copied()
            .unwrap_or(200);
        HttpResponse::build(StatusCode::from_u16(status).unwrap()).json(json!({
            "call": call + 1,
            "error": {"message": format!("scripted {}", status)}
        }))
    }

    async fn start_upstream(statuses: Vec<u16>) -> (String, web::Data<ScriptedUpstream>, ServerHandle) {
        let state = web::Data::new(ScriptedUpstream {
            statuses,
            calls: AtomicUsize::new(0),
        });
        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/scripted", web::post().to(scripted))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}", addr), state, handle)
    }

    fn transport(base_url: &str, max_retries: u32) -> ApiTransport {
        let config = Config::new()
            .with_api_key("sk-test")
            .with_base_url(base_url)
            .with_max_retries(max_retries);
        ApiTransport::new(&config)
            .unwrap()
            .with_retry_base_delay(Duration::from_millis(1))
    }

    #[actix_web::test]
    async fn test_server_error_is_retried_until_success() {
        let (base_url, state, handle) = start_upstream(vec![503, 200]).await;

        let value: Value = transport(&base_url, 2)
            .post_json("/scripted", &json!({"ping": true}))
            .await
            .unwrap();

        assert_eq!(value["call"], 2);
        assert_eq!(state.calls.load(Ordering::SeqCst), 2);
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_client_error_is_not_retried() {
        let (base_url, state, handle) = start_upstream(vec![400]).await;

        let err = transport(&base_url, 2)
            .post_json::<_, Value>("/scripted", &json!({"ping": true}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoryError::ApiError { status: 400, .. }));
        assert_eq!(state.calls.load(Ordering::SeqCst), 1);
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_rate_limit_retries_stop_at_budget() {
        let (base_url, state, handle) = start_upstream(vec![429]).await;

        let err = transport(&base_url, 2)
            .post_json::<_, Value>("/scripted", &json!({"ping": true}))
            .await
            .unwrap_err();

        match err {
            StoryError::ApiError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "scripted 429");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(state.calls.load(Ordering::SeqCst), 3);
        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn test_connection_error_is_retried_then_surfaced() {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", closed.local_addr().unwrap());
        drop(closed);

        let err = transport(&base_url, 1)
            .post_json::<_, Value>("/scripted", &json!({"ping": true}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoryError::RequestError(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_message_prefers_api_message() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        assert_eq!(error_message(body), "Rate limit reached");
        assert_eq!(error_message("   "), "empty response body");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 12), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, 64), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(base, u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_transport_trims_base_url() {
        let config = Config::new()
            .with_api_key("sk-test")
            .with_base_url("http://localhost:9999/v1/");
        let transport = ApiTransport::new(&config).unwrap();
        assert_eq!(transport.base_url, "http://localhost:9999/v1");
    }
}
