use crate::{
    config::CostMode,
    error::{Result, StoryError},
    models::{
        api::field_text, FullStoryResponse, GenerateImageBody, HealthResponse, StoryRequestBody,
        StoryResponse,
    },
    story::StoryService,
};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use uuid::Uuid;

const STORY_FIELDS_MESSAGE: &str = "name, age, gender, topic are required";

fn parse_body<T: DeserializeOwned + Default>(body: &[u8], request_id: &str) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        log::warn!("[req:{}] Unreadable JSON body: {}", request_id, e);
        T::default()
    })
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Endpoint boundary: logs every failure and turns panics into a 500.
async fn guarded<F>(request_id: &str, endpoint: &str, work: F) -> Result<HttpResponse>
where
    F: Future<Output = Result<HttpResponse>>,
{
    match AssertUnwindSafe(work).catch_unwind().await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e @ StoryError::MissingFields(_))) => {
            log::warn!("[req:{}] {} rejected: {}", request_id, endpoint, e);
            Err(e)
        }
        Ok(Err(e)) => {
            log::error!("[req:{}] {} failed: {:?}", request_id, endpoint, e);
            Err(e)
        }
        Err(panic) => {
            let detail = panic_detail(panic.as_ref());
            log::error!("[req:{}] {} panicked: {}", request_id, endpoint, detail);
            Err(StoryError::InternalError(detail))
        }
    }
}

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true, "ts": Utc::now().timestamp() }))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

pub async fn health(service: web::Data<StoryService>) -> HttpResponse {
    let config = service.config();
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        story_model_preview: config.story_model_preview.clone(),
        story_model_full: config.story_model_full.clone(),
        image_model: config.image_model.clone(),
        image_size: config.image_size.as_str().to_string(),
        timeout: config.timeout.as_secs_f64(),
        retries: config.max_retries,
    })
}

async fn story_endpoint(
    service: web::Data<StoryService>,
    body: web::Bytes,
    endpoint: &str,
    default_mode: CostMode,
    with_images: bool,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4().to_string();
    let payload: StoryRequestBody = parse_body(&body, &request_id);

    guarded(&request_id, endpoint, async {
        let input = payload.input();
        if !input.is_complete() {
            return Err(StoryError::MissingFields(STORY_FIELDS_MESSAGE.into()));
        }

        let mode = payload.cost_mode_or(default_mode);
        log::info!(
            "[req:{}] {} for {} (topic: {}, mode: {})",
            request_id,
            endpoint,
            input.name,
            input.topic,
            mode.as_str()
        );

        let illustrated = service.illustrate_story(&input, mode, with_images).await;
        let response = if with_images {
            HttpResponse::Ok().json(FullStoryResponse::from_illustrated(illustrated, mode))
        } else {
            HttpResponse::Ok().json(StoryResponse::from_illustrated(illustrated, mode))
        };
        Ok(response)
    })
    .await
}

pub async fn generate_story(
    service: web::Data<StoryService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    story_endpoint(service, body, "/generate-story", CostMode::Preview, false).await
}

pub async fn generate_full(
    service: web::Data<StoryService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    story_endpoint(service, body, "/generate-full", CostMode::Full, true).await
}

pub async fn generate_image(
    service: web::Data<StoryService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let request_id = Uuid::new_v4().to_string();
    let payload: GenerateImageBody = parse_body(&body, &request_id);

    guarded(&request_id, "/generate-image", async {
        let description = field_text(payload.image_description.as_ref());
        let scene_index = payload.scene_index();
        log::info!("[req:{}] /generate-image for scene {}", request_id, scene_index);

        let response = service
            .generate_single_image(payload.character_profile.as_ref(), &description, scene_index)
            .await?;
        Ok(HttpResponse::Ok().json(response))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ImageSize};
    use crate::server::configure;
    use crate::testing::{story_json, MockImages, MockText};
    use actix_web::{http::StatusCode, test as actix_test, App};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    fn service(text: MockText, images: MockImages) -> StoryService {
        let config = Config::new()
            .with_api_key("sk-test")
            .with_story_models("mini", "big")
            .with_image_size(ImageSize::Landscape);
        StoryService::new(config, Arc::new(text), Arc::new(images)).with_retry_delay(Duration::ZERO)
    }

    fn story_body() -> Value {
        json!({"name": "민수", "age": 6, "gender": "남자", "topic": "편식"})
    }

    macro_rules! app {
        ($service:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new($service))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_root_and_health() {
        let app = app!(service(MockText::new(vec![]), MockImages::new()));

        let resp: Value =
            actix_test::call_and_read_body_json(&app, actix_test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp["ok"], true);
        assert!(resp["ts"].as_i64().unwrap() > 0);

        let resp: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/health").to_request(),
        )
        .await;
        assert_eq!(resp["status"], "ok");
        assert_eq!(resp["story_model_preview"], "mini");
        assert_eq!(resp["story_model_full"], "big");
        assert_eq!(resp["image_size"], "1792x1024");
        assert_eq!(resp["retries"], 2);
        assert_eq!(resp["timeout"], 60.0);
    }

    #[actix_web::test]
    async fn test_preflight() {
        let app = app!(service(MockText::new(vec![]), MockImages::new()));
        for path in ["/generate-story", "/generate-full", "/generate-image"] {
            let req = actix_test::TestRequest::default()
                .method(actix_web::http::Method::OPTIONS)
                .uri(path)
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = actix_test::read_body_json(resp).await;
            assert_eq!(body, json!({"ok": true}));
        }
    }

    #[actix_web::test]
    async fn test_generate_story_missing_fields() {
        let app = app!(service(MockText::new(vec![]), MockImages::new()));

        let req = actix_test::TestRequest::post()
            .uri("/generate-story")
            .set_json(json!({"name": "민수", "age": " ", "gender": "남자"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = actix_test::read_body_json(resp).await;
        let message = body["error"].as_str().unwrap();
        for field in ["name", "age", "gender", "topic"] {
            assert!(message.contains(field));
        }
    }

    #[actix_web::test]
    async fn test_generate_story_rejects_unreadable_body() {
        let app = app!(service(MockText::new(vec![]), MockImages::new()));
        let req = actix_test::TestRequest::post()
            .uri("/generate-story")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_generate_story_success() {
        let text = MockText::new(vec![Ok(story_json(5, "스스로"))]).with_scene("식탁 앞의 아이");
        let app = app!(service(text, MockImages::new()));

        let req = actix_test::TestRequest::post()
            .uri("/generate-story")
            .set_json(story_body())
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["title"], "민수의 모험");
        assert_eq!(body["cost_mode"], "preview");
        assert_eq!(body["story_source"], "generated");
        for key in ["story_paragraphs", "image_descriptions", "image_prompts"] {
            assert_eq!(body[key].as_array().unwrap().len(), 5, "{}", key);
        }
        assert_eq!(body["image_descriptions"][0], "식탁 앞의 아이");
        assert!(body.get("image_urls").is_none());

        let canonical = body["character_profile"]["visual"]["canonical"].as_str().unwrap();
        for prompt in body["image_prompts"].as_array().unwrap() {
            assert!(prompt.as_str().unwrap().starts_with(canonical));
        }
    }

    #[actix_web::test]
    async fn test_generate_full_with_unreachable_model() {
        let app = app!(service(MockText::new(vec![]), MockImages::failing_on(vec![3])));

        let req = actix_test::TestRequest::post()
            .uri("/generate-full")
            .set_json(json!({
                "name": "지우", "age": "5", "gender": "여자",
                "education_goal": "양치하기", "cost_mode": "unknown"
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(resp).await;

        assert_eq!(body["cost_mode"], "full");
        assert_eq!(body["story_source"], "fallback");
        for key in [
            "chapters",
            "story_paragraphs",
            "image_descriptions",
            "image_prompts",
            "image_urls",
        ] {
            assert_eq!(body[key].as_array().unwrap().len(), 5, "{}", key);
        }

        let urls = body["image_urls"].as_array().unwrap();
        assert!(urls[2].is_null());
        assert_eq!(urls.iter().filter(|u| u.is_string()).count(), 4);
        assert!(body["chapters"][2]["image_url"].is_null());
        assert_eq!(body["chapters"][0]["image_url"], "https://img.test/1.png");
        assert_eq!(body["chapters"][0]["paragraphs"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_generate_image_paths() {
        let app = app!(service(MockText::new(vec![]), MockImages::failing_on(vec![2])));

        let req = actix_test::TestRequest::post()
            .uri("/generate-image")
            .set_json(json!({"image_description": "공원"}))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = actix_test::TestRequest::post()
            .uri("/generate-image")
            .set_json(json!({
                "character_profile": "{\"visual\": {\"canonical\": \"노란 우비를 입은 아이\"}}",
                "image_description": "빗속의 공원",
                "scene_index": 2
            }))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["image_url"], "https://img.test/1.png");
        assert!(body["prompt_used"]
            .as_str()
            .unwrap()
            .starts_with("노란 우비를 입은 아이. scene 2: 빗속의 공원"));

        let req = actix_test::TestRequest::post()
            .uri("/generate-image")
            .set_json(json!({
                "character_profile": {"visual": {"canonical": "노란 우비를 입은 아이"}},
                "image_description": "빗속의 공원"
            }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body["detail"].as_str().unwrap().contains("no URL"));
    }

    #[test]
    fn test_panic_detail() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_detail(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_detail(payload.as_ref()), "bang");
    }

    #[actix_web::test]
    async fn test_guarded_turns_panic_into_internal_error() {
        let result = guarded("req-1", "/test", async {
            if true {
                panic!("pipeline exploded");
            }
            Ok(HttpResponse::Ok().finish())
        })
        .await;

        match result {
            Err(StoryError::InternalError(detail)) => assert_eq!(detail, "pipeline exploded"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
        }
    }
}
