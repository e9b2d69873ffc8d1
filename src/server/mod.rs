pub mod handlers;

use crate::{config::Config, story::StoryService};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    middleware, web, App, HttpServer,
};
use std::future::Future;

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// Registers every route. POST routes also answer OPTIONS preflights.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::root))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::resource("/generate-story")
                .route(web::post().to(handlers::generate_story))
                .route(web::method(Method::OPTIONS).to(handlers::preflight)),
        )
        .service(
            web::resource("/generate-full")
                .route(web::post().to(handlers::generate_full))
                .route(web::method(Method::OPTIONS).to(handlers::preflight)),
        )
        .service(
            web::resource("/generate-image")
                .route(web::post().to(handlers::generate_image))
                .route(web::method(Method::OPTIONS).to(handlers::preflight)),
        );
}

/// Permissive CORS. The caller's origin and requested headers are echoed, since browsers
/// treat `*` literally on credentialed requests.
pub fn apply_cors_headers(
    headers: &mut HeaderMap,
    origin: Option<HeaderValue>,
    requested_headers: Option<HeaderValue>,
) {
    let origin = origin.unwrap_or_else(|| HeaderValue::from_static("*"));
    let allowed_headers = requested_headers.unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers);
    headers.insert(
        header::VARY,
        HeaderValue::from_static("Origin, Access-Control-Request-Headers"),
    );
}

/// `wrap_fn` middleware adding CORS headers to every response.
pub fn cors<S, B>(
    req: ServiceRequest,
    srv: &S,
) -> impl Future<Output = Result<ServiceResponse<B>, actix_web::Error>>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let origin = req.headers().get(header::ORIGIN).cloned();
    let requested_headers = req
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned();
    let fut = srv.call(req);

    async move {
        let mut res = fut.await?;
        apply_cors_headers(res.headers_mut(), origin, requested_headers);
        Ok(res)
    }
}

pub async fn run(service: StoryService, config: &Config) -> std::io::Result<()> {
    let data = web::Data::new(service);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::new("%r -> %s in %Dms"))
            .wrap_fn(cors)
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
