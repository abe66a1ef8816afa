use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header::HeaderName, HeaderValue, Method},
    middleware,
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::handlers;
use crate::models::config::{AppConfig, Credentials};
use crate::models::gallery::Gallery;
use crate::services::gemini::GeminiClient;

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Credentials,
    pub gemini: GeminiClient,
    pub gallery: Gallery,
    pub context: String,
}

impl AppState {
    pub fn new(config: AppConfig, credentials: Credentials) -> Self {
        Self {
            gemini: GeminiClient::new(&config),
            gallery: Gallery::new(&config.gallery_base_url),
            context: config.context.clone(),
            credentials,
            config: Arc::new(config),
        }
    }

    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        let credentials = config.credentials();
        Self::new(config, credentials)
    }
}

/// Headers that must never appear in logs.
const SENSITIVE_HEADERS: &[&str] = &["x-goog-api-key", "authorization", "cookie"];

fn is_sensitive_header(name: &HeaderName) -> bool {
    SENSITIVE_HEADERS.iter().any(|&s| name.as_str() == s)
}

async fn request_id_middleware(request: Request<Body>, next: middleware::Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("X-Request-Id", value);
    }
    response
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    let cors_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(cors_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .expose_headers([HeaderName::from_static("x-request-id")]);

    // Body contents are base64 images; only the request line and a redacted
    // header summary go to the log.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            let safe_headers: Vec<String> = request
                .headers()
                .iter()
                .map(|(name, value)| {
                    if is_sensitive_header(name) {
                        format!("{}=[REDACTED]", name)
                    } else {
                        format!("{}={}", name, value.to_str().unwrap_or(""))
                    }
                })
                .collect();

            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                headers = %safe_headers.join(", "),
            )
        })
        .on_response(|response: &Response, latency: std::time::Duration, _span: &Span| {
            tracing::info!(
                status = response.status().as_u16(),
                latency_ms = latency.as_millis() as u64,
                "response",
            );
        });

    let generate_route = || -> MethodRouter<Arc<AppState>> {
        post(handlers::generate::generate).fallback(handlers::generate::method_not_allowed)
    };

    Router::new()
        .route("/api/generate", generate_route())
        .route("/.netlify/functions/generate", generate_route())
        .route("/api/gallery/:gender", get(handlers::gallery::list_outfits))
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/version", get(handlers::health::version))
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_bytes as usize))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_headers_are_sensitive() {
        assert!(is_sensitive_header(&HeaderName::from_static("x-goog-api-key")));
        assert!(is_sensitive_header(&HeaderName::from_static("authorization")));
        assert!(!is_sensitive_header(&HeaderName::from_static("content-type")));
    }
}
