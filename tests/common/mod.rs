#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

use tryon::models::config::{AppConfig, Credentials};
use tryon::AppState;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// What a fake upstream saw.
#[derive(Default)]
pub struct Recorded {
    pub calls: usize,
    pub last_body: Option<Value>,
    pub last_api_key: Option<String>,
}

pub type Recorder = Arc<Mutex<Recorded>>;

/// Fake Gemini that answers every generateContent call with `reply`.
pub async fn fake_gemini(status: StatusCode, reply: Value) -> (String, Recorder) {
    let recorder: Recorder = Arc::default();
    let seen = recorder.clone();
    let router = Router::new().route(
        "/models/:model_call",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let seen = seen.clone();
            let reply = reply.clone();
            async move {
                {
                    let mut rec = seen.lock();
                    rec.calls += 1;
                    rec.last_body = Some(body);
                    rec.last_api_key = headers
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                }
                (status, Json(reply))
            }
        }),
    );
    (spawn(router).await, recorder)
}

pub fn image_reply(mime_type: &str, data: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "inlineData": { "mimeType": mime_type, "data": data } }] },
            "finishReason": "STOP"
        }]
    })
}

pub fn app_state(gemini_base_url: &str, api_key: Option<&str>) -> Arc<AppState> {
    let config = AppConfig {
        gemini_base_url: gemini_base_url.to_string(),
        gallery_base_url: "https://cdn.example".to_string(),
        ..AppConfig::default()
    };
    Arc::new(AppState::new(config, Credentials::Static(api_key.map(str::to_string))))
}

pub fn encoded(mime_type: &str, data: &str) -> Value {
    json!({ "mimeType": mime_type, "data": data })
}
