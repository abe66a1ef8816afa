//! Wizard sessions driven through the generation gateway against fake
//! proxy, gallery and model servers.

mod common;

use std::io::Write;
use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use common::{app_state, fake_gemini, image_reply, spawn, Recorder};
use tryon::build_router;
use tryon::models::config::{AppConfig, ClientConfig, Credentials};
use tryon::models::error::ClientError;
use tryon::models::gallery::{Gallery, Gender};
use tryon::models::image::{ClothingSelection, ImageResource};
use tryon::services::gateway::{GenerationGateway, Route};
use tryon::services::gemini::GeminiClient;
use tryon::wizard::{Guidance, Session, Step, Variant, Wizard, WizardError};

const SHIRT_BYTES: &[u8] = b"\x89PNG-shirt";

/// Fake proxy answering with `status`/`reply`, optionally serving the male
/// black t-shirt from the gallery.
async fn fake_proxy(status: StatusCode, reply: Value, serve_gallery: bool) -> (String, Recorder) {
    let recorder: Recorder = Arc::default();
    let seen = recorder.clone();

    let mut router = Router::new().route(
        "/api/generate",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            let reply = reply.clone();
            async move {
                {
                    let mut rec = seen.lock();
                    rec.calls += 1;
                    rec.last_body = Some(body);
                }
                (status, Json(reply))
            }
        }),
    );
    if serve_gallery {
        router = router.route(
            "/outfits/male/black-tshirt.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], SHIRT_BYTES) }),
        );
    }
    (spawn(router).await, recorder)
}

fn client_config(base: &str) -> ClientConfig {
    ClientConfig {
        proxy_url: format!("{}/api/generate", base),
        gallery_base_url: base.to_string(),
        ..ClientConfig::default()
    }
}

fn person_photo() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("photo")
        .suffix(".jpg")
        .tempfile()
        .unwrap();
    file.write_all(b"person-jpeg").unwrap();
    file
}

fn gallery_session(base: &str) -> Session {
    let config = client_config(base);
    let wizard = Wizard::new(Variant::Gallery, Gallery::new(&config.gallery_base_url));
    Session::new(wizard, GenerationGateway::proxy(&config))
}

fn pick_black_tshirt(session: &Session, person: &tempfile::NamedTempFile) -> String {
    session.with(|w| {
        w.select_person(ImageResource::from_path(person.path()));
        w.select_gender(Gender::Male).unwrap();
        let url = w
            .gallery()
            .find_by_name(Gender::Male, "Черная футболка")
            .unwrap()
            .url
            .clone();
        w.select_gallery_outfit(&url).unwrap();
        url
    })
}

#[tokio::test]
async fn gallery_outfit_reaches_result() {
    let reply = json!({ "mimeType": "image/png", "data": "UkVTVUxU" });
    let (base, recorder) = fake_proxy(StatusCode::OK, reply, true).await;
    let session = gallery_session(&base);
    let person = person_photo();
    pick_black_tshirt(&session, &person);

    assert!(session.generate().await.unwrap());

    session.with(|w| {
        assert_eq!(w.step(), Step::Result);
        assert_eq!(w.result_image(), Some("data:image/png;base64,UkVTVUxU"));
        assert!(w.state().error.is_none());
    });

    let rec = recorder.lock();
    assert_eq!(rec.calls, 1);
    let body = rec.last_body.as_ref().unwrap();
    assert_eq!(body["personImage"]["mimeType"], "image/jpeg");
    assert_eq!(body["personImage"]["data"], "cGVyc29uLWpwZWc=");
    assert_eq!(body["clothingImage"]["mimeType"], "image/png");
    assert_eq!(
        body["clothingImage"]["data"],
        base64_of(SHIRT_BYTES),
        "gallery image was fetched and encoded"
    );
}

#[tokio::test]
async fn missing_api_key_routes_to_credential_help() {
    let reply = json!({ "error": "Ошибка конфигурации сервера", "errorCode": "MISSING_API_KEY" });
    let (base, _) = fake_proxy(StatusCode::INTERNAL_SERVER_ERROR, reply, true).await;
    let session = gallery_session(&base);
    let person = person_photo();
    pick_black_tshirt(&session, &person);

    assert!(session.generate().await.unwrap());

    session.with(|w| {
        assert_eq!(w.step(), Step::CredentialHelp);
        let error = w.state().error.clone().unwrap();
        assert_eq!(error.guidance, Guidance::CredentialSetup);
        assert!(w.result_image().is_none());
    });
}

#[tokio::test]
async fn gallery_404_is_fetch_error_and_skips_proxy() {
    let reply = json!({ "mimeType": "image/png", "data": "UkVTVUxU" });
    let (base, recorder) = fake_proxy(StatusCode::OK, reply, false).await;
    let session = gallery_session(&base);
    let person = person_photo();
    let url = pick_black_tshirt(&session, &person);

    session.generate().await.unwrap();

    session.with(|w| {
        assert_eq!(w.step(), Step::Error);
        let error = w.state().error.clone().unwrap();
        assert_eq!(error.guidance, Guidance::Generic);
        assert!(error.message.contains(&url), "message names the failed source: {}", error.message);
        assert!(error.message.contains("404"));
    });
    assert_eq!(recorder.lock().calls, 0);
}

#[tokio::test]
async fn gateway_reports_fetch_error_directly() {
    let (base, _) = fake_proxy(StatusCode::OK, json!({}), false).await;
    let gateway = GenerationGateway::proxy(&client_config(&base));
    let person = person_photo();
    let url = format!("{}/outfits/male/black-tshirt.png", base);

    let err = gateway
        .generate(
            &ImageResource::from_path(person.path()),
            &ClothingSelection::GalleryReference { url: url.clone(), name: "Черная футболка".into() },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Fetch { url: ref failed, .. } if *failed == url);
}

#[tokio::test]
async fn generic_proxy_error_keeps_server_message() {
    let reply = json!({ "error": "Запрос заблокирован. Причина: SAFETY." });
    let (base, _) = fake_proxy(StatusCode::INTERNAL_SERVER_ERROR, reply, true).await;
    let session = gallery_session(&base);
    let person = person_photo();
    pick_black_tshirt(&session, &person);

    session.generate().await.unwrap();

    session.with(|w| {
        assert_eq!(w.step(), Step::Error);
        assert_eq!(
            w.state().error.as_ref().unwrap().message,
            "Не удалось сгенерировать изображение. Запрос заблокирован. Причина: SAFETY."
        );
    });
}

#[tokio::test]
async fn non_json_proxy_error_falls_back_to_status_message() {
    let (base, _) = fake_proxy(StatusCode::BAD_GATEWAY, Value::Null, true).await;
    let gateway = GenerationGateway::proxy(&client_config(&base));
    let person = person_photo();
    let clothing = ImageResource::from_bytes("shirt.png", Some("image/png".into()), SHIRT_BYTES.to_vec());

    let err = gateway
        .generate(
            &ImageResource::from_path(person.path()),
            &ClothingSelection::Uploaded(Arc::new(clothing)),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Transport { ref message, code: None } if message.contains("502"));
}

#[tokio::test]
async fn missing_clothing_never_calls_proxy() {
    let (base, recorder) = fake_proxy(StatusCode::OK, json!({}), true).await;
    let config = client_config(&base);
    let session = Session::new(
        Wizard::new(Variant::Minimal, Gallery::new(&base)),
        GenerationGateway::proxy(&config),
    );
    let person = person_photo();
    session.with(|w| w.select_person(ImageResource::from_path(person.path())));

    assert_matches!(session.generate().await, Err(WizardError::Validation(_)));
    assert_eq!(session.with(|w| w.step()), Step::Error);
    assert_eq!(recorder.lock().calls, 0);
}

#[tokio::test]
async fn end_to_end_through_real_proxy_and_download() {
    let (gemini, gemini_rec) = fake_gemini(StatusCode::OK, image_reply("image/png", "AQID")).await;
    let proxy = spawn(build_router(app_state(&gemini, Some("server-key")))).await;

    let config = ClientConfig {
        proxy_url: format!("{}/api/generate", proxy),
        ..ClientConfig::default()
    };
    let session = Session::new(
        Wizard::new(Variant::Minimal, Gallery::new(&config.gallery_base_url)),
        GenerationGateway::proxy(&config),
    );
    let person = person_photo();
    session
        .with(|w| {
            w.select_person(ImageResource::from_path(person.path()));
            w.select_clothing_file(ImageResource::from_bytes(
                "shirt.png",
                Some("image/png".into()),
                SHIRT_BYTES.to_vec(),
            ))
        })
        .unwrap();

    assert!(session.generate().await.unwrap());
    assert_eq!(session.with(|w| w.step()), Step::Result);
    assert_eq!(gemini_rec.lock().last_api_key.as_deref(), Some("server-key"));

    let dir = tempfile::tempdir().unwrap();
    let saved = session.download(dir.path()).await.unwrap();
    assert_eq!(std::fs::read(saved).unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn direct_route_without_credential_needs_setup() {
    let config = AppConfig {
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        ..AppConfig::default()
    };
    let gateway = GenerationGateway::new(
        Route::Direct {
            gemini: GeminiClient::new(&config),
            credentials: Credentials::Static(None),
        },
        &ClientConfig::default(),
    );
    let person = person_photo();
    let clothing = ImageResource::from_bytes("shirt.png", Some("image/png".into()), SHIRT_BYTES.to_vec());

    let err = gateway
        .generate(
            &ImageResource::from_path(person.path()),
            &ClothingSelection::Uploaded(Arc::new(clothing)),
        )
        .await
        .unwrap_err();
    assert!(err.is_missing_credential());
}

#[tokio::test]
async fn direct_route_classifies_model_reply() {
    let reply = json!({ "candidates": [{ "finishReason": "IMAGE_SAFETY" }] });
    let (gemini, _) = fake_gemini(StatusCode::OK, reply).await;
    let config = AppConfig {
        gemini_base_url: gemini,
        ..AppConfig::default()
    };
    let gateway = GenerationGateway::new(
        Route::Direct {
            gemini: GeminiClient::new(&config),
            credentials: Credentials::Static(Some("local-key".into())),
        },
        &ClientConfig::default(),
    );
    let person = person_photo();
    let clothing = ImageResource::from_bytes("shirt.png", Some("image/png".into()), SHIRT_BYTES.to_vec());

    let err = gateway
        .generate(
            &ImageResource::from_path(person.path()),
            &ClothingSelection::Uploaded(Arc::new(clothing)),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Model(ref rejection) if rejection.message.contains("IMAGE_SAFETY"));
}

#[tokio::test]
async fn new_person_during_generation_discards_late_result() {
    // Proxy that waits until released, so the wizard can move on meanwhile.
    let gate = Arc::new(tokio::sync::Notify::new());
    let release = gate.clone();
    let router = Router::new().route(
        "/api/generate",
        post(move || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Json(json!({ "mimeType": "image/png", "data": "TEFURQ==" }))
            }
        }),
    );
    let base = spawn(router).await;
    let config = client_config(&base);
    let session = Session::new(
        Wizard::new(Variant::Minimal, Gallery::new(&base)),
        GenerationGateway::proxy(&config),
    );
    let person = person_photo();
    session
        .with(|w| {
            w.select_person(ImageResource::from_path(person.path()));
            w.select_clothing_file(ImageResource::from_bytes("a.png", Some("image/png".into()), vec![1u8]))
        })
        .unwrap();

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.generate().await }
    });

    // Wait until the wizard has entered the generating step.
    while session.with(|w| w.step()) != Step::Generating {
        tokio::task::yield_now().await;
    }
    session.with(|w| w.select_person(ImageResource::from_path(person.path())));
    release.notify_one();

    let applied = running.await.unwrap().unwrap();
    assert!(!applied);
    session.with(|w| {
        assert_eq!(w.step(), Step::Clothing);
        assert!(w.result_image().is_none());
        assert!(w.state().clothing.is_none());
    });
}

fn base64_of(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
