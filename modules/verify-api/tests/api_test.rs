use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use verify_api::jwt::JwtService;
use verify_api::{build_router, AppState};
use verify_common::VerdictRules;
use verify_detection::testing::{FakeClassifier, FakeFrames, FakeSearcher};
use verify_detection::{Detector, DetectorSettings, ModelRegistry};

const BOUNDARY: &str = "verify-test-boundary";
const VERIFY_TOKEN: &str = "hook-token";

fn app(registry: ModelRegistry, dir: &Path) -> Router {
    let detector = Detector::new(
        registry,
        VerdictRules::default(),
        DetectorSettings {
            temp_dir: dir.to_path_buf(),
            max_video_bytes: 1024,
            max_audio_bytes: 1024,
            ..Default::default()
        },
    );
    let state = AppState::new(detector, JwtService::new("test", "verify".to_string()))
        .with_whatsapp(None, VERIFY_TOKEN);
    build_router(Arc::new(state), &["*".to_string()])
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_post(uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn check_text_returns_full_payload() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::builder()
        .text(Arc::new(FakeClassifier::new("text-model", &[("LABEL_0", 0.91)])))
        .searcher(Arc::new(FakeSearcher::new(
            Some("This claim is false."),
            &[("Debunk", "https://fact.example", "Nothing supports it.", 0.8)],
        )))
        .build();

    let (status, body) = send(
        app(registry, dir.path()),
        json_post(
            "/check-text",
            serde_json::json!({ "text": "Scientists confirm the moon is made of cheese.", "language": "en" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_fake"], true);
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(body["analysis"]
        .as_str()
        .unwrap()
        .contains("Real-time fact-check: This claim is false."));
    assert_eq!(body["sources"][0]["url"], "https://fact.example");
    assert_eq!(body["model_used"], "text-model + Tavily");
}

#[tokio::test]
async fn short_text_is_unverified() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(ModelRegistry::default(), dir.path()),
        json_post("/api/v1/check-text", serde_json::json!({ "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_fake"], false);
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["analysis"], "Text too short for analysis");
    assert_eq!(body["sources"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn check_image_reads_multipart_upload() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FakeClassifier::new("image-model", &[("Realism", 0.88)]));
    let registry = ModelRegistry::builder().image(model.clone()).build();

    let (status, body) = send(
        app(registry, dir.path()),
        multipart_post("/check-image", "photo.png", b"not really a png"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_fake"], false);
    assert_eq!(body["model_used"], "image-model");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn missing_file_field_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::post("/check-image")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app(ModelRegistry::default(), dir.path()), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Missing multipart field: file");
}

#[tokio::test]
async fn oversized_video_is_rejected_before_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FakeClassifier::new("image-model", &[("Realism", 0.9)]));
    let frames = Arc::new(FakeFrames::new(100, 25.0));
    let registry = ModelRegistry::builder()
        .image(model.clone())
        .frames(frames.clone())
        .build();

    let (status, body) = send(
        app(registry, dir.path()),
        multipart_post("/check-video", "clip.mp4", &vec![0u8; 4096]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Video file too large. Maximum size:"));
    assert_eq!(model.calls(), 0);
    assert!(frames.seen_paths().is_empty());
}

#[tokio::test]
async fn oversized_voice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FakeClassifier::new("audio-model", &[("bonafide", 0.9)]));
    let registry = ModelRegistry::builder().audio(model.clone()).build();

    let (status, body) = send(
        app(registry, dir.path()),
        multipart_post("/check-voice", "note.wav", &vec![0u8; 4096]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Audio file too large."));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn video_check_reports_frames() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::builder()
        .image(Arc::new(FakeClassifier::new("image-model", &[("Realism", 0.95)])))
        .frames(Arc::new(FakeFrames::new(240, 24.0)))
        .build();

    let (status, body) = send(
        app(registry, dir.path()),
        multipart_post("/check-video", "clip.mp4", b"tiny video"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["frames_analyzed"], 8);
    assert_eq!(body["video_duration_seconds"], 10.0);
    assert_eq!(body["frame_details"].as_array().unwrap().len(), 3);
    assert_eq!(body["is_fake"], false);
}

#[tokio::test]
async fn voice_check_reports_note_and_top_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(FakeClassifier::new(
        "audio-model",
        &[
            ("spoof", 0.8),
            ("bonafide", 0.1),
            ("noise", 0.05),
            ("other", 0.05),
        ],
    ));
    let registry = ModelRegistry::builder().audio(model.clone()).build();

    let (status, body) = send(
        app(registry, dir.path()),
        multipart_post("/check-voice", "note.wav", b"RIFF tiny wav"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_fake"], true);
    assert_eq!(body["model_used"], "audio-model");
    assert!(body["note"].as_str().is_some());
    let details = body["prediction_details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert_eq!(details[0]["label"], "spoof");
    assert_eq!(model.calls(), 1);
}

// ---------------------------------------------------------------------------
// Health, feed, auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_model_availability() {
    let dir = tempfile::tempdir().unwrap();
    let registry = ModelRegistry::builder()
        .text(Arc::new(FakeClassifier::new("text-model", &[])))
        .build();

    let (status, body) = send(
        app(registry, dir.path()),
        Request::get("/api/v1/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "VeriFy AI Gateway");
    assert_eq!(body["ai_status"]["fake_news_detector"], true);
    assert_eq!(body["ai_status"]["tavily"], false);
    assert_eq!(body["ai_status"]["video_deepfake_detector"], false);
    assert_eq!(body["whatsapp_configured"], false);
}

#[tokio::test]
async fn responses_are_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(ModelRegistry::default(), dir.path())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn trending_without_search_serves_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(ModelRegistry::default(), dir.path()),
        Request::get("/trending?limit=4").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let topics = body.as_array().unwrap();
    assert_eq!(topics.len(), 4);
    assert_eq!(topics[0]["id"], 1);
    assert!(topics[0]["title"].as_str().is_some());
}

#[tokio::test]
async fn register_and_login_issue_tokens_for_same_user() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(ModelRegistry::default(), dir.path());

    let (status, registered) = send(
        app.clone(),
        json_post(
            "/api/v1/auth/register",
            serde_json::json!({ "email": "ana@example.com", "password": "secret", "name": "Ana" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["token_type"], "bearer");
    assert_eq!(registered["user"]["name"], "Ana");
    assert!(!registered["access_token"].as_str().unwrap().is_empty());

    let (status, logged_in) = send(
        app,
        json_post(
            "/api/v1/auth/login",
            serde_json::json!({ "email": "ana@example.com", "password": "anything" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["user"]["name"], "User");
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);
}

#[tokio::test]
async fn invalid_email_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        app(ModelRegistry::default(), dir.path()),
        json_post(
            "/api/v1/auth/login",
            serde_json::json!({ "email": "not-an-email", "password": "x" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Invalid email address");
}

// ---------------------------------------------------------------------------
// WhatsApp relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_handshake_echoes_challenge() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!(
        "/webhook?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=12345"
    );
    let response = app(ModelRegistry::default(), dir.path())
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"12345");
}

#[tokio::test]
async fn webhook_handshake_rejects_wrong_token() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _) = send(
        app(ModelRegistry::default(), dir.path()),
        Request::get("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_webhook_still_answers_ok() {
    let dir = tempfile::tempdir().unwrap();
    let request = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(ModelRegistry::default(), dir.path()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Webhook processing failed");
}

#[tokio::test]
async fn webhook_delivery_is_acknowledged() {
    let dir = tempfile::tempdir().unwrap();
    let delivery = serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "changes": [{
                "value": {
                    "messages": [
                        {"from": "15551234567", "id": "wamid.1", "type": "text",
                         "text": {"body": "Is it true that vaccines cause autism?"}}
                    ]
                }
            }]
        }]
    });

    let (status, body) = send(
        app(ModelRegistry::default(), dir.path()),
        json_post("/webhook", delivery),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}
