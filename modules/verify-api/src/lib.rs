pub mod error;
pub mod jwt;
pub mod relay;
pub mod rest;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use verify_detection::{Detector, TrendingFeed};
use whatsapp::WhatsAppService;

pub use error::ApiError;
use jwt::JwtService;

/// Multipart framing on top of the largest accepted upload.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub struct AppState {
    pub detector: Detector,
    pub trending: TrendingFeed,
    pub jwt: JwtService,
    pub whatsapp: Option<WhatsAppService>,
    pub whatsapp_verify_token: String,
}

impl AppState {
    pub fn new(detector: Detector, jwt: JwtService) -> Self {
        let trending = TrendingFeed::new(detector.registry().searcher.clone());
        Self {
            detector,
            trending,
            jwt,
            whatsapp: None,
            whatsapp_verify_token: String::new(),
        }
    }

    pub fn with_whatsapp(mut self, service: Option<WhatsAppService>, verify_token: &str) -> Self {
        self.whatsapp = service;
        self.whatsapp_verify_token = verify_token.to_string();
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

pub fn build_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let settings = state.detector.settings();
    let body_limit = settings.max_video_bytes.max(settings.max_audio_bytes) + MULTIPART_OVERHEAD;

    Router::new()
        // Checks
        .route("/check-text", post(rest::check::check_text))
        .route("/check-image", post(rest::check::check_image))
        .route("/check-video", post(rest::check::check_video))
        .route("/check-voice", post(rest::check::check_voice))
        .route("/api/v1/check-text", post(rest::check::check_text))
        .route("/api/v1/check-image", post(rest::check::check_image))
        .route("/api/v1/check-video", post(rest::check::check_video))
        .route("/api/v1/check-voice", post(rest::check::check_voice))
        // Feed
        .route("/trending", get(rest::trending::trending))
        // Health
        .route("/", get(|| async { "ok" }))
        .route("/api/v1/health", get(rest::health::health))
        // Mock auth
        .route("/api/v1/auth/register", post(rest::auth::register))
        .route("/api/v1/auth/login", post(rest::auth::login))
        // WhatsApp relay
        .route("/webhook", get(relay::verify_webhook).post(relay::receive_webhook))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(cors_origins))
        // Results are per-request; never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only (uploads and query strings stay out of logs)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
