use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use verify_detection::ModelStatus;

use crate::AppState;

pub const SERVICE_NAME: &str = "VeriFy AI Gateway";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub service: &'static str,
    pub ai_status: ModelStatus,
    pub whatsapp_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        service: SERVICE_NAME,
        ai_status: state.detector.registry().status(),
        whatsapp_configured: state.whatsapp.is_some(),
    })
}
