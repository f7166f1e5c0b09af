use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use verify_common::{AggregateResult, Modality, ModelPrediction, SourceRef};
use verify_detection::FrameDetail;

use super::read_upload;
use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize)]
pub struct TextCheckRequest {
    text: String,
    language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextCheckResponse {
    pub is_fake: bool,
    pub confidence: f64,
    pub analysis: String,
    pub sources: Vec<SourceRef>,
    pub model_used: String,
}

#[derive(Debug, Serialize)]
pub struct ImageCheckResponse {
    pub is_fake: bool,
    pub confidence: f64,
    pub analysis: String,
    pub model_used: String,
}

impl From<AggregateResult> for ImageCheckResponse {
    fn from(r: AggregateResult) -> Self {
        Self {
            is_fake: r.is_fake,
            confidence: r.confidence,
            analysis: r.explanation,
            model_used: r.model_used,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoCheckResponse {
    pub is_fake: bool,
    pub confidence: f64,
    pub analysis: String,
    pub model_used: String,
    pub processing_time_ms: u64,
    pub frames_analyzed: usize,
    pub video_duration_seconds: f64,
    pub frame_details: Vec<FrameDetail>,
}

#[derive(Debug, Serialize)]
pub struct VoiceCheckResponse {
    pub is_fake: bool,
    pub confidence: f64,
    pub analysis: String,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
    pub processing_time_ms: u64,
    pub prediction_details: Vec<ModelPrediction>,
}

pub async fn check_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextCheckRequest>,
) -> Result<Json<TextCheckResponse>, ApiError> {
    info!(
        chars = body.text.chars().count(),
        language = body.language.as_deref().unwrap_or("unspecified"),
        "Text check"
    );

    let analysis = state.detector.analyze_text(&body.text).await?;
    let r = analysis.result;

    Ok(Json(TextCheckResponse {
        is_fake: r.is_fake,
        confidence: r.confidence,
        analysis: r.explanation,
        sources: analysis.fact_check.sources,
        model_used: r.model_used,
    }))
}

pub async fn check_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImageCheckResponse>, ApiError> {
    let bytes = read_upload(&mut multipart, None).await?;
    info!(bytes = bytes.len(), "Image check");

    let analysis = state.detector.analyze_image(&bytes).await;
    Ok(Json(analysis.result.into()))
}

pub async fn check_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VideoCheckResponse>, ApiError> {
    let cap = state.detector.settings().max_video_bytes;
    let bytes = read_upload(&mut multipart, Some((Modality::Video, cap))).await?;
    info!(bytes = bytes.len(), "Video check");

    let analysis = state.detector.analyze_video(&bytes).await?;
    let r = analysis.result;

    Ok(Json(VideoCheckResponse {
        is_fake: r.is_fake,
        confidence: r.confidence,
        analysis: r.explanation,
        model_used: r.model_used,
        processing_time_ms: analysis.processing_time_ms,
        frames_analyzed: analysis.frames_analyzed,
        video_duration_seconds: analysis.duration_seconds,
        frame_details: analysis.frame_details,
    }))
}

pub async fn check_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VoiceCheckResponse>, ApiError> {
    let cap = state.detector.settings().max_audio_bytes;
    let bytes = read_upload(&mut multipart, Some((Modality::Audio, cap))).await?;
    info!(bytes = bytes.len(), "Voice check");

    let analysis = state.detector.analyze_voice(&bytes).await?;
    let r = analysis.result;

    Ok(Json(VoiceCheckResponse {
        is_fake: r.is_fake,
        confidence: r.confidence,
        analysis: r.explanation,
        model_used: r.model_used,
        note: analysis.note,
        processing_time_ms: analysis.processing_time_ms,
        prediction_details: analysis.predictions.into_iter().take(3).collect(),
    }))
}
