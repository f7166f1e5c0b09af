//! WhatsApp Business webhook: relays text and image checks back as chat replies.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

use verify_common::AggregateResult;
use whatsapp::{IncomingMessage, MessageContent, WebhookPayload, WhatsAppService};

use crate::error::ApiError;
use crate::AppState;

pub const MIN_RELAY_TEXT_CHARS: usize = 20;
const SUMMARY_CHARS: usize = 200;
const MAX_RELAY_IMAGE_BYTES: usize = 16 * 1024 * 1024;

pub const ANALYZING: &str = "Analyzing your content... Please wait.";
pub const TOO_SHORT: &str = "Please send a longer message (at least 20 characters) for analysis.";
pub const UNSUPPORTED: &str = "Please send either text or an image for analysis. Video and audio are not supported via WhatsApp.";
pub const FAILED: &str = "Sorry, I couldn't analyze the content. Please try again.";
const DISCLAIMER: &str =
    "_This is an AI analysis. Always verify important information from official sources._";

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Subscription handshake. Echoes the challenge when the token matches.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Result<String, ApiError> {
    let subscribed = params.mode.as_deref() == Some("subscribe");
    let token_ok = params.verify_token.as_deref() == Some(state.whatsapp_verify_token.as_str());

    if subscribed && token_ok {
        info!("Webhook verified");
        Ok(params.challenge.unwrap_or_default())
    } else {
        warn!("Webhook verification failed");
        Err(ApiError::Forbidden("Verification failed".to_string()))
    }
}

/// Always answers 200 so the provider doesn't retry. Each message is handled
/// in its own background task.
pub async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<serde_json::Value> {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Malformed webhook payload");
            return Json(serde_json::json!({
                "status": "error",
                "message": "Webhook processing failed",
            }));
        }
    };

    let messages = payload.messages();
    info!(count = messages.len(), "Webhook delivery");

    for message in messages {
        let state = state.clone();
        tokio::spawn(async move {
            process_message(&state, message).await;
        });
    }

    Json(serde_json::json!({ "status": "ok" }))
}

async fn process_message(state: &AppState, message: IncomingMessage) {
    let Some(wa) = &state.whatsapp else {
        error!("WhatsApp credentials not configured, dropping message");
        return;
    };

    send(wa, &message.from, ANALYZING).await;
    let reply = reply_for(state, &message).await;
    send(wa, &message.from, &reply).await;
}

async fn send(wa: &WhatsAppService, to: &str, body: &str) {
    if let Err(e) = wa.send_text(to, body).await {
        error!(error = %e, "Failed to send WhatsApp message");
    }
}

/// The chat reply for one inbound message.
pub async fn reply_for(state: &AppState, message: &IncomingMessage) -> String {
    match &message.content {
        MessageContent::Text(text) if text.chars().count() < MIN_RELAY_TEXT_CHARS => {
            TOO_SHORT.to_string()
        }
        MessageContent::Text(text) => match state.detector.analyze_text(text).await {
            Ok(analysis) => format_result(&analysis.result),
            Err(e) => {
                warn!(error = %e, "Relayed text rejected");
                FAILED.to_string()
            }
        },
        MessageContent::Image { media_id } => {
            let Some(wa) = &state.whatsapp else {
                return FAILED.to_string();
            };
            match fetch_media(wa, media_id).await {
                Ok(bytes) => format_result(&state.detector.analyze_image(&bytes).await.result),
                Err(e) => {
                    error!(media_id = %media_id, error = %e, "Failed to fetch WhatsApp media");
                    FAILED.to_string()
                }
            }
        }
        MessageContent::Unsupported(kind) => {
            info!(kind = %kind, "Unsupported WhatsApp message type");
            UNSUPPORTED.to_string()
        }
    }
}

async fn fetch_media(wa: &WhatsAppService, media_id: &str) -> whatsapp::Result<Vec<u8>> {
    let media = wa.media_info(media_id).await?;
    wa.download_media(&media.url, MAX_RELAY_IMAGE_BYTES).await
}

/// Chat-sized summary: verdict, confidence, the first line of the explanation.
pub fn format_result(result: &AggregateResult) -> String {
    let status = if result.is_fake {
        "LIKELY FAKE"
    } else {
        "LIKELY AUTHENTIC"
    };

    let mut message = format!(
        "*VeriFy AI Analysis*\n\n*Verdict:* {status}\n*Confidence:* {:.1}%\n\n",
        result.confidence * 100.0
    );

    let summary: String = result
        .explanation
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(SUMMARY_CHARS)
        .collect();
    if !summary.is_empty() {
        message.push_str(&summary);
        message.push_str("\n\n");
    }

    message.push_str(DISCLAIMER);
    message
}
