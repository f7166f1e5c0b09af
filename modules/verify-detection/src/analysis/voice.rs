use std::time::Instant;

use tracing::{info, warn};

use verify_common::{AggregateResult, Modality, ModelPrediction, VerifyError};

use super::{elapsed_ms, percent, top_predictions_line, Detector, NOT_AVAILABLE};
use crate::mapper::{map_predictions, MatchedRule};
use crate::media::TempMedia;
use crate::traits::ClassifierInput;

const VOICE_TOP_K: usize = 3;

pub const VOICE_NOTE: &str = "Using an audio classification model as a heuristic. A dedicated voice deepfake detector would be more reliable.";

#[derive(Debug, Clone)]
pub struct VoiceAnalysis {
    pub result: AggregateResult,
    pub note: Option<&'static str>,
    pub processing_time_ms: u64,
    pub predictions: Vec<ModelPrediction>,
}

impl Detector {
    /// Run the audio classifier over a staged copy of the upload.
    pub async fn analyze_voice(&self, bytes: &[u8]) -> verify_common::Result<VoiceAnalysis> {
        if bytes.len() > self.settings.max_audio_bytes {
            return Err(VerifyError::too_large(
                Modality::Audio,
                self.settings.max_audio_bytes,
            ));
        }

        let started = Instant::now();
        let bare = |result: AggregateResult| VoiceAnalysis {
            result,
            note: None,
            processing_time_ms: elapsed_ms(started),
            predictions: Vec::new(),
        };

        let Some(model) = &self.registry.audio else {
            return Ok(bare(AggregateResult::degraded(
                "Voice deepfake detector not loaded. Please ensure the model is properly initialized.",
                NOT_AVAILABLE,
            )));
        };

        let media =
            match TempMedia::write(&self.settings.temp_dir, "temp_audio_", ".wav", bytes).await {
                Ok(media) => media,
                Err(e) => {
                    warn!(error = %e, "Failed to stage audio");
                    return Ok(bare(failed(&e, model.model_id())));
                }
            };

        let classified = model
            .classify(ClassifierInput::AudioFile(media.path()), VOICE_TOP_K)
            .await;
        media.cleanup();

        let predictions = match classified {
            Ok(p) => p,
            Err(e) => {
                warn!(model = model.model_id(), error = %e, "Voice analysis failed");
                return Ok(bare(failed(&e, model.model_id())));
            }
        };

        let mapping = map_predictions(&self.rules.audio, &predictions);
        let label = &mapping.label;
        let conf = percent(mapping.confidence);
        let mut explanation = match mapping.rule {
            MatchedRule::FakeKeyword => format!(
                "AI-generated voice detected. The model identified this audio as {label} with {conf} confidence. The voice shows characteristics of synthetic speech or voice cloning."
            ),
            MatchedRule::RealKeyword => format!(
                "Voice appears authentic. The audio classifier identified it as {label} with {conf} confidence. No obvious signs of voice synthesis detected."
            ),
            MatchedRule::Ambiguous => format!(
                "Analysis inconclusive. The model shows low or split confidence: {label} ({conf}). The audio pattern is ambiguous and may be synthetic."
            ),
            MatchedRule::HighConfidence => format!(
                "Likely authentic speech. Audio classification: {label} with {conf} confidence. Natural speech patterns detected."
            ),
            MatchedRule::Inconclusive => format!(
                "Cannot conclusively determine authenticity. Prediction: {label} ({conf}). Manual verification recommended."
            ),
        };
        if !predictions.is_empty() {
            explanation.push_str("\n\n");
            explanation.push_str(&top_predictions_line(&predictions));
        }

        info!(verdict = %mapping.verdict, label = %label, confidence = mapping.confidence, "Voice analysis complete");

        Ok(VoiceAnalysis {
            result: AggregateResult::new(
                mapping.verdict,
                mapping.confidence,
                explanation,
                model.model_id(),
            ),
            note: Some(VOICE_NOTE),
            processing_time_ms: elapsed_ms(started),
            predictions,
        })
    }
}

fn failed(e: &anyhow::Error, model_used: &str) -> AggregateResult {
    AggregateResult::degraded(
        format!(
            "Voice analysis failed: {e}. Please ensure the audio file is in a supported format (WAV, MP3, M4A, OGG)."
        ),
        model_used,
    )
}
