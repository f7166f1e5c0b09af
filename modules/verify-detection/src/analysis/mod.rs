//! Per-modality analyzers sharing one read-only model registry.

mod image;
mod text;
mod video;
mod voice;

pub use image::ImageAnalysis;
pub use text::TextAnalysis;
pub use video::{FrameDetail, VideoAnalysis};
pub use voice::{VoiceAnalysis, VOICE_NOTE};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use verify_common::{AggregateResult, AnalysisRequest, Config, ModelPrediction, VerdictRules};

use crate::fact_check::FactChecker;
use crate::registry::ModelRegistry;

pub const NOT_AVAILABLE: &str = "Not available";

/// Knobs the analyzers need from the process config.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub temp_dir: PathBuf,
    pub max_video_bytes: usize,
    pub max_audio_bytes: usize,
    pub max_text_chars: usize,
    pub search_timeout: Duration,
}

impl DetectorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temp_dir: config.media_temp_dir.clone(),
            max_video_bytes: config.max_video_bytes,
            max_audio_bytes: config.max_audio_bytes,
            max_text_chars: config.max_text_length,
            search_timeout: config.tavily_timeout,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            max_video_bytes: 100 * 1024 * 1024,
            max_audio_bytes: 20 * 1024 * 1024,
            max_text_chars: 50_000,
            search_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one analysis, tagged by modality.
#[derive(Debug, Clone)]
pub enum Analysis {
    Text(TextAnalysis),
    Image(ImageAnalysis),
    Video(VideoAnalysis),
    Voice(VoiceAnalysis),
}

impl Analysis {
    pub fn result(&self) -> &AggregateResult {
        match self {
            Analysis::Text(a) => &a.result,
            Analysis::Image(a) => &a.result,
            Analysis::Video(a) => &a.result,
            Analysis::Voice(a) => &a.result,
        }
    }
}

/// Entry point for every check. Cheap to clone; all state is shared and read-only.
#[derive(Clone)]
pub struct Detector {
    registry: ModelRegistry,
    rules: Arc<VerdictRules>,
    fact_checker: FactChecker,
    settings: DetectorSettings,
}

impl Detector {
    pub fn new(registry: ModelRegistry, rules: VerdictRules, settings: DetectorSettings) -> Self {
        let fact_checker = FactChecker::new(registry.searcher.clone(), settings.search_timeout);
        Self {
            registry,
            rules: Arc::new(rules),
            fact_checker,
            settings,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &VerdictRules {
        &self.rules
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Dispatch on the request's modality.
    pub async fn analyze(&self, request: AnalysisRequest) -> verify_common::Result<Analysis> {
        Ok(match request {
            AnalysisRequest::Text(text) => Analysis::Text(self.analyze_text(&text).await?),
            AnalysisRequest::Image(bytes) => Analysis::Image(self.analyze_image(&bytes).await),
            AnalysisRequest::Video(bytes) => Analysis::Video(self.analyze_video(&bytes).await?),
            AnalysisRequest::Audio(bytes) => Analysis::Voice(self.analyze_voice(&bytes).await?),
        })
    }
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn top_predictions_line(predictions: &[ModelPrediction]) -> String {
    let ranked: Vec<String> = predictions
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} ({})", i + 1, p.label, percent(p.score)))
        .collect();
    format!("Top predictions: {}", ranked.join(" "))
}

fn elapsed_ms(started: std::time::Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_prediction_lines() {
        let line = top_predictions_line(&[
            ModelPrediction::new("comic book", 0.5123),
            ModelPrediction::new("face", 0.25),
        ]);
        assert_eq!(line, "Top predictions: 1. comic book (51.2%) 2. face (25.0%)");
    }
}
