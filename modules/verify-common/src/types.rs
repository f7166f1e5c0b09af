use serde::{Deserialize, Serialize};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Real,
    Fake,
    Unverified,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Real => write!(f, "real"),
            Verdict::Fake => write!(f, "fake"),
            Verdict::Unverified => write!(f, "unverified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Video,
    Audio,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Image => write!(f, "image"),
            Modality::Video => write!(f, "video"),
            Modality::Audio => write!(f, "audio"),
        }
    }
}

// --- Requests ---

/// One piece of content submitted for analysis. Lives for a single request.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    Text(String),
    Image(Vec<u8>),
    Video(Vec<u8>),
    Audio(Vec<u8>),
}

impl AnalysisRequest {
    pub fn modality(&self) -> Modality {
        match self {
            AnalysisRequest::Text(_) => Modality::Text,
            AnalysisRequest::Image(_) => Modality::Image,
            AnalysisRequest::Video(_) => Modality::Video,
            AnalysisRequest::Audio(_) => Modality::Audio,
        }
    }
}

// --- Model outputs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub label: String,
    pub score: f64,
}

impl ModelPrediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score: clamp_unit(score),
        }
    }
}

/// Verdict for a single sample (one frame, or one audio file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleVerdict {
    pub verdict: Verdict,
    pub confidence: f64,
    pub label: String,
    /// Frame index for video samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
}

/// Final answer handed back to the caller. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub verdict: Verdict,
    pub is_fake: bool,
    pub confidence: f64,
    pub explanation: String,
    pub model_used: String,
}

impl AggregateResult {
    pub fn new(
        verdict: Verdict,
        confidence: f64,
        explanation: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            verdict,
            is_fake: verdict == Verdict::Fake,
            confidence: clamp_unit(confidence),
            explanation: explanation.into(),
            model_used: model_used.into(),
        }
    }

    /// Neutral answer used whenever a model or decoder is missing or fails.
    pub fn degraded(explanation: impl Into<String>, model_used: impl Into<String>) -> Self {
        Self::new(Verdict::Unverified, 0.5, explanation, model_used)
    }
}

// --- Fact checking ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactCheck {
    pub sources: Vec<SourceRef>,
    pub context: String,
}

/// Force a score into [0, 1]. NaN collapses to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Verdict::Unverified).unwrap(), "unverified");
        assert_eq!(Verdict::Fake.to_string(), "fake");
    }

    #[test]
    fn aggregate_result_derives_is_fake_and_clamps() {
        let r = AggregateResult::new(Verdict::Fake, 1.7, "x", "m");
        assert!(r.is_fake);
        assert_eq!(r.confidence, 1.0);

        let r = AggregateResult::new(Verdict::Unverified, f64::NAN, "x", "m");
        assert!(!r.is_fake);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn degraded_is_neutral() {
        let r = AggregateResult::degraded("down", "Not available");
        assert_eq!(r.verdict, Verdict::Unverified);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn request_reports_modality() {
        assert_eq!(AnalysisRequest::Video(vec![]).modality(), Modality::Video);
        assert_eq!(AnalysisRequest::Text("x".into()).modality(), Modality::Text);
    }
}
