use tracing::{info, warn};

use verify_common::{AggregateResult, ModelPrediction};

use super::{percent, top_predictions_line, Detector, NOT_AVAILABLE};
use crate::mapper::{map_predictions, MatchedRule};
use crate::traits::ClassifierInput;

const IMAGE_TOP_K: usize = 3;

#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub result: AggregateResult,
    pub predictions: Vec<ModelPrediction>,
}

impl Detector {
    pub async fn analyze_image(&self, bytes: &[u8]) -> ImageAnalysis {
        let Some(model) = &self.registry.image else {
            return ImageAnalysis {
                result: AggregateResult::degraded(
                    "Image deepfake detector not available. Please ensure models are properly loaded.",
                    NOT_AVAILABLE,
                ),
                predictions: Vec::new(),
            };
        };

        let predictions = match model.classify(ClassifierInput::Image(bytes), IMAGE_TOP_K).await {
            Ok(p) => p,
            Err(e) => {
                warn!(model = model.model_id(), error = %e, "Image classification failed");
                return ImageAnalysis {
                    result: AggregateResult::degraded(
                        format!("Image analysis failed: {e}"),
                        model.model_id(),
                    ),
                    predictions: Vec::new(),
                };
            }
        };

        let mapping = map_predictions(&self.rules.image, &predictions);
        let label = &mapping.label;
        let conf = percent(mapping.confidence);
        let mut explanation = match mapping.rule {
            MatchedRule::FakeKeyword => format!(
                "Potential manipulation detected. Image classification shows suspicious patterns. Top prediction: {label} ({conf} confidence)."
            ),
            MatchedRule::RealKeyword => format!(
                "Image appears authentic. Classification: {label} with {conf} confidence. No obvious signs of manipulation detected."
            ),
            MatchedRule::HighConfidence => format!(
                "Likely authentic. High-confidence classification: {label} ({conf}). No suspicious patterns detected."
            ),
            MatchedRule::Ambiguous => format!(
                "Analysis inconclusive. Model prediction: {label} ({conf} confidence). The confidence distribution is nearly flat, which can indicate AI generation or manipulation."
            ),
            MatchedRule::Inconclusive => format!(
                "Analysis inconclusive. Model prediction: {label} ({conf} confidence). Consider a specialized deepfake detector for better accuracy."
            ),
        };
        if !predictions.is_empty() {
            explanation.push_str("\n\n");
            explanation.push_str(&top_predictions_line(&predictions));
        }

        info!(verdict = %mapping.verdict, label = %label, confidence = mapping.confidence, "Image analysis complete");

        ImageAnalysis {
            result: AggregateResult::new(
                mapping.verdict,
                mapping.confidence,
                explanation,
                model.model_id(),
            ),
            predictions,
        }
    }
}
