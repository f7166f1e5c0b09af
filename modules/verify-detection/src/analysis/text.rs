use tracing::{info, warn};

use hf_client::truncate_chars;
use verify_common::{AggregateResult, FactCheck, Verdict, VerifyError};

use super::{percent, Detector, NOT_AVAILABLE};
use crate::fact_check::append_answer;
use crate::mapper::{map_predictions, MatchedRule};
use crate::traits::ClassifierInput;

/// Shortest trimmed text worth sending to a model.
pub const MIN_TEXT_CHARS: usize = 10;
/// Model input is cut to this many characters.
pub const MODEL_INPUT_CHARS: usize = 512;

const SENTIMENT_DISCOUNT: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub result: AggregateResult,
    pub fact_check: FactCheck,
}

impl Detector {
    /// Classify a claim and augment the explanation with a live fact-check.
    /// Only an over-long input is an error; everything else degrades.
    pub async fn analyze_text(&self, text: &str) -> verify_common::Result<TextAnalysis> {
        let chars = text.chars().count();
        if chars > self.settings.max_text_chars {
            return Err(VerifyError::Validation(format!(
                "Text too long: {chars} characters, maximum is {}",
                self.settings.max_text_chars
            )));
        }

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            return Ok(TextAnalysis {
                result: AggregateResult::new(
                    Verdict::Unverified,
                    0.0,
                    "Text too short for analysis",
                    NOT_AVAILABLE,
                ),
                fact_check: FactCheck::default(),
            });
        }

        let input = truncate_chars(text, MODEL_INPUT_CHARS);
        let mut result = self.classify_claim(input).await;

        let fact_check = self.fact_checker.check(input).await;
        append_answer(&mut result.explanation, &fact_check);
        if self.fact_checker.is_available() {
            result.model_used = format!("{} + Tavily", result.model_used);
        }

        info!(
            verdict = %result.verdict,
            confidence = result.confidence,
            sources = fact_check.sources.len(),
            "Text analysis complete"
        );

        Ok(TextAnalysis { result, fact_check })
    }

    async fn classify_claim(&self, input: &str) -> AggregateResult {
        if let Some(model) = &self.registry.text {
            match model.classify(ClassifierInput::Text(input), 1).await {
                Ok(predictions) => {
                    let mapping = map_predictions(&self.rules.text, &predictions);
                    let conf = percent(mapping.confidence);
                    let explanation = match mapping.rule {
                        MatchedRule::FakeKeyword => format!(
                            "Fake news detected. The model classified this text as FAKE with {conf} confidence. The content shows signs of misinformation or fabricated claims."
                        ),
                        MatchedRule::RealKeyword | MatchedRule::HighConfidence => format!(
                            "Content appears authentic. The model classified this text as REAL with {conf} confidence."
                        ),
                        MatchedRule::Ambiguous | MatchedRule::Inconclusive => format!(
                            "Analysis inconclusive. Model prediction: {} ({conf} confidence). Manual fact-checking recommended.",
                            mapping.label
                        ),
                    };
                    return AggregateResult::new(
                        mapping.verdict,
                        mapping.confidence,
                        explanation,
                        model.model_id(),
                    );
                }
                Err(e) => warn!(model = model.model_id(), error = %e, "Fake-news model failed"),
            }
        }

        if let Some(model) = &self.registry.sentiment {
            match model.classify(ClassifierInput::Text(input), 1).await {
                Ok(predictions) => {
                    if let Some(top) = predictions.first() {
                        return AggregateResult::new(
                            Verdict::Unverified,
                            top.score * SENTIMENT_DISCOUNT,
                            format!(
                                "Using fallback sentiment analysis. Sentiment: {}. This is NOT fact-checking. Manual verification strongly recommended.",
                                top.label
                            ),
                            model.model_id(),
                        );
                    }
                }
                Err(e) => warn!(model = model.model_id(), error = %e, "Sentiment model failed"),
            }
        }

        AggregateResult::degraded(
            "AI models not available. Cannot perform analysis. Manual fact-checking required.",
            NOT_AVAILABLE,
        )
    }
}
