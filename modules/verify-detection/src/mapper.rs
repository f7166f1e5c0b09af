//! Maps raw classifier output onto real / fake / unverified.

use verify_common::{clamp_unit, ModelPrediction, RuleSet, SampleVerdict, Verdict};

/// Which rule produced the verdict. Analyzers use it to word explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedRule {
    FakeKeyword,
    RealKeyword,
    HighConfidence,
    Ambiguous,
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub verdict: Verdict,
    pub rule: MatchedRule,
    pub label: String,
    pub confidence: f64,
}

impl Mapping {
    pub fn into_sample(self, position: Option<u64>) -> SampleVerdict {
        SampleVerdict {
            verdict: self.verdict,
            confidence: self.confidence,
            label: self.label,
            position,
        }
    }
}

/// Apply one modality's rules to a ranked prediction list.
///
/// Order: fake keyword, real keyword above the modality minimum, high
/// confidence, ambiguity (low confidence or a flat top-k), then inconclusive.
/// With `ambiguity_first` the ambiguity check runs before high confidence.
pub fn map_predictions(rules: &RuleSet, predictions: &[ModelPrediction]) -> Mapping {
    let Some(top) = predictions.first() else {
        return Mapping {
            verdict: Verdict::Unverified,
            rule: MatchedRule::Inconclusive,
            label: String::new(),
            confidence: 0.0,
        };
    };

    let confidence = clamp_unit(top.score);
    let decide = |verdict, rule| Mapping {
        verdict,
        rule,
        label: top.label.clone(),
        confidence,
    };

    if rules.is_fake_label(&top.label) {
        return decide(Verdict::Fake, MatchedRule::FakeKeyword);
    }
    if rules.is_real_label(&top.label) && confidence > rules.real_min_confidence {
        return decide(Verdict::Real, MatchedRule::RealKeyword);
    }

    let ambiguous = is_ambiguous(rules, confidence, predictions);
    if rules.ambiguity_first && ambiguous {
        return decide(Verdict::Unverified, MatchedRule::Ambiguous);
    }
    if rules.high_confidence.is_some_and(|t| confidence > t) {
        return decide(Verdict::Real, MatchedRule::HighConfidence);
    }
    if ambiguous {
        return decide(Verdict::Unverified, MatchedRule::Ambiguous);
    }
    decide(Verdict::Unverified, MatchedRule::Inconclusive)
}

fn is_ambiguous(rules: &RuleSet, confidence: f64, predictions: &[ModelPrediction]) -> bool {
    if rules.low_confidence.is_some_and(|t| confidence < t) {
        return true;
    }

    match rules.spread {
        Some(spread) if spread.width > 0 && predictions.len() >= spread.width => {
            let window = &predictions[..spread.width];
            let max = window.iter().map(|p| p.score).fold(f64::MIN, f64::max);
            let min = window.iter().map(|p| p.score).fold(f64::MAX, f64::min);
            max - min < spread.below
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preds(items: &[(&str, f64)]) -> Vec<ModelPrediction> {
        items
            .iter()
            .map(|(l, s)| ModelPrediction::new(*l, *s))
            .collect()
    }

    #[test]
    fn fake_keyword_wins_regardless_of_confidence() {
        let m = map_predictions(&RuleSet::image(), &preds(&[("comic book", 0.12)]));
        assert_eq!(m.verdict, Verdict::Fake);
        assert_eq!(m.rule, MatchedRule::FakeKeyword);
        assert_eq!(m.confidence, 0.12);
    }

    #[test]
    fn image_real_keyword_needs_confidence_above_threshold() {
        let rules = RuleSet::image();

        let m = map_predictions(&rules, &preds(&[("portrait", 0.8)]));
        assert_eq!(m.verdict, Verdict::Real);
        assert_eq!(m.rule, MatchedRule::RealKeyword);

        let m = map_predictions(&rules, &preds(&[("portrait", 0.7)]));
        assert_eq!(m.verdict, Verdict::Unverified);
    }

    #[test]
    fn high_confidence_unmatched_label_is_real() {
        let m = map_predictions(&RuleSet::image(), &preds(&[("golden retriever", 0.9)]));
        assert_eq!(m.verdict, Verdict::Real);
        assert_eq!(m.rule, MatchedRule::HighConfidence);
    }

    #[test]
    fn flat_top_three_is_ambiguous() {
        let m = map_predictions(
            &RuleSet::image(),
            &preds(&[("tabby", 0.30), ("tiger cat", 0.25), ("lynx", 0.20)]),
        );
        assert_eq!(m.verdict, Verdict::Unverified);
        assert_eq!(m.rule, MatchedRule::Ambiguous);
    }

    #[test]
    fn spread_needs_full_window() {
        let m = map_predictions(&RuleSet::image(), &preds(&[("tabby", 0.30), ("lynx", 0.29)]));
        assert_eq!(m.rule, MatchedRule::Inconclusive);
    }

    #[test]
    fn audio_ambiguity_outranks_high_confidence() {
        let rules = RuleSet::audio();

        // 0.75 clears the high-confidence bar, but the top two are nearly tied.
        let m = map_predictions(&rules, &preds(&[("speech", 0.75), ("music", 0.6)]));
        assert_eq!(m.verdict, Verdict::Unverified);
        assert_eq!(m.rule, MatchedRule::Ambiguous);

        let m = map_predictions(&rules, &preds(&[("speech", 0.75), ("music", 0.1)]));
        assert_eq!(m.verdict, Verdict::Real);
        assert_eq!(m.rule, MatchedRule::HighConfidence);

        let m = map_predictions(&rules, &preds(&[("speech", 0.35)]));
        assert_eq!(m.rule, MatchedRule::Ambiguous);
    }

    #[test]
    fn audio_real_label_has_no_threshold() {
        let m = map_predictions(&RuleSet::audio(), &preds(&[("bonafide", 0.3)]));
        assert_eq!(m.verdict, Verdict::Real);
    }

    #[test]
    fn text_opaque_labels() {
        let rules = RuleSet::text();
        assert_eq!(
            map_predictions(&rules, &preds(&[("LABEL_0", 0.91)])).verdict,
            Verdict::Fake
        );
        assert_eq!(
            map_predictions(&rules, &preds(&[("LABEL_1", 0.66)])).verdict,
            Verdict::Real
        );
        assert_eq!(
            map_predictions(&rules, &preds(&[("NEUTRAL", 0.99)])).verdict,
            Verdict::Unverified
        );
    }

    #[test]
    fn empty_predictions_are_inconclusive() {
        let m = map_predictions(&RuleSet::text(), &[]);
        assert_eq!(m.verdict, Verdict::Unverified);
        assert_eq!(m.confidence, 0.0);
    }
}
