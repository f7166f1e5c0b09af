//! Folds per-frame verdicts into one video verdict.

use verify_common::{clamp_unit, AggregationRules, RuleSet, SampleVerdict, Verdict};

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub verdict: Verdict,
    pub confidence: f64,
    pub suspicious: usize,
    pub total: usize,
}

impl Aggregation {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.suspicious as f64 / self.total as f64
        }
    }
}

/// A sample is suspicious when its label hits a fake keyword or its
/// confidence falls under `suspicious_below`. Returns `None` for no samples.
pub fn aggregate(
    rules: &AggregationRules,
    frame_rules: &RuleSet,
    samples: &[SampleVerdict],
) -> Option<Aggregation> {
    if samples.is_empty() {
        return None;
    }

    let total = samples.len();
    let suspicious = samples
        .iter()
        .filter(|s| frame_rules.is_fake_label(&s.label) || s.confidence < rules.suspicious_below)
        .count();
    let ratio = suspicious as f64 / total as f64;

    let verdict = if ratio > rules.fake_ratio {
        Verdict::Fake
    } else if ratio > rules.unverified_ratio {
        Verdict::Unverified
    } else {
        Verdict::Real
    };

    let mean = samples.iter().map(|s| s.confidence).sum::<f64>() / total as f64;

    Some(Aggregation {
        verdict,
        confidence: clamp_unit(mean),
        suspicious,
        total,
    })
}
