//! Keyword and threshold table driving the verdict heuristics.
//!
//! Every number and keyword here is a placeholder policy layered over
//! general-purpose classifiers. None of it is calibrated; swap the whole table
//! via `VERIFY_RULES_PATH` rather than tuning the defaults in code.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, VerifyError};

/// A label matcher. Written in TOML as a plain string: `"comic"` matches any
/// label containing "comic", `"=label_0"` matches only the exact label.
/// Matching is case-insensitive either way.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LabelPattern {
    Contains(String),
    Exact(String),
}

impl From<String> for LabelPattern {
    fn from(raw: String) -> Self {
        match raw.strip_prefix('=') {
            Some(exact) => LabelPattern::Exact(exact.to_lowercase()),
            None => LabelPattern::Contains(raw.to_lowercase()),
        }
    }
}

impl From<&str> for LabelPattern {
    fn from(raw: &str) -> Self {
        LabelPattern::from(raw.to_string())
    }
}

impl LabelPattern {
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        match self {
            LabelPattern::Contains(needle) => label.contains(needle.as_str()),
            LabelPattern::Exact(exact) => label == *exact,
        }
    }
}

/// "Nearly uniform" check over the top predictions: if the gap between the
/// highest and lowest of the first `width` scores is below `below`, the
/// classifier could not tell its top classes apart.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpreadCheck {
    pub width: usize,
    pub below: f64,
}

/// Rules for one modality.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleSet {
    pub fake: Vec<LabelPattern>,
    pub real: Vec<LabelPattern>,
    /// A real-keyword match only counts above this confidence.
    #[serde(default)]
    pub real_min_confidence: f64,
    /// Any label above this confidence is taken as real.
    #[serde(default)]
    pub high_confidence: Option<f64>,
    /// Below this confidence the sample is flagged ambiguous.
    #[serde(default)]
    pub low_confidence: Option<f64>,
    #[serde(default)]
    pub spread: Option<SpreadCheck>,
    /// Run the ambiguity check before the high-confidence check.
    #[serde(default)]
    pub ambiguity_first: bool,
}

impl RuleSet {
    pub fn is_fake_label(&self, label: &str) -> bool {
        self.fake.iter().any(|p| p.matches(label))
    }

    pub fn is_real_label(&self, label: &str) -> bool {
        self.real.iter().any(|p| p.matches(label))
    }

    pub fn text() -> Self {
        Self {
            fake: patterns(&["fake", "false", "=label_0"]),
            real: patterns(&["real", "true", "=label_1"]),
            real_min_confidence: 0.0,
            high_confidence: None,
            low_confidence: None,
            spread: None,
            ambiguity_first: false,
        }
    }

    pub fn image() -> Self {
        Self {
            fake: patterns(&["generated", "synthetic", "comic", "cartoon", "digital"]),
            real: patterns(&["person", "face", "photo", "portrait", "natural"]),
            real_min_confidence: 0.7,
            high_confidence: Some(0.85),
            low_confidence: None,
            spread: Some(SpreadCheck {
                width: 3,
                below: 0.15,
            }),
            ambiguity_first: false,
        }
    }

    pub fn frame() -> Self {
        Self {
            fake: patterns(&["generated", "synthetic", "comic"]),
            real: patterns(&["person", "face", "photo", "portrait", "natural"]),
            real_min_confidence: 0.7,
            high_confidence: Some(0.85),
            low_confidence: None,
            spread: None,
            ambiguity_first: false,
        }
    }

    pub fn audio() -> Self {
        Self {
            fake: patterns(&["fake", "spoof", "generated", "synthetic", "artificial"]),
            real: patterns(&["real", "bonafide", "genuine", "authentic", "natural"]),
            real_min_confidence: 0.0,
            high_confidence: Some(0.7),
            low_confidence: Some(0.4),
            spread: Some(SpreadCheck {
                width: 2,
                below: 0.2,
            }),
            ambiguity_first: true,
        }
    }
}

/// Thresholds for folding per-frame verdicts into one video verdict.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregationRules {
    /// Frames under this confidence count as suspicious.
    pub suspicious_below: f64,
    /// Suspicious ratio strictly above this is fake.
    pub fake_ratio: f64,
    /// Suspicious ratio strictly above this (and not fake) is unverified.
    pub unverified_ratio: f64,
}

impl Default for AggregationRules {
    fn default() -> Self {
        Self {
            suspicious_below: 0.6,
            fake_ratio: 0.5,
            unverified_ratio: 0.3,
        }
    }
}

/// The full rule table. Sections missing from a rules file keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerdictRules {
    #[serde(default = "RuleSet::text")]
    pub text: RuleSet,
    #[serde(default = "RuleSet::image")]
    pub image: RuleSet,
    #[serde(default = "RuleSet::frame")]
    pub frame: RuleSet,
    #[serde(default = "RuleSet::audio")]
    pub audio: RuleSet,
    #[serde(default)]
    pub aggregation: AggregationRules,
}

impl Default for VerdictRules {
    fn default() -> Self {
        Self {
            text: RuleSet::text(),
            image: RuleSet::image(),
            frame: RuleSet::frame(),
            audio: RuleSet::audio(),
            aggregation: AggregationRules::default(),
        }
    }
}

impl VerdictRules {
    /// Parse a rule table from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VerifyError::Config(format!("Invalid rules: {e}")))
    }

    /// Load a rule table from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerifyError::Config(format!(
                "Failed to read rules file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }
}

fn patterns(raw: &[&str]) -> Vec<LabelPattern> {
    raw.iter().map(|s| LabelPattern::from(*s)).collect()
}
