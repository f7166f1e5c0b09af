pub mod config;
pub mod error;
pub mod rules;
pub mod types;

pub use config::{Config, Environment, ValidationReport};
pub use error::{Result, VerifyError};
pub use rules::{AggregationRules, LabelPattern, RuleSet, SpreadCheck, VerdictRules};
pub use types::*;
