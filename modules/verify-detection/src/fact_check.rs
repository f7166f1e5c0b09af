//! Real-time fact-check augmentation backed by a web search provider.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use hf_client::truncate_chars;
use verify_common::{FactCheck, SourceRef};

use crate::traits::WebSearcher;

pub const MAX_SOURCES: usize = 3;
pub const SNIPPET_CHARS: usize = 200;
pub const ANSWER_CHARS: usize = 200;

pub const CONTEXT_UNAVAILABLE: &str = "Tavily not available";
pub const CONTEXT_FAILED: &str = "Search failed";

#[derive(Clone)]
pub struct FactChecker {
    searcher: Option<Arc<dyn WebSearcher>>,
    timeout: Duration,
}

impl FactChecker {
    pub fn new(searcher: Option<Arc<dyn WebSearcher>>, timeout: Duration) -> Self {
        Self { searcher, timeout }
    }

    pub fn is_available(&self) -> bool {
        self.searcher.is_some()
    }

    /// Search for `claim`. Never fails: provider problems collapse into an
    /// empty source list with a short context string.
    pub async fn check(&self, claim: &str) -> FactCheck {
        let Some(searcher) = &self.searcher else {
            return FactCheck {
                sources: Vec::new(),
                context: CONTEXT_UNAVAILABLE.to_string(),
            };
        };

        let outcome = match tokio::time::timeout(
            self.timeout,
            searcher.search(claim, MAX_SOURCES, true),
        )
        .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(error = %e, "Fact-check search failed");
                return failed();
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Fact-check search timed out");
                return failed();
            }
        };

        let sources: Vec<SourceRef> = outcome
            .hits
            .into_iter()
            .take(MAX_SOURCES)
            .map(|hit| SourceRef {
                title: hit.title,
                url: hit.url,
                snippet: truncate_chars(&hit.content, SNIPPET_CHARS).to_string(),
            })
            .collect();

        info!(sources = sources.len(), "Fact-check search complete");

        FactCheck {
            sources,
            context: outcome.answer.unwrap_or_default(),
        }
    }
}

fn failed() -> FactCheck {
    FactCheck {
        sources: Vec::new(),
        context: CONTEXT_FAILED.to_string(),
    }
}

/// Append the provider's answer to an explanation. Fallback contexts are not
/// answers and are left out.
pub fn append_answer(explanation: &mut String, fact: &FactCheck) {
    let answer = fact.context.trim();
    if answer.is_empty() || answer == CONTEXT_UNAVAILABLE || answer == CONTEXT_FAILED {
        return;
    }
    explanation.push_str("\n\nReal-time fact-check: ");
    explanation.push_str(truncate_chars(answer, ANSWER_CHARS));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_truncated_answer() {
        let mut explanation = String::from("Model says fake.");
        let fact = FactCheck {
            sources: Vec::new(),
            context: "y".repeat(500),
        };
        append_answer(&mut explanation, &fact);

        let (head, tail) = explanation.split_once("\n\nReal-time fact-check: ").unwrap();
        assert_eq!(head, "Model says fake.");
        assert_eq!(tail.chars().count(), ANSWER_CHARS);
    }

    #[test]
    fn fallback_contexts_are_not_appended() {
        for context in [CONTEXT_UNAVAILABLE, CONTEXT_FAILED, ""] {
            let mut explanation = String::from("x");
            append_answer(
                &mut explanation,
                &FactCheck {
                    sources: Vec::new(),
                    context: context.to_string(),
                },
            );
            assert_eq!(explanation, "x");
        }
    }

    #[tokio::test]
    async fn missing_provider_reports_unavailable() {
        let checker = FactChecker::new(None, Duration::from_secs(1));
        let fact = checker.check("anything").await;
        assert!(fact.sources.is_empty());
        assert_eq!(fact.context, CONTEXT_UNAVAILABLE);
    }
}
