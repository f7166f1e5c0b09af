//! Trending misinformation topics, estimated from live search results.
//!
//! Engagement numbers are derived from the search relevance score. They are
//! estimates, not counts of checks actually run through this service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use hf_client::truncate_chars;

use crate::traits::{SearchHit, WebSearcher};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;
pub const DEFAULT_COUNTRY: &str = "India";

const RESULTS_PER_QUERY: usize = 3;
const TAKEN_PER_QUERY: usize = 2;
const TITLE_CHARS: usize = 100;
const PLACEHOLDER_TOPICS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingTopic {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub fake_count: u64,
    pub real_count: u64,
    pub total_checks: u64,
    pub trending_score: f64,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
    pub region: String,
}

#[derive(Debug, Clone, Default)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
    pub location: Option<String>,
    pub country: Option<String>,
}

impl TrendingQuery {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    fn country(&self) -> &str {
        self.country
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.trim().is_empty())
    }

    fn region(&self) -> String {
        self.location().unwrap_or(self.country()).to_string()
    }

    fn search_queries(&self) -> Vec<String> {
        let country = self.country();
        match self.location() {
            Some(location) => vec![
                format!("fake news trending in {location} {country}"),
                format!("viral misinformation {location} today"),
                format!("debunked stories {location}"),
                "fake news trending today".to_string(),
                "viral misinformation this week".to_string(),
            ],
            None => vec![
                format!("fake news trending in {country}"),
                "fake news trending today".to_string(),
                "viral misinformation this week".to_string(),
                "fact check trending claims".to_string(),
                "debunked stories today".to_string(),
                "social media hoaxes trending".to_string(),
            ],
        }
    }
}

#[derive(Clone)]
pub struct TrendingFeed {
    searcher: Option<Arc<dyn WebSearcher>>,
}

impl TrendingFeed {
    pub fn new(searcher: Option<Arc<dyn WebSearcher>>) -> Self {
        Self { searcher }
    }

    /// Live topics when search is configured and returns something,
    /// placeholder topics otherwise.
    pub async fn topics(&self, query: &TrendingQuery) -> Vec<TrendingTopic> {
        let limit = query.limit();
        if limit == 0 {
            return Vec::new();
        }

        if let Some(searcher) = &self.searcher {
            let live = live_topics(searcher.as_ref(), query, limit).await;
            if !live.is_empty() {
                info!(count = live.len(), "Trending topics from search");
                return live;
            }
            info!("No live trending topics, serving placeholders");
        }

        placeholder_topics(limit)
    }
}

async fn live_topics(
    searcher: &dyn WebSearcher,
    query: &TrendingQuery,
    limit: usize,
) -> Vec<TrendingTopic> {
    let region = query.region();
    let query_count = (limit / 2).max(1);
    let mut topics = Vec::new();

    for q in query.search_queries().into_iter().take(query_count) {
        let outcome = match searcher.search(&q, RESULTS_PER_QUERY, false).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(query = %q, error = %e, "Trending search failed");
                continue;
            }
        };

        for hit in outcome.hits.iter().take(TAKEN_PER_QUERY) {
            topics.push(estimate(topics.len() as u32 + 1, hit, &region));
            if topics.len() >= limit {
                return topics;
            }
        }
    }

    topics
}

fn estimate(id: u32, hit: &SearchHit, region: &str) -> TrendingTopic {
    let trending_score = (hit.score * 1.2).clamp(0.0, 1.0);
    let total_checks = (trending_score * 1000.0) as u64 + 100;
    let fake_count = total_checks * 7 / 10;
    let title = if hit.title.is_empty() {
        "Unknown Topic"
    } else {
        truncate_chars(&hit.title, TITLE_CHARS)
    };

    TrendingTopic {
        id,
        title: title.to_string(),
        category: categorize(&hit.title, &hit.content).to_string(),
        fake_count,
        real_count: total_checks - fake_count,
        total_checks,
        trending_score,
        created_at: Utc::now(),
        source_url: hit.url.clone(),
        region: region.to_string(),
    }
}

/// First keyword group found in the title or content wins.
pub fn categorize(title: &str, content: &str) -> &'static str {
    const GROUPS: &[(&str, &[&str])] = &[
        ("politics", &["politic", "election", "government"]),
        ("health", &["health", "vaccine", "medical", "covid"]),
        ("science", &["science", "climate", "environment"]),
        ("entertainment", &["celebrity", "entertainment"]),
    ];

    let haystack = format!("{title} {content}").to_lowercase();
    GROUPS
        .iter()
        .find(|(_, words)| words.iter().any(|w| haystack.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or("general")
}

fn placeholder_topics(limit: usize) -> Vec<TrendingTopic> {
    const CATEGORIES: [&str; 4] = ["politics", "technology", "health", "entertainment"];

    (0..limit.min(PLACEHOLDER_TOPICS))
        .map(|i| {
            let fake_count = 45 + i as u64 * 5;
            let real_count = 120 + i as u64 * 10;
            TrendingTopic {
                id: i as u32 + 1,
                title: format!("Trending Topic {}", i + 1),
                category: CATEGORIES[i % CATEGORIES.len()].to_string(),
                fake_count,
                real_count,
                total_checks: fake_count + real_count,
                trending_score: 0.85 - i as f64 * 0.05,
                created_at: Utc::now(),
                source_url: String::new(),
                region: String::new(),
            }
        })
        .collect()
}
