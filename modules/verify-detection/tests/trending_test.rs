use std::sync::Arc;

use verify_detection::testing::FakeSearcher;
use verify_detection::{TrendingFeed, TrendingQuery};

#[tokio::test]
async fn live_topics_come_from_search_hits() {
    let searcher = Arc::new(FakeSearcher::new(
        None,
        &[
            ("Fake vaccine memo", "https://a.example", "health ministry denies", 0.7),
            ("Doctored election video", "https://b.example", "", 0.6),
            ("Third hit is never used", "https://c.example", "", 0.5),
        ],
    ));
    let feed = TrendingFeed::new(Some(searcher.clone()));

    let topics = feed
        .topics(&TrendingQuery {
            limit: Some(4),
            location: Some("Pune".to_string()),
            country: None,
        })
        .await;

    // limit 4 -> two queries, two hits taken from each.
    assert_eq!(searcher.calls(), 2);
    assert_eq!(searcher.queries()[0], "fake news trending in Pune India");
    assert_eq!(topics.len(), 4);
    assert_eq!(
        topics.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert_eq!(topics[0].category, "health");
    assert_eq!(topics[1].category, "politics");
    assert!(topics.iter().all(|t| t.region == "Pune"));
    assert!(topics.iter().all(|t| t.trending_score <= 1.0));
    assert!(topics
        .iter()
        .all(|t| t.fake_count + t.real_count == t.total_checks));
}

#[tokio::test]
async fn failed_searches_fall_back_to_placeholders() {
    let searcher = Arc::new(FakeSearcher::failing());
    let feed = TrendingFeed::new(Some(searcher.clone()));

    let topics = feed.topics(&TrendingQuery::default()).await;

    assert_eq!(searcher.calls(), 5);
    assert_eq!(topics.len(), 10);
    assert!(topics[0].title.starts_with("Trending Topic"));
}
