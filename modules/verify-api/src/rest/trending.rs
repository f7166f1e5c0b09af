use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use verify_detection::{TrendingQuery, TrendingTopic};

use crate::AppState;

#[derive(Deserialize)]
pub struct TrendingParams {
    limit: Option<usize>,
    location: Option<String>,
    country: Option<String>,
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrendingParams>,
) -> Json<Vec<TrendingTopic>> {
    let query = TrendingQuery {
        limit: params.limit,
        location: params.location,
        country: params.country,
    };
    Json(state.trending.topics(&query).await)
}
