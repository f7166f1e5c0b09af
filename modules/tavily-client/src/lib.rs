pub mod error;
pub mod types;

pub use error::{Result, TavilyError};
pub use types::{SearchRequest, SearchResponse, SearchResult};

use std::time::Duration;

use tracing::info;

const BASE_URL: &str = "https://api.tavily.com";

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TavilyError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }

    /// Run a web search. The answer is only populated when `include_answer` is set.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        info!(
            query = %request.query,
            max_results = request.max_results,
            "Tavily search"
        );

        let url = format!("{BASE_URL}/search");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let data: SearchResponse = serde_json::from_str(&body)?;

        info!(query = %request.query, count = data.results.len(), "Tavily search complete");
        Ok(data)
    }
}
