pub mod error;
pub mod util;

pub use error::{HfError, Result};
pub use util::truncate_chars;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

const INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference";
const HUB_URL: &str = "https://huggingface.co";

/// One ranked label returned by a classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

/// Classification pipelines answer either `[{..}]` or `[[{..}]]` depending on
/// the task and whether the input was batched.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionsBody {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct HfClient {
    client: reqwest::Client,
    inference_url: String,
    hub_url: String,
    token: Option<String>,
}

impl HfClient {
    pub fn new(token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HfError::Config(e.to_string()))?;

        Ok(Self {
            client,
            inference_url: INFERENCE_URL.to_string(),
            hub_url: HUB_URL.to_string(),
            token: token.filter(|t| !t.is_empty()).map(String::from),
        })
    }

    pub fn with_inference_url(mut self, url: &str) -> Self {
        self.inference_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_hub_url(mut self, url: &str) -> Self {
        self.hub_url = url.trim_end_matches('/').to_string();
        self
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Run a text-classification model.
    pub async fn classify_text(
        &self,
        model: &str,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<Prediction>> {
        let url = format!("{}/models/{}", self.inference_url, model);
        debug!(model, chars = text.chars().count(), "HF text classification");

        let body = serde_json::json!({
            "inputs": text,
            "parameters": { "top_k": top_k },
        });

        let resp = self
            .authorize(self.client.post(&url))
            .header("x-wait-for-model", "true")
            .json(&body)
            .send()
            .await?;

        read_predictions(resp, top_k).await
    }

    /// Run an image- or audio-classification model on raw file bytes.
    pub async fn classify_bytes(
        &self,
        model: &str,
        bytes: Vec<u8>,
        top_k: usize,
    ) -> Result<Vec<Prediction>> {
        let url = format!("{}/models/{}", self.inference_url, model);
        debug!(model, bytes = bytes.len(), "HF binary classification");

        let resp = self
            .authorize(self.client.post(&url))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("x-wait-for-model", "true")
            .body(bytes)
            .send()
            .await?;

        read_predictions(resp, top_k).await
    }

    /// Check that a model exists on the Hub and is reachable with our token.
    pub async fn model_available(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/models/{}", self.hub_url, model);

        let resp = self.authorize(self.client.get(&url)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(HfError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

async fn read_predictions(resp: reqwest::Response, top_k: usize) -> Result<Vec<Prediction>> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        return Err(HfError::Api {
            status: status.as_u16(),
            message,
        });
    }

    parse_predictions(&text, top_k)
}

/// Parse a classification response, sorted by descending score and cut to `top_k`.
pub fn parse_predictions(body: &str, top_k: usize) -> Result<Vec<Prediction>> {
    let parsed: PredictionsBody = serde_json::from_str(body)?;
    let mut predictions = match parsed {
        PredictionsBody::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        PredictionsBody::Flat(flat) => flat,
    };

    if predictions.is_empty() {
        return Err(HfError::Parse("model returned no predictions".to_string()));
    }

    for p in &mut predictions {
        p.score = p.score.clamp(0.0, 1.0);
    }
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    predictions.truncate(top_k.max(1));
    Ok(predictions)
}
