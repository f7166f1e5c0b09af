// Trait seams between the analyzers and the outside world.
//
// Classifier: one hosted model (text, image or audio).
// WebSearcher: the fact-check / trending search provider.
// FrameSource: decodes individual frames out of a video file.
//
// Production impls wrap hf-client, tavily-client and ffmpeg. Tests swap in
// the fakes from `testing` so no network or binaries are needed.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use verify_common::ModelPrediction;

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// What a classifier is asked to look at.
#[derive(Debug, Clone, Copy)]
pub enum ClassifierInput<'a> {
    Text(&'a str),
    Image(&'a [u8]),
    /// Audio is staged on disk first so decoding failures surface per file.
    AudioFile(&'a Path),
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Model identifier reported back to callers as `model_used`.
    fn model_id(&self) -> &str;

    /// Ranked predictions, highest score first, at most `top_k` of them.
    async fn classify(
        &self,
        input: ClassifierInput<'_>,
        top_k: usize,
    ) -> Result<Vec<ModelPrediction>>;
}

/// A hosted Hugging Face model.
pub struct HfClassifier {
    client: hf_client::HfClient,
    model: String,
}

impl HfClassifier {
    pub fn new(client: hf_client::HfClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Classifier for HfClassifier {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn classify(
        &self,
        input: ClassifierInput<'_>,
        top_k: usize,
    ) -> Result<Vec<ModelPrediction>> {
        let predictions = match input {
            ClassifierInput::Text(text) => {
                self.client.classify_text(&self.model, text, top_k).await?
            }
            ClassifierInput::Image(bytes) => {
                self.client
                    .classify_bytes(&self.model, bytes.to_vec(), top_k)
                    .await?
            }
            ClassifierInput::AudioFile(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("reading audio file {}", path.display()))?;
                self.client.classify_bytes(&self.model, bytes, top_k).await?
            }
        };

        Ok(predictions
            .into_iter()
            .map(|p| ModelPrediction::new(p.label, p.score))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// WebSearcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub answer: Option<String>,
    pub hits: Vec<SearchHit>,
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        include_answer: bool,
    ) -> Result<SearchOutcome>;
}

#[async_trait]
impl WebSearcher for tavily_client::TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        include_answer: bool,
    ) -> Result<SearchOutcome> {
        let mut request = tavily_client::SearchRequest::new(query, max_results);
        if include_answer {
            request = request.with_answer();
        }

        let response = tavily_client::TavilyClient::search(self, &request).await?;

        Ok(SearchOutcome {
            answer: response.answer,
            hits: response
                .results
                .into_iter()
                .map(|r| SearchHit {
                    title: r.title,
                    url: r.url,
                    content: r.content,
                    score: r.score,
                })
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// FrameSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub total_frames: u64,
    pub fps: f64,
}

impl VideoInfo {
    pub fn duration_seconds(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Frame count and rate of the first video stream.
    async fn probe(&self, path: &Path) -> Result<VideoInfo>;

    /// Encoded image bytes of one frame. `Ok(None)` when the frame can't be decoded.
    async fn frame(&self, path: &Path, index: u64, fps: f64) -> Result<Option<Vec<u8>>>;
}
