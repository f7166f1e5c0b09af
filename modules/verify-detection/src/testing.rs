// Test doubles for the three trait seams.
//
// - FakeClassifier (Classifier): fixed or scripted predictions, counts calls
// - FakeSearcher (WebSearcher): canned outcome or a forced error
// - FakeFrames (FrameSource): synthetic frame count, optional decode cutoff

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use verify_common::ModelPrediction;

use crate::traits::{
    Classifier, ClassifierInput, FrameSource, SearchHit, SearchOutcome, VideoInfo, WebSearcher,
};

// ---------------------------------------------------------------------------
// FakeClassifier
// ---------------------------------------------------------------------------

/// Returns the same predictions every call unless responses were queued.
/// Audio inputs record the file path so tests can check it was cleaned up.
pub struct FakeClassifier {
    model: String,
    predictions: Vec<ModelPrediction>,
    queued: Mutex<VecDeque<Vec<ModelPrediction>>>,
    fail_with: Option<String>,
    calls: AtomicUsize,
    seen_paths: Mutex<Vec<PathBuf>>,
}

impl FakeClassifier {
    pub fn new(model: &str, predictions: &[(&str, f64)]) -> Self {
        Self {
            model: model.to_string(),
            predictions: predictions
                .iter()
                .map(|(label, score)| ModelPrediction::new(*label, *score))
                .collect(),
            queued: Mutex::new(VecDeque::new()),
            fail_with: None,
            calls: AtomicUsize::new(0),
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(model: &str, message: &str) -> Self {
        let mut fake = Self::new(model, &[]);
        fake.fail_with = Some(message.to_string());
        fake
    }

    /// Queue a one-off response, served before the fixed predictions.
    pub fn then(self, predictions: &[(&str, f64)]) -> Self {
        self.queued.lock().unwrap().push_back(
            predictions
                .iter()
                .map(|(label, score)| ModelPrediction::new(*label, *score))
                .collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for FakeClassifier {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn classify(
        &self,
        input: ClassifierInput<'_>,
        top_k: usize,
    ) -> Result<Vec<ModelPrediction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let ClassifierInput::AudioFile(path) = input {
            if !path.exists() {
                bail!("audio file missing: {}", path.display());
            }
            self.seen_paths.lock().unwrap().push(path.to_path_buf());
        }

        if let Some(message) = &self.fail_with {
            bail!("{message}");
        }

        let mut predictions = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.predictions.clone());
        predictions.truncate(top_k);
        Ok(predictions)
    }
}

// ---------------------------------------------------------------------------
// FakeSearcher
// ---------------------------------------------------------------------------

pub struct FakeSearcher {
    outcome: Option<SearchOutcome>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeSearcher {
    pub fn new(answer: Option<&str>, hits: &[(&str, &str, &str, f64)]) -> Self {
        Self {
            outcome: Some(SearchOutcome {
                answer: answer.map(str::to_string),
                hits: hits
                    .iter()
                    .map(|(title, url, content, score)| SearchHit {
                        title: title.to_string(),
                        url: url.to_string(),
                        content: content.to_string(),
                        score: *score,
                    })
                    .collect(),
            }),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every search errors.
    pub fn failing() -> Self {
        Self {
            outcome: None,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for FakeSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _include_answer: bool,
    ) -> Result<SearchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let Some(outcome) = &self.outcome else {
            bail!("search provider unavailable");
        };
        let mut outcome = outcome.clone();
        outcome.hits.truncate(max_results);
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// FakeFrames
// ---------------------------------------------------------------------------

/// Pretends every file is a video of `total_frames` frames. Frames at or past
/// `decodable` fail to decode.
pub struct FakeFrames {
    info: VideoInfo,
    decodable: Option<u64>,
    fail_probe: bool,
    requested: Mutex<Vec<u64>>,
    seen_paths: Mutex<Vec<PathBuf>>,
}

impl FakeFrames {
    pub fn new(total_frames: u64, fps: f64) -> Self {
        Self {
            info: VideoInfo { total_frames, fps },
            decodable: None,
            fail_probe: false,
            requested: Mutex::new(Vec::new()),
            seen_paths: Mutex::new(Vec::new()),
        }
    }

    pub fn decodable_until(mut self, index: u64) -> Self {
        self.decodable = Some(index);
        self
    }

    pub fn unreadable() -> Self {
        let mut fake = Self::new(0, 0.0);
        fake.fail_probe = true;
        fake
    }

    /// Frame indices requested, in order.
    pub fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.seen_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameSource for FakeFrames {
    async fn probe(&self, path: &Path) -> Result<VideoInfo> {
        self.seen_paths.lock().unwrap().push(path.to_path_buf());
        if self.fail_probe {
            bail!("Could not open video file");
        }
        Ok(self.info)
    }

    async fn frame(&self, _path: &Path, index: u64, _fps: f64) -> Result<Option<Vec<u8>>> {
        self.requested.lock().unwrap().push(index);
        if self.decodable.is_some_and(|limit| index >= limit) {
            return Ok(None);
        }
        Ok(Some(index.to_le_bytes().to_vec()))
    }
}
