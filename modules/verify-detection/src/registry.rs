//! Read-only set of models and providers, built once at startup.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use verify_common::Config;

use crate::media::FfmpegFrames;
use crate::traits::{Classifier, FrameSource, HfClassifier, WebSearcher};

/// Everything the analyzers may call out to. A `None` slot means that
/// capability is unavailable and the matching analyzer answers degraded.
#[derive(Clone, Default, TypedBuilder)]
pub struct ModelRegistry {
    #[builder(default, setter(strip_option))]
    pub text: Option<Arc<dyn Classifier>>,
    /// Registered only when the fake-news model failed its startup probe.
    #[builder(default, setter(strip_option))]
    pub sentiment: Option<Arc<dyn Classifier>>,
    #[builder(default, setter(strip_option))]
    pub image: Option<Arc<dyn Classifier>>,
    #[builder(default, setter(strip_option))]
    pub audio: Option<Arc<dyn Classifier>>,
    #[builder(default, setter(strip_option))]
    pub frames: Option<Arc<dyn FrameSource>>,
    #[builder(default, setter(strip_option))]
    pub searcher: Option<Arc<dyn WebSearcher>>,
}

/// Availability flags reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStatus {
    pub tavily: bool,
    pub fake_news_detector: bool,
    pub sentiment_analyzer: bool,
    pub image_deepfake_detector: bool,
    pub video_deepfake_detector: bool,
    pub voice_deepfake_detector: bool,
    pub frame_decoder: bool,
}

impl ModelRegistry {
    /// Probe every configured model and provider and register what answers.
    pub async fn load(config: &Config) -> anyhow::Result<Self> {
        let mut registry = Self::default();

        if let Some(key) = &config.tavily_api_key {
            let client = tavily_client::TavilyClient::new(key, config.tavily_timeout)?;
            registry.searcher = Some(Arc::new(client));
            info!("Tavily search enabled");
        } else {
            warn!("TAVILY_API_KEY not set, fact-checking disabled");
        }

        let mut hf = hf_client::HfClient::new(config.huggingface_token.as_deref(), config.hf_timeout)?;
        if let Some(url) = &config.hf_inference_url {
            hf = hf.with_inference_url(url);
        }
        if let Some(url) = &config.hf_hub_url {
            hf = hf.with_hub_url(url);
        }

        if probe(&hf, &config.text_model).await {
            registry.text = Some(classifier(&hf, &config.text_model));
        } else if probe(&hf, &config.sentiment_model).await {
            warn!(
                model = %config.sentiment_model,
                "Fake-news model unavailable, falling back to sentiment analysis"
            );
            registry.sentiment = Some(classifier(&hf, &config.sentiment_model));
        }

        if probe(&hf, &config.image_model).await {
            registry.image = Some(classifier(&hf, &config.image_model));
        }

        for model in &config.audio_models {
            if probe(&hf, model).await {
                registry.audio = Some(classifier(&hf, model));
                break;
            }
        }
        if registry.audio.is_none() {
            warn!("No audio model available, voice analysis disabled");
        }

        let ffmpeg = FfmpegFrames::new(&config.ffmpeg_bin, &config.ffprobe_bin);
        if ffmpeg.available().await {
            registry.frames = Some(Arc::new(ffmpeg));
        } else {
            warn!("ffmpeg/ffprobe unavailable, video analysis disabled");
        }

        let status = registry.status();
        info!(
            text = status.fake_news_detector,
            sentiment = status.sentiment_analyzer,
            image = status.image_deepfake_detector,
            video = status.video_deepfake_detector,
            voice = status.voice_deepfake_detector,
            tavily = status.tavily,
            "Model registry loaded"
        );

        Ok(registry)
    }

    /// Video needs both an image classifier and a frame decoder.
    pub fn video_available(&self) -> bool {
        self.image.is_some() && self.frames.is_some()
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            tavily: self.searcher.is_some(),
            fake_news_detector: self.text.is_some(),
            sentiment_analyzer: self.sentiment.is_some(),
            image_deepfake_detector: self.image.is_some(),
            video_deepfake_detector: self.video_available(),
            voice_deepfake_detector: self.audio.is_some(),
            frame_decoder: self.frames.is_some(),
        }
    }
}

async fn probe(hf: &hf_client::HfClient, model: &str) -> bool {
    match hf.model_available(model).await {
        Ok(()) => {
            info!(model, "Model available");
            true
        }
        Err(e) => {
            warn!(model, error = %e, "Model unavailable");
            false
        }
    }
}

fn classifier(hf: &hf_client::HfClient, model: &str) -> Arc<dyn Classifier> {
    Arc::new(HfClassifier::new(hf.clone(), model))
}
