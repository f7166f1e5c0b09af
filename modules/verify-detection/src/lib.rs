pub mod aggregator;
pub mod analysis;
pub mod fact_check;
pub mod mapper;
pub mod media;
pub mod registry;
pub mod sampler;
pub mod traits;
pub mod trending;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analysis::{
    Analysis, Detector, DetectorSettings, FrameDetail, ImageAnalysis, TextAnalysis,
    VideoAnalysis, VoiceAnalysis,
};
pub use fact_check::FactChecker;
pub use registry::{ModelRegistry, ModelStatus};
pub use traits::{Classifier, ClassifierInput, FrameSource, WebSearcher};
pub use trending::{TrendingFeed, TrendingQuery, TrendingTopic};
