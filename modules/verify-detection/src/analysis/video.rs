use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use verify_common::{AggregateResult, Modality, SampleVerdict, Verdict, VerifyError};

use super::{elapsed_ms, percent, Detector, NOT_AVAILABLE};
use crate::aggregator::aggregate;
use crate::mapper::map_predictions;
use crate::media::TempMedia;
use crate::sampler::{frame_positions, MAX_SAMPLED_FRAMES};
use crate::traits::{Classifier, ClassifierInput, FrameSource};

const FRAME_TOP_K: usize = 2;
const FRAME_DETAILS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDetail {
    pub frame_number: u64,
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub result: AggregateResult,
    pub frames_analyzed: usize,
    pub duration_seconds: f64,
    pub processing_time_ms: u64,
    /// The first few sampled frames, for reference.
    pub frame_details: Vec<FrameDetail>,
}

impl VideoAnalysis {
    fn bare(result: AggregateResult, started: Instant) -> Self {
        Self {
            result,
            frames_analyzed: 0,
            duration_seconds: 0.0,
            processing_time_ms: elapsed_ms(started),
            frame_details: Vec::new(),
        }
    }
}

struct Sampled {
    duration_seconds: f64,
    samples: Vec<SampleVerdict>,
}

impl Detector {
    /// Sample up to eight frames, classify each in turn, and fold them into one verdict.
    pub async fn analyze_video(&self, bytes: &[u8]) -> verify_common::Result<VideoAnalysis> {
        if bytes.len() > self.settings.max_video_bytes {
            return Err(VerifyError::too_large(
                Modality::Video,
                self.settings.max_video_bytes,
            ));
        }

        let started = Instant::now();

        let (Some(model), Some(frames)) = (&self.registry.image, &self.registry.frames) else {
            return Ok(VideoAnalysis::bare(
                AggregateResult::degraded(
                    "Video deepfake detector not loaded. Please ensure the image model and frame decoder are available.",
                    NOT_AVAILABLE,
                ),
                started,
            ));
        };
        let model_used = format!("{} frame-by-frame", model.model_id());

        let media =
            match TempMedia::write(&self.settings.temp_dir, "temp_video_", ".mp4", bytes).await {
                Ok(media) => media,
                Err(e) => {
                    warn!(error = %e, "Failed to stage video");
                    return Ok(VideoAnalysis::bare(failed(&e, &model_used), started));
                }
            };

        let sampled = self
            .sample_frames(model.as_ref(), frames.as_ref(), media.path())
            .await;
        media.cleanup();

        let sampled = match sampled {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Video analysis failed");
                return Ok(VideoAnalysis::bare(failed(&e, &model_used), started));
            }
        };

        let frames_analyzed = sampled.samples.len();
        let frame_details = sampled
            .samples
            .iter()
            .take(FRAME_DETAILS)
            .map(|s| FrameDetail {
                frame_number: s.position.unwrap_or_default(),
                label: s.label.clone(),
                confidence: s.confidence,
            })
            .collect();

        let result = match aggregate(&self.rules.aggregation, &self.rules.frame, &sampled.samples) {
            None => AggregateResult::new(
                Verdict::Unverified,
                0.0,
                "Could not analyze video frames. The video may be corrupted or in an unsupported format.",
                model_used,
            ),
            Some(agg) => {
                debug!(
                    suspicious = agg.suspicious,
                    ratio = agg.ratio(),
                    "Frames aggregated"
                );
                let n = agg.total;
                let flagged = agg.suspicious;
                let avg = percent(agg.confidence);
                let secs = sampled.duration_seconds;
                let explanation = match agg.verdict {
                    Verdict::Fake => format!(
                        "Potential deepfake detected. Analyzed {n} frames across {secs:.1}s of video. {flagged}/{n} frames show suspicious patterns (average confidence: {avg})."
                    ),
                    Verdict::Unverified => format!(
                        "Inconclusive results. Analyzed {n} frames. {flagged}/{n} frames show anomalies. Manual review recommended (average confidence: {avg})."
                    ),
                    Verdict::Real => format!(
                        "Video appears authentic. Analyzed {n} frames across {secs:.1}s. {}/{n} frames show no manipulation signs (average confidence: {avg}).",
                        n - flagged
                    ),
                };
                AggregateResult::new(agg.verdict, agg.confidence, explanation, model_used)
            }
        };

        info!(
            verdict = %result.verdict,
            frames = frames_analyzed,
            duration_secs = sampled.duration_seconds,
            "Video analysis complete"
        );

        Ok(VideoAnalysis {
            result,
            frames_analyzed,
            duration_seconds: sampled.duration_seconds,
            processing_time_ms: elapsed_ms(started),
            frame_details,
        })
    }

    /// Frames are pulled and classified strictly one at a time. The first
    /// frame that can't be decoded ends sampling; a classifier error fails
    /// the whole video.
    async fn sample_frames(
        &self,
        model: &dyn Classifier,
        frames: &dyn FrameSource,
        path: &Path,
    ) -> Result<Sampled> {
        let info = frames.probe(path).await?;
        let positions = frame_positions(info.total_frames, MAX_SAMPLED_FRAMES);

        let mut samples = Vec::with_capacity(positions.len());
        for index in positions {
            let frame = match frames.frame(path, index, info.fps).await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    warn!(index, error = %e, "Frame decode failed, stopping early");
                    break;
                }
            };

            let predictions = model
                .classify(ClassifierInput::Image(&frame), FRAME_TOP_K)
                .await?;
            let mapping = map_predictions(&self.rules.frame, &predictions);
            samples.push(mapping.into_sample(Some(index)));
        }

        Ok(Sampled {
            duration_seconds: info.duration_seconds(),
            samples,
        })
    }
}

fn failed(e: &anyhow::Error, model_used: &str) -> AggregateResult {
    AggregateResult::degraded(
        format!(
            "Video analysis failed: {e}. Ensure the video is in a supported format (MP4, WebM, MOV)."
        ),
        model_used,
    )
}
