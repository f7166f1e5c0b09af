//! Per-request media staging and ffmpeg-backed frame decoding.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::traits::{FrameSource, VideoInfo};

/// Frame rate assumed when the container doesn't report a usable one.
pub const DEFAULT_FPS: f64 = 30.0;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const FRAME_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// TempMedia
// ---------------------------------------------------------------------------

/// Upload bytes staged on disk for the length of one analysis. The file is
/// removed by `cleanup`, or on drop if the analysis bails out early.
pub struct TempMedia {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl TempMedia {
    /// Write `bytes` to a fresh `{prefix}*{suffix}` file in `dir`.
    pub async fn write(dir: &Path, prefix: &str, suffix: &str, bytes: &[u8]) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        let path = file.path().to_path_buf();

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Staged temp media");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now. Failures are logged and otherwise ignored.
    pub fn cleanup(mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                warn!(path = %self.path.display(), error = %e, "Failed to remove temp media");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FfmpegFrames
// ---------------------------------------------------------------------------

/// Decodes frames by shelling out to `ffprobe` and `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegFrames {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegFrames {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    /// True when both binaries run.
    pub async fn available(&self) -> bool {
        for bin in [&self.ffmpeg_bin, &self.ffprobe_bin] {
            let result = tokio::time::timeout(
                Duration::from_secs(5),
                tokio::process::Command::new(bin)
                    .arg("-version")
                    .kill_on_drop(true)
                    .output(),
            )
            .await;

            match result {
                Ok(Ok(output)) if output.status.success() => {}
                Ok(Ok(output)) => {
                    warn!(bin = %bin, status = %output.status, "Frame decoder exited with error");
                    return false;
                }
                Ok(Err(e)) => {
                    warn!(bin = %bin, error = %e, "Frame decoder not runnable");
                    return false;
                }
                Err(_) => {
                    warn!(bin = %bin, "Frame decoder version check timed out");
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    nb_frames: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Parse an ffprobe rate like `30000/1001` or `25`.
fn parse_rate(raw: &str) -> Option<f64> {
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn video_info(probe: &str) -> Result<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_str(probe).context("parsing ffprobe output")?;
    let Some(stream) = parsed.streams.into_iter().next() else {
        bail!("no video stream");
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(DEFAULT_FPS);

    let counted = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0);

    let total_frames = match counted {
        Some(n) => n,
        None => {
            let duration: f64 = stream
                .duration
                .as_deref()
                .and_then(|d| d.trim().parse().ok())
                .unwrap_or(0.0);
            (duration * fps).round().max(0.0) as u64
        }
    };

    Ok(VideoInfo { total_frames, fps })
}

#[async_trait]
impl FrameSource for FfmpegFrames {
    async fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let output = tokio::time::timeout(
            PROBE_TIMEOUT,
            tokio::process::Command::new(&self.ffprobe_bin)
                .args([
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "stream=nb_frames,avg_frame_rate,r_frame_rate,duration",
                    "-of",
                    "json",
                ])
                .arg(path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("ffprobe timed out")?
        .with_context(|| format!("running {}", self.ffprobe_bin))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Could not open video file: {}", stderr.trim());
        }

        video_info(&String::from_utf8_lossy(&output.stdout))
    }

    async fn frame(&self, path: &Path, index: u64, fps: f64) -> Result<Option<Vec<u8>>> {
        let fps = if fps > 0.0 { fps } else { DEFAULT_FPS };
        let seek = format!("{:.3}", index as f64 / fps);

        let output = tokio::time::timeout(
            FRAME_TIMEOUT,
            tokio::process::Command::new(&self.ffmpeg_bin)
                .args(["-v", "error", "-ss", &seek, "-i"])
                .arg(path)
                .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "pipe:1"])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .context("ffmpeg timed out")?
        .with_context(|| format!("running {}", self.ffmpeg_bin))?;

        if !output.status.success() || output.stdout.is_empty() {
            debug!(index, status = %output.status, "Frame not decodable");
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rates() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("junk"), None);
    }

    #[test]
    fn video_info_prefers_frame_count() {
        let info = video_info(
            r#"{"streams":[{"nb_frames":"240","avg_frame_rate":"24/1","duration":"99.0"}]}"#,
        )
        .unwrap();
        assert_eq!(info.total_frames, 240);
        assert_eq!(info.fps, 24.0);
        assert_eq!(info.duration_seconds(), 10.0);
    }

    #[test]
    fn video_info_falls_back_to_duration_and_default_fps() {
        let info =
            video_info(r#"{"streams":[{"avg_frame_rate":"0/0","duration":"2.5"}]}"#).unwrap();
        assert_eq!(info.fps, DEFAULT_FPS);
        assert_eq!(info.total_frames, 75);
    }

    #[test]
    fn video_info_requires_a_stream() {
        assert!(video_info(r#"{"streams":[]}"#).is_err());
        assert!(video_info("not json").is_err());
    }

    #[tokio::test]
    async fn temp_media_is_removed_on_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let media = TempMedia::write(dir.path(), "temp_video_", ".mp4", b"abc")
            .await
            .unwrap();
        let path = media.path().to_path_buf();

        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("temp_video_"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");

        media.cleanup();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn temp_media_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let media = TempMedia::write(dir.path(), "temp_audio_", ".wav", b"x")
            .await
            .unwrap();
        let path = media.path().to_path_buf();
        drop(media);
        assert!(!path.exists());
    }
}
