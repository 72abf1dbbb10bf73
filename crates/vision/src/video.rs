//! Video frame extraction.

use crate::frame::{TARGET_SIZE, frame_indices};
use anyhow::{Context, Result, bail};
use image::RgbImage;
use serde::Deserialize;
use std::{future::Future, process::Stdio};
use tokio::process::Command;

/// Decodes sampled frames out of a video.
pub trait FrameSource: Send + Sync {
    /// Frames chosen by [`frame_indices`], already at [`TARGET_SIZE`].
    fn frames(&self, video: &[u8]) -> impl Future<Output = Result<Vec<RgbImage>>> + Send;
}

/// Frame source backed by `ffprobe` and `ffmpeg`.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffprobe: String,
    ffmpeg: String,
}

impl Ffmpeg {
    /// Use specific executables.
    pub fn new(ffprobe: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    /// Decoded frame count and average frame rate of the first video
    /// stream.
    async fn probe(&self, path: &std::path::Path) -> Result<(usize, f64)> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0", "-count_frames"])
            .args(["-show_entries", "stream=nb_read_frames,avg_frame_rate"])
            .args(["-of", "json"])
            .arg(path)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.ffprobe))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.ffprobe,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_probe(&output.stdout)
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffprobe", "ffmpeg")
    }
}

impl FrameSource for Ffmpeg {
    async fn frames(&self, video: &[u8]) -> Result<Vec<RgbImage>> {
        let file = tempfile::NamedTempFile::new()?;
        tokio::fs::write(file.path(), video).await?;
        let (total, fps) = self.probe(file.path()).await?;
        let indices = frame_indices(total, fps);
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let (width, height) = TARGET_SIZE;
        let output = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(file.path())
            .arg("-vf")
            .arg(format!("{},scale={width}:{height}", select_filter(&indices)))
            .args(["-vsync", "vfr", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.ffmpeg))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.ffmpeg,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(split_frames(output.stdout))
    }
}

#[derive(Deserialize)]
struct Probe {
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    nb_read_frames: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Parse `ffprobe -of json` output into (frame count, frames per second).
pub fn parse_probe(json: &[u8]) -> Result<(usize, f64)> {
    let probe: Probe = serde_json::from_slice(json)?;
    let Some(stream) = probe.streams.into_iter().next() else {
        bail!("no video stream");
    };
    let total = stream
        .nb_read_frames
        .as_deref()
        .unwrap_or("0")
        .parse::<usize>()
        .context("invalid frame count")?;
    let fps = stream.avg_frame_rate.as_deref().map(parse_rate).unwrap_or(1.0);
    Ok((total, fps))
}

/// `30000/1001` → 29.97; malformed or zero denominators give 1.
fn parse_rate(rate: &str) -> f64 {
    let parsed = match rate.split_once('/') {
        Some((num, den)) => match (num.parse::<f64>(), den.parse::<f64>()) {
            (Ok(num), Ok(den)) if den > 0.0 => Some(num / den),
            _ => None,
        },
        None => rate.parse().ok(),
    };
    parsed.filter(|fps| fps.is_finite() && *fps > 0.0).unwrap_or(1.0)
}

/// `select` filter keeping exactly the given frame numbers.
fn select_filter(indices: &[usize]) -> String {
    let terms = indices
        .iter()
        .map(|i| format!("eq(n\\,{i})"))
        .collect::<Vec<_>>()
        .join("+");
    format!("select={terms}")
}

/// Cut raw rgb24 output into target-size frames; a short tail is dropped.
fn split_frames(raw: Vec<u8>) -> Vec<RgbImage> {
    let (width, height) = TARGET_SIZE;
    let frame_len = (width * height * 3) as usize;
    raw.chunks_exact(frame_len)
        .filter_map(|chunk| RgbImage::from_raw(width, height, chunk.to_vec()))
        .collect()
}
