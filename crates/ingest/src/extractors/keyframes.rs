use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::traits::MediaToolkit;

pub const DEFAULT_KEYFRAMES: usize = 5;
const MIN_KEYFRAMES: usize = 3;
const MAX_KEYFRAMES: usize = 5;
/// Keeps the last grab inside the stream
const END_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub index: usize,
    pub at_seconds: f64,
    pub path: PathBuf,
}

pub fn clamp_count(requested: usize) -> usize {
    requested.clamp(MIN_KEYFRAMES, MAX_KEYFRAMES)
}

/// `count` evenly spaced timestamps from the start to the end of the video.
pub fn keyframe_times(duration: f64, count: usize) -> Vec<f64> {
    let last = (duration - END_MARGIN).max(0.0);

    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n).map(|i| last * i as f64 / (n - 1) as f64).collect(),
    }
}

/// Grabs `count` (clamped to 3..=5) frames into `out_dir`. Frames the tool
/// cannot decode are skipped.
pub async fn extract_keyframes(
    media: &dyn MediaToolkit,
    video: &Path,
    count: usize,
    out_dir: &Path,
) -> Result<(f64, Vec<Keyframe>)> {
    let duration = media.video_duration(video).await?;
    tokio::fs::create_dir_all(out_dir).await?;

    let mut frames = Vec::new();
    for (index, at_seconds) in keyframe_times(duration, clamp_count(count)).into_iter().enumerate() {
        let path = out_dir.join(format!("frame_{:02}.jpg", index));
        match media.extract_frame(video, at_seconds, &path).await {
            Ok(()) => frames.push(Keyframe {
                index,
                at_seconds,
                path,
            }),
            Err(e) => tracing::warn!("Skipping keyframe {} at {:.2}s: {}", index, at_seconds, e),
        }
    }

    tracing::debug!("Extracted {} keyframes from {}", frames.len(), video.display());
    Ok((duration, frames))
}
