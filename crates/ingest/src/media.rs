use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{IngestError, Result};
use crate::traits::{MediaToolkit, VideoMetadata};

const YT_DLP_FORMAT: &str = "best[height<=720][ext=mp4]/best[height<=720]/best";
const MAX_FILESIZE: &str = "500M";
const STDERR_TAIL: usize = 500;

/// [`MediaToolkit`] backed by the `yt-dlp`, `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct CommandMedia {
    yt_dlp: String,
    ffmpeg: String,
    ffprobe: String,
}

impl CommandMedia {
    pub fn new(yt_dlp: impl Into<String>, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for CommandMedia {
    fn default() -> Self {
        Self::new("yt-dlp", "ffmpeg", "ffprobe")
    }
}

/// Last `max` characters of a tool's stderr.
pub(crate) fn tail(text: &str, max: usize) -> &str {
    let text = text.trim();
    match text.char_indices().rev().nth(max.saturating_sub(1)) {
        Some((idx, _)) if max > 0 => &text[idx..],
        _ => text,
    }
}

async fn run<I, S>(program: &str, args: I) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| IngestError::MediaError(format!("failed to start {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestError::MediaError(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            tail(&stderr, STDERR_TAIL)
        )));
    }

    Ok(output)
}

fn parse_duration(stdout: &str) -> Result<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| IngestError::MediaError(format!("unreadable duration: {:?}", stdout.trim())))
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    title: String,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
}

fn parse_metadata(stdout: &str) -> Result<VideoMetadata> {
    // one JSON object per line, the last one describes the downloaded video
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| IngestError::MediaError("yt-dlp printed no metadata".to_string()))?;

    let info: YtDlpInfo = serde_json::from_str(line)?;
    Ok(VideoMetadata {
        title: info.title,
        duration: info.duration,
        uploader: info.uploader,
        thumbnail: info.thumbnail,
    })
}

#[async_trait::async_trait]
impl MediaToolkit for CommandMedia {
    async fn video_duration(&self, video: &Path) -> Result<f64> {
        let output = run(
            &self.ffprobe,
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-show_entries"),
                OsStr::new("format=duration"),
                OsStr::new("-of"),
                OsStr::new("default=noprint_wrappers=1:nokey=1"),
                video.as_os_str(),
            ],
        )
        .await?;

        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    async fn extract_frame(&self, video: &Path, at_seconds: f64, output: &Path) -> Result<()> {
        let at = format!("{:.3}", at_seconds.max(0.0));
        run(
            &self.ffmpeg,
            [
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                OsStr::new("-ss"),
                OsStr::new(&at),
                OsStr::new("-i"),
                video.as_os_str(),
                OsStr::new("-frames:v"),
                OsStr::new("1"),
                OsStr::new("-q:v"),
                OsStr::new("2"),
                output.as_os_str(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn download(&self, url: &str, output: &Path) -> Result<VideoMetadata> {
        tracing::info!("Downloading {} to {}", url, output.display());

        let result = run(
            &self.yt_dlp,
            [
                OsStr::new("-f"),
                OsStr::new(YT_DLP_FORMAT),
                OsStr::new("--no-playlist"),
                OsStr::new("--max-filesize"),
                OsStr::new(MAX_FILESIZE),
                OsStr::new("--merge-output-format"),
                OsStr::new("mp4"),
                OsStr::new("--dump-json"),
                OsStr::new("--no-simulate"),
                OsStr::new("-o"),
                output.as_os_str(),
                OsStr::new(url),
            ],
        )
        .await?;

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(IngestError::MediaError(format!(
                "yt-dlp finished but {} is missing",
                output.display()
            )));
        }

        parse_metadata(&String::from_utf8_lossy(&result.stdout))
    }

    async fn video_info(&self, url: &str) -> Result<VideoMetadata> {
        let result = run(
            &self.yt_dlp,
            [
                OsStr::new("--no-playlist"),
                OsStr::new("--skip-download"),
                OsStr::new("--dump-json"),
                OsStr::new(url),
            ],
        )
        .await?;

        parse_metadata(&String::from_utf8_lossy(&result.stdout))
    }

    async fn trim(&self, input: &Path, start: f64, duration: f64, output: &Path) -> Result<()> {
        if duration <= 0.0 {
            return Err(IngestError::ValidationError(format!(
                "clip duration must be positive, got {}",
                duration
            )));
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let start = format!("{:.3}", start.max(0.0));
        let duration = format!("{:.3}", duration);
        run(
            &self.ffmpeg,
            [
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                OsStr::new("-ss"),
                OsStr::new(&start),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-t"),
                OsStr::new(&duration),
                OsStr::new("-c:v"),
                OsStr::new("libx264"),
                OsStr::new("-c:a"),
                OsStr::new("aac"),
                output.as_os_str(),
            ],
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n").unwrap(), 12.48);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_parse_metadata_uses_last_object() {
        let stdout = "[info] something\n{\"title\":\"A vs B\",\"duration\":95.0,\"uploader\":\"WTT\"}\n";
        let meta = parse_metadata(stdout).unwrap();
        assert_eq!(meta.title, "A vs B");
        assert_eq!(meta.duration, Some(95.0));
        assert_eq!(meta.uploader.as_deref(), Some("WTT"));
        assert!(meta.thumbnail.is_none());
    }

    #[test]
    fn test_tail_keeps_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 10), "ab");
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let media = CommandMedia::new("yt-dlp", "ffmpeg", "definitely-not-a-real-ffprobe");
        let err = media.video_duration(Path::new("x.mp4")).await.unwrap_err();
        assert!(matches!(err, IngestError::MediaError(_)));
    }
}
