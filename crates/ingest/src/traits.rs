use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::dto::training::TrainRequest;
use storage::models::RankingCategory;
use tokio::sync::mpsc;

use crate::Result;
use crate::pose::PoseFrame;
use crate::trainer::TrainerEvent;

/// Metadata reported by the downloader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub thumbnail: Option<String>,
}

/// Video probing, frame grabs, downloads and trimming.
#[async_trait::async_trait]
pub trait MediaToolkit: Send + Sync {
    async fn video_duration(&self, video: &Path) -> Result<f64>;

    /// Writes a single JPEG frame taken at `at_seconds`.
    async fn extract_frame(&self, video: &Path, at_seconds: f64, output: &Path) -> Result<()>;

    async fn download(&self, url: &str, output: &Path) -> Result<VideoMetadata>;

    /// Metadata only, nothing is downloaded.
    async fn video_info(&self, url: &str) -> Result<VideoMetadata>;

    async fn trim(&self, input: &Path, start: f64, duration: f64, output: &Path) -> Result<()>;
}

/// Body landmark extraction for a still image or a video.
#[async_trait::async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, media: &Path) -> Result<Vec<PoseFrame>>;
}

/// Binary attachment sent alongside a prompt.
#[derive(Debug, Clone)]
pub struct InlineData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineData {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }

    pub fn mp4(data: Vec<u8>) -> Self {
        Self {
            mime_type: "video/mp4".to_string(),
            data,
        }
    }
}

/// A multimodal model that answers with a JSON document.
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate_json(&self, prompt: &str, media: &[InlineData]) -> Result<Value>;
}

/// Raw ranking payload for one category.
#[async_trait::async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch(&self, category: RankingCategory) -> Result<Value>;
}

/// Runs one training job to completion, reporting progress on `events`.
#[async_trait::async_trait]
pub trait Trainer: Send + Sync {
    async fn run(&self, config: &TrainRequest, events: mpsc::UnboundedSender<TrainerEvent>) -> Result<()>;
}
