use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use storage::Database;
use storage::dto::auto_train::{BatchSummary, ClipOutcome};
use storage::error::StorageError;
use storage::models::{ClipStatus, SourceType, TrainingClip};
use storage::repository::clip::ClipRepository;

use super::ClipLayout;
use crate::error::{IngestError, Result};
use crate::traits::{MediaToolkit, PoseEstimator};

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Cuts approved clips out of their source videos and extracts skeletons.
pub struct ClipProcessor {
    media: Arc<dyn MediaToolkit>,
    pose: Arc<dyn PoseEstimator>,
    layout: ClipLayout,
}

impl ClipProcessor {
    pub fn new(media: Arc<dyn MediaToolkit>, pose: Arc<dyn PoseEstimator>, layout: ClipLayout) -> Self {
        Self { media, pose, layout }
    }

    pub fn layout(&self) -> &ClipLayout {
        &self.layout
    }

    /// The clip's own video, cut once and reused afterwards. The cut lands in a
    /// partial file first so an interrupted run never leaves a reusable video.
    async fn clip_video(&self, clip: &TrainingClip) -> Result<PathBuf> {
        let output = self.layout.video_path(&clip.clip_id);
        if tokio::fs::try_exists(&output).await? {
            tracing::debug!("Reusing clip video {}", output.display());
            return Ok(output);
        }

        let partial = self.layout.partial_video_path(&clip.clip_id);
        if let Err(e) = self.cut(clip, &partial).await {
            remove_if_present(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, &output).await?;
        Ok(output)
    }

    async fn cut(&self, clip: &TrainingClip, target: &Path) -> Result<()> {
        match clip.source_type {
            SourceType::Youtube => {
                let download = self.layout.download_path(&clip.clip_id);
                remove_if_present(&download).await;

                let result = match self.media.download(&clip.source_video, &download).await {
                    Ok(_) => {
                        self.media
                            .trim(&download, clip.start_time, clip.duration(), target)
                            .await
                    }
                    Err(e) => Err(e),
                };
                remove_if_present(&download).await;
                result
            }
            SourceType::Local => {
                let source = PathBuf::from(&clip.source_video);
                if !tokio::fs::try_exists(&source).await? {
                    return Err(IngestError::MediaError(format!(
                        "source video not found: {}",
                        clip.source_video
                    )));
                }
                self.media
                    .trim(&source, clip.start_time, clip.duration(), target)
                    .await
            }
        }
    }

    /// Processes one approved clip and marks it `processed`.
    pub async fn process(&self, db: &Database, clip_id: &str) -> Result<TrainingClip> {
        let repo = ClipRepository::new(db.pool());
        let clip = repo.find(clip_id).await?;

        if clip.status != ClipStatus::Approved {
            return Err(StorageError::InvalidTransition {
                from: clip.status,
                to: ClipStatus::Processed,
            }
            .into());
        }

        let video = self.clip_video(&clip).await?;
        let frames = self.pose.estimate(&video).await?;
        let detected = frames.iter().filter(|f| f.landmarks.is_some()).count();

        let skeleton_path = self.layout.skeleton_path(&clip.clip_id);
        if let Some(parent) = skeleton_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let skeleton = json!({
            "clip_id": clip.clip_id,
            "label": clip.label,
            "source_video": clip.source_video,
            "start_time": clip.start_time,
            "end_time": clip.end_time,
            "total_frames": frames.len(),
            "detected_frames": detected,
            "frames": frames,
        });
        tokio::fs::write(&skeleton_path, serde_json::to_vec(&skeleton)?).await?;

        let processed = repo
            .mark_processed(clip_id, &skeleton_path.to_string_lossy(), Utc::now())
            .await?;

        tracing::info!(
            "Processed clip {} ({} frames, {} with a pose)",
            clip_id,
            frames.len(),
            detected
        );
        Ok(processed)
    }

    /// Processes every approved clip. Failures are reported per clip.
    pub async fn process_all(&self, db: &Database) -> Result<BatchSummary> {
        let approved = ClipRepository::new(db.pool())
            .list(Some(ClipStatus::Approved))
            .await?;

        tracing::info!("Processing {} approved clips", approved.len());

        let mut outcomes = Vec::with_capacity(approved.len());
        for clip in approved {
            let outcome = match self.process(db, &clip.clip_id).await {
                Ok(done) => ClipOutcome::processed(&clip.clip_id, done.skeleton_path),
                Err(e) => {
                    tracing::warn!("Failed to process clip {}: {}", clip.clip_id, e);
                    ClipOutcome::failed(&clip.clip_id, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        Ok(BatchSummary::from_outcomes(outcomes))
    }
}
