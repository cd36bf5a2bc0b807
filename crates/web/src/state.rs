use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use ingest::extractors::{FailureAnalyzer, GeminiClient, MatchAnalyzer};
use ingest::media::CommandMedia;
use ingest::pipeline::{ClipLayout, ClipProcessor};
use ingest::pose::CommandPoseEstimator;
use ingest::sources::WttClient;
use ingest::trainer::CommandTrainer;
use ingest::{MediaToolkit, PoseEstimator, RankingSource, Trainer, VisionModel};
use storage::Database;

use crate::config::Config;
use crate::jobs::TrainingJobs;

/// External collaborators behind the HTTP handlers.
pub struct Collaborators {
    pub media: Arc<dyn MediaToolkit>,
    pub pose: Arc<dyn PoseEstimator>,
    pub model: Option<Arc<dyn VisionModel>>,
    pub rankings: Arc<dyn RankingSource>,
    pub trainer: Arc<dyn Trainer>,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model: Option<Arc<dyn VisionModel>> = match &config.gemini_api_key {
            Some(key) => Some(Arc::new(
                GeminiClient::new(key.clone(), config.gemini_model.clone())
                    .context("Failed to build Gemini client")?,
            )),
            None => {
                tracing::warn!("GEMINI_API_KEY not set, AI analysis disabled");
                None
            }
        };

        Ok(Self {
            media: Arc::new(CommandMedia::new(
                config.yt_dlp_bin.clone(),
                config.ffmpeg_bin.clone(),
                config.ffprobe_bin.clone(),
            )),
            pose: Arc::new(CommandPoseEstimator::new(&config.pose_command).context("Invalid POSE_COMMAND")?),
            model,
            rankings: Arc::new(WttClient::new().context("Failed to build WTT client")?),
            trainer: Arc::new(CommandTrainer::new(&config.trainer_command).context("Invalid TRAINER_COMMAND")?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub training_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub gemini_model: String,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            training_dir: config.training_dir.clone(),
            upload_dir: config.upload_dir(),
            gemini_model: config.gemini_model.clone(),
        }
    }

    /// Scratch space for one request
    pub fn work_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join("tmp").join(name)
    }
}

#[derive(Clone)]
pub struct Analyzers {
    pub failure: Arc<FailureAnalyzer>,
    /// `None` without a vision model
    pub matches: Option<Arc<MatchAnalyzer>>,
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: Database,
    pub media: Arc<dyn MediaToolkit>,
    pub rankings: Arc<dyn RankingSource>,
    pub analyzers: Analyzers,
    pub clips: Arc<ClipProcessor>,
    pub jobs: TrainingJobs,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, collaborators: Collaborators, settings: Settings) -> Self {
        let Collaborators {
            media,
            pose,
            model,
            rankings,
            trainer,
        } = collaborators;

        let analyzers = Analyzers {
            failure: Arc::new(FailureAnalyzer::new(media.clone(), pose.clone(), model.clone())),
            matches: model.map(|m| Arc::new(MatchAnalyzer::new(media.clone(), m))),
        };

        let clips = ClipProcessor::new(media.clone(), pose, ClipLayout::new(&settings.data_dir));

        Self {
            db,
            media,
            rankings,
            analyzers,
            clips: Arc::new(clips),
            jobs: TrainingJobs::new(trainer),
            settings: Arc::new(settings),
        }
    }
}
