//! Failure-clip and full-match analysis built on the media, pose and model seams.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use super::indicators::{basic_report, evaluate};
use super::keyframes::{DEFAULT_KEYFRAMES, extract_keyframes};
use super::match_report::{normalize, normalize_player};
use super::prompts::{PlayerFocus, PromptBuilder};
use crate::error::{IngestError, Result};
use crate::pose::{Landmark, summarize};
use crate::sources::youtube::{extract_video_id, players_from_title};
use crate::traits::{InlineData, MediaToolkit, PoseEstimator, VideoMetadata, VisionModel};

/// Largest video sent inline; longer matches go as keyframes.
pub const MAX_INLINE_VIDEO_BYTES: u64 = 20 * 1024 * 1024;

pub struct FailureAnalyzer {
    media: Arc<dyn MediaToolkit>,
    pose: Arc<dyn PoseEstimator>,
    model: Option<Arc<dyn VisionModel>>,
    keyframes: usize,
}

impl FailureAnalyzer {
    pub fn new(
        media: Arc<dyn MediaToolkit>,
        pose: Arc<dyn PoseEstimator>,
        model: Option<Arc<dyn VisionModel>>,
    ) -> Self {
        Self {
            media,
            pose,
            model,
            keyframes: DEFAULT_KEYFRAMES,
        }
    }

    pub fn with_keyframes(mut self, count: usize) -> Self {
        self.keyframes = count;
        self
    }

    pub fn model_available(&self) -> bool {
        self.model.is_some()
    }

    async fn detect(&self, frame: &Path) -> Option<Vec<Landmark>> {
        match self.pose.estimate(frame).await {
            Ok(frames) => frames.into_iter().find_map(|f| f.landmarks),
            Err(e) => {
                tracing::warn!("Pose estimation failed on {}: {}", frame.display(), e);
                None
            }
        }
    }

    /// Analyses a short clip of a lost point. Keyframes are written to `work_dir`.
    pub async fn analyze(&self, video: &Path, use_ai: bool, work_dir: &Path) -> Result<Value> {
        let (duration, frames) = extract_keyframes(self.media.as_ref(), video, self.keyframes, work_dir).await?;
        if frames.is_empty() {
            return Err(IngestError::MediaError(format!(
                "no frames could be extracted from {}",
                video.display()
            )));
        }

        let mut detections = Vec::with_capacity(frames.len());
        for frame in &frames {
            detections.push(self.detect(&frame.path).await);
        }

        let summary = summarize(&detections);
        let indicators = evaluate(&summary);

        let structured_data = json!({
            "video_info": {
                "duration_seconds": duration,
                "analyzed_frames": frames.len(),
            },
            "pose_analysis": summary,
            "ball_trajectory": {"detected": false},
            "technical_indicators": indicators,
        });

        let ai_analysis = match (use_ai, &self.model) {
            (true, Some(model)) => {
                let mut images = Vec::with_capacity(frames.len());
                for frame in &frames {
                    images.push(InlineData::jpeg(tokio::fs::read(&frame.path).await?));
                }

                let prompt = PromptBuilder::failure_prompt(&structured_data);
                match model.generate_json(&prompt, &images).await {
                    Ok(mut reply) => {
                        if let Some(obj) = reply.as_object_mut() {
                            obj.insert("source".to_string(), json!("gemini"));
                        }
                        reply
                    }
                    Err(e) => {
                        tracing::warn!("AI analysis failed, using basic report: {}", e);
                        let mut report = serde_json::to_value(basic_report(&indicators))?;
                        report["error"] = json!(e.to_string());
                        report
                    }
                }
            }
            _ => serde_json::to_value(basic_report(&indicators))?,
        };

        tracing::info!(
            "Analysed {} ({} of {} frames with a pose)",
            video.display(),
            summary.analyzed_frames,
            summary.total_frames
        );

        Ok(json!({
            "structured_data": structured_data,
            "ai_analysis": ai_analysis,
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }
}

/// Output of a full-match review.
#[derive(Debug, Clone)]
pub struct MatchAnalysis {
    pub video_id: String,
    pub metadata: VideoMetadata,
    /// Players named by the request, else parsed from the title
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub analysis: Value,
}

/// Output of a single-player review.
#[derive(Debug, Clone)]
pub struct PlayerAnalysis {
    pub video_id: String,
    pub metadata: VideoMetadata,
    pub player_name: String,
    pub analysis: Value,
}

pub struct MatchAnalyzer {
    media: Arc<dyn MediaToolkit>,
    model: Arc<dyn VisionModel>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

impl MatchAnalyzer {
    pub fn new(media: Arc<dyn MediaToolkit>, model: Arc<dyn VisionModel>) -> Self {
        Self { media, model }
    }

    async fn attachments(&self, video: &Path, work_dir: &Path) -> Result<Vec<InlineData>> {
        let size = tokio::fs::metadata(video).await?.len();
        if size <= MAX_INLINE_VIDEO_BYTES {
            return Ok(vec![InlineData::mp4(tokio::fs::read(video).await?)]);
        }

        tracing::info!("Video is {} bytes, sending keyframes instead", size);
        let (_, frames) = extract_keyframes(self.media.as_ref(), video, DEFAULT_KEYFRAMES, &work_dir.join("frames")).await?;

        let mut images = Vec::with_capacity(frames.len());
        for frame in frames {
            images.push(InlineData::jpeg(tokio::fs::read(&frame.path).await?));
        }
        Ok(images)
    }

    /// Downloads the video behind `url` into `work_dir`.
    async fn fetch(&self, url: &str, work_dir: &Path) -> Result<(String, PathBuf, VideoMetadata)> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| IngestError::ValidationError("Invalid YouTube URL".to_string()))?;

        tokio::fs::create_dir_all(work_dir).await?;
        let video = work_dir.join(format!("{}.mp4", video_id));
        let metadata = self.media.download(url, &video).await?;

        Ok((video_id, video, metadata))
    }

    /// Downloads a YouTube match into `work_dir` and reviews it.
    pub async fn analyze(&self, url: &str, focus: &PlayerFocus, work_dir: &Path) -> Result<MatchAnalysis> {
        let (video_id, video, metadata) = self.fetch(url, work_dir).await?;

        let (player1, player2) = match (non_blank(&focus.player1), non_blank(&focus.player2)) {
            (None, None) => match players_from_title(&metadata.title) {
                Some((a, b)) => (Some(a), Some(b)),
                None => (None, None),
            },
            named => named,
        };

        let focus = PlayerFocus {
            player1: player1.clone(),
            player2: player2.clone(),
            ..focus.clone()
        };

        let media = self.attachments(&video, work_dir).await?;
        let prompt = PromptBuilder::match_prompt(&focus);
        let reply = self.model.generate_json(&prompt, &media).await?;

        tracing::info!("Match review for {} complete ({})", video_id, self.model.model_name());

        Ok(MatchAnalysis {
            analysis: normalize(reply, &focus, url),
            video_id,
            metadata,
            player1,
            player2,
        })
    }

    /// Reviews the scoring and losing rallies of one player.
    pub async fn analyze_player(
        &self,
        url: &str,
        player: &str,
        description: Option<&str>,
        work_dir: &Path,
    ) -> Result<PlayerAnalysis> {
        let player = player.trim();
        if player.is_empty() {
            return Err(IngestError::ValidationError("player_name is required".to_string()));
        }

        let (video_id, video, metadata) = self.fetch(url, work_dir).await?;

        let media = self.attachments(&video, work_dir).await?;
        let prompt = PromptBuilder::player_prompt(player, description);
        let reply = self.model.generate_json(&prompt, &media).await?;

        let analysis = normalize_player(reply, player, url);
        tracing::info!(
            "Player review of {} in {} complete ({} quality-graded rallies)",
            player,
            video_id,
            analysis["quality_distribution"]["total"]
        );

        Ok(PlayerAnalysis {
            video_id,
            metadata,
            player_name: player.to_string(),
            analysis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::PoseFrame;
    use crate::pose::tests::body;
    use std::sync::Mutex;

    struct FakeMedia;

    #[async_trait::async_trait]
    impl MediaToolkit for FakeMedia {
        async fn video_duration(&self, _video: &Path) -> Result<f64> {
            Ok(2.0)
        }

        async fn extract_frame(&self, _video: &Path, _at: f64, output: &Path) -> Result<()> {
            tokio::fs::write(output, [0xffu8, 0xd8]).await?;
            Ok(())
        }

        async fn download(&self, _url: &str, output: &Path) -> Result<VideoMetadata> {
            tokio::fs::write(output, b"video").await?;
            Ok(VideoMetadata {
                title: "WANG Chuqin vs FAN Zhendong | Final".to_string(),
                duration: Some(600.0),
                ..Default::default()
            })
        }

        async fn video_info(&self, _url: &str) -> Result<VideoMetadata> {
            Ok(VideoMetadata::default())
        }

        async fn trim(&self, _input: &Path, _start: f64, _duration: f64, _output: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct FakePose;

    #[async_trait::async_trait]
    impl PoseEstimator for FakePose {
        async fn estimate(&self, _media: &Path) -> Result<Vec<PoseFrame>> {
            Ok(vec![PoseFrame {
                frame_number: 0,
                landmarks: Some(body(75.0, 0.6)),
            }])
        }
    }

    struct FakeModel {
        reply: Option<Value>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn new(reply: Option<Value>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl VisionModel for FakeModel {
        fn model_name(&self) -> &str {
            "fake"
        }

        async fn generate_json(&self, prompt: &str, _media: &[InlineData]) -> Result<Value> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| IngestError::UpstreamError("model down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_basic_report_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = FailureAnalyzer::new(Arc::new(FakeMedia), Arc::new(FakePose), None);

        let result = analyzer.analyze(Path::new("clip.mp4"), true, dir.path()).await.unwrap();

        assert_eq!(result["structured_data"]["video_info"]["analyzed_frames"], 5);
        assert_eq!(result["structured_data"]["technical_indicators"]["stance"], "too_tilted");
        assert_eq!(result["ai_analysis"]["source"], "basic");
        assert!(result["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_model_failure_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let model = FakeModel::new(None);
        let analyzer = FailureAnalyzer::new(Arc::new(FakeMedia), Arc::new(FakePose), Some(model.clone()))
            .with_keyframes(3);

        let result = analyzer.analyze(Path::new("clip.mp4"), true, dir.path()).await.unwrap();

        assert_eq!(result["ai_analysis"]["source"], "basic");
        assert!(result["ai_analysis"]["error"].as_str().unwrap().contains("model down"));
        assert_eq!(result["structured_data"]["video_info"]["analyzed_frames"], 3);
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_model_reply_used_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let model = FakeModel::new(Some(json!({"failure_reason": "late timing"})));
        let analyzer = FailureAnalyzer::new(Arc::new(FakeMedia), Arc::new(FakePose), Some(model.clone()));

        let result = analyzer.analyze(Path::new("clip.mp4"), true, dir.path()).await.unwrap();
        assert_eq!(result["ai_analysis"]["source"], "gemini");
        assert_eq!(result["ai_analysis"]["failure_reason"], "late timing");

        let skipped = analyzer.analyze(Path::new("clip.mp4"), false, dir.path()).await.unwrap();
        assert_eq!(skipped["ai_analysis"]["source"], "basic");
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_players_from_title() {
        let dir = tempfile::tempdir().unwrap();
        let model = FakeModel::new(Some(json!({
            "points": [{"winner": "WANG Chuqin", "win_reason": "loop"}]
        })));
        let analyzer = MatchAnalyzer::new(Arc::new(FakeMedia), model.clone());

        let result = analyzer
            .analyze("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &PlayerFocus::default(), dir.path())
            .await
            .unwrap();

        assert_eq!(result.video_id, "dQw4w9WgXcQ");
        assert_eq!(result.player1.as_deref(), Some("WANG Chuqin"));
        assert_eq!(result.player2.as_deref(), Some("FAN Zhendong"));
        assert_eq!(result.analysis["point_wins"].as_array().unwrap().len(), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("**WANG Chuqin**"));
    }

    #[tokio::test]
    async fn test_match_rejects_non_youtube_url() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = MatchAnalyzer::new(Arc::new(FakeMedia), FakeModel::new(Some(json!({}))));

        let err = analyzer
            .analyze("https://example.org/match.mp4", &PlayerFocus::default(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_player_review() {
        let dir = tempfile::tempdir().unwrap();
        let model = FakeModel::new(Some(json!({
            "scoring_clips": [{"start_seconds": 20.0, "technique": "loop", "quality_label": "good"}],
            "losing_clips": [{"start_seconds": 5.0, "technique": "push", "quality_label": "bad"}]
        })));
        let analyzer = MatchAnalyzer::new(Arc::new(FakeMedia), model.clone());

        let result = analyzer
            .analyze_player("https://youtu.be/dQw4w9WgXcQ", " FAN Zhendong ", Some("red shirt"), dir.path())
            .await
            .unwrap();

        assert_eq!(result.video_id, "dQw4w9WgXcQ");
        assert_eq!(result.player_name, "FAN Zhendong");
        assert_eq!(result.metadata.duration, Some(600.0));
        assert_eq!(result.analysis["scoring_clips"].as_array().unwrap().len(), 1);
        assert_eq!(result.analysis["quality_distribution"]["bad"], 1);
        assert!(model.prompts.lock().unwrap()[0].contains("**FAN Zhendong** (red shirt)"));

        let err = analyzer
            .analyze_player("https://youtu.be/dQw4w9WgXcQ", "  ", None, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::ValidationError(_)));
    }
}
