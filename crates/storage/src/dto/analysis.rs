use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::AnalysisRecord;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub duration: Option<f64>,
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureAnalysisResponse {
    pub success: bool,
    pub filename: String,
    #[schema(value_type = Object)]
    pub analysis: serde_json::Value,
}

/// Result for one file of a batch upload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureBatchItem {
    pub filename: String,
    pub success: bool,
    #[schema(value_type = Option<Object>)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FailureBatchItem {
    pub fn analyzed(filename: String, analysis: serde_json::Value) -> Self {
        Self {
            filename,
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(filename: String, error: impl Into<String>) -> Self {
        Self {
            filename,
            success: false,
            analysis: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureBatchResponse {
    pub success: bool,
    pub total: usize,
    pub analyzed: usize,
    pub results: Vec<FailureBatchItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzerConfigResponse {
    pub success: bool,
    pub gemini_available: bool,
    pub gemini_model: String,
    pub supported_formats: Vec<String>,
    pub max_duration_seconds: u32,
    pub recommended_duration_seconds: u32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ValidateUrlRequest {
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateUrlResponse {
    pub success: bool,
    pub valid: bool,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct YoutubeAnalyzeRequest {
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[validate(length(max = 255))]
    pub player_focus: Option<String>,
    #[validate(length(max = 255))]
    pub player2_focus: Option<String>,
    #[validate(length(max = 1000))]
    pub description1: Option<String>,
    #[validate(length(max = 1000))]
    pub description2: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoInfoResponse {
    pub success: bool,
    pub video_info: VideoInfo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisLimits {
    pub max_duration_minutes: u32,
    pub supported_hosts: Vec<String>,
    pub requires_yt_dlp: bool,
}

/// What the YouTube analysis endpoints can do on this server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisInfoResponse {
    pub success: bool,
    pub enabled: bool,
    pub description: String,
    pub supported_features: Vec<String>,
    pub limitations: AnalysisLimits,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlayerAnalyzeRequest {
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[validate(length(min = 1, max = 255, message = "player_name is required"))]
    pub player_name: String,
    /// How to tell the player apart, e.g. shirt colour
    #[validate(length(max = 1000))]
    pub player_description: Option<String>,
}

/// `analysis` carries `scoring_clips` / `losing_clips` in the layout
/// `/api/auto-train/import-player` accepts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerAnalyzeResponse {
    pub success: bool,
    pub record_id: String,
    pub player_name: String,
    pub video_info: VideoInfo,
    #[schema(value_type = Object)]
    pub analysis: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct YoutubeAnalyzeResponse {
    pub success: bool,
    pub record_id: String,
    pub video_info: VideoInfo,
    #[schema(value_type = Object)]
    pub analysis: serde_json::Value,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
    /// Matches title or either player focus
    pub search: Option<String>,
    pub player: Option<String>,
}

fn default_history_limit() -> u32 {
    50
}

/// History list entry without the analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisSummary {
    pub record_id: String,
    pub video_id: String,
    pub video_title: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub player_focus: Option<String>,
    pub player2_focus: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AnalysisRecord> for AnalysisSummary {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            record_id: record.record_id,
            video_id: record.video_id,
            video_title: record.video_title,
            video_url: record.video_url,
            thumbnail_url: record.thumbnail_url,
            player_focus: record.player_focus,
            player2_focus: record.player2_focus,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryListResponse {
    pub success: bool,
    pub total: usize,
    pub records: Vec<AnalysisSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryRecordResponse {
    pub success: bool,
    pub record: AnalysisRecord,
}
