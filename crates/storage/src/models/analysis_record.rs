use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One YouTube match analysis. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisRecord {
    pub record_id: String,
    pub video_id: String,
    pub video_title: String,
    pub video_url: String,
    pub video_duration: Option<f64>,
    pub thumbnail_url: String,
    pub player_focus: Option<String>,
    pub player2_focus: Option<String>,
    #[schema(value_type = Object)]
    pub analysis_result: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn thumbnail_for(video_id: &str) -> String {
        format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
    }
}
