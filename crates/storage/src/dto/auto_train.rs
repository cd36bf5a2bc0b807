use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{ActionLabel, TrainingClip};

fn default_threshold() -> f64 {
    0.7
}

/// Import clips from a match analysis (`point_losses` / `point_wins`).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportAnalysisRequest {
    #[schema(value_type = Object)]
    pub analysis_result: serde_json::Value,

    #[serde(default)]
    pub auto_approve: bool,

    #[serde(default = "default_threshold")]
    #[validate(range(min = 0.0, max = 1.0, message = "confidence_threshold must be between 0 and 1"))]
    pub confidence_threshold: f64,
}

/// Import clips from a single-player analysis (`scoring_clips` / `losing_clips`).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ImportPlayerAnalysisRequest {
    #[schema(value_type = Object)]
    pub analysis_result: serde_json::Value,

    #[validate(length(min = 1, max = 255, message = "player_name is required"))]
    pub player_name: String,

    #[serde(default)]
    pub auto_approve: bool,

    #[serde(default = "default_threshold")]
    #[validate(range(min = 0.0, max = 1.0, message = "confidence_threshold must be between 0 and 1"))]
    pub confidence_threshold: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    pub success: bool,
    pub imported_count: usize,
    pub clips: Vec<TrainingClip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub losing_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_stats: Option<BTreeMap<String, usize>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClipListQuery {
    /// pending, approved, rejected or processed
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClipListResponse {
    pub success: bool,
    pub total: usize,
    pub clips: Vec<TrainingClip>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClipResponse {
    pub success: bool,
    pub clip: TrainingClip,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveClipRequest {
    /// Optional relabel applied with confidence 1.0
    pub label: Option<ActionLabel>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchApproveRequest {
    #[validate(length(min = 1, max = 500, message = "clip_ids must contain 1 to 500 ids"))]
    pub clip_ids: Vec<String>,
    pub label: Option<ActionLabel>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLabelRequest {
    pub label: ActionLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClipOutcome {
    pub clip_id: String,
    /// "success" or "failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skeleton_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClipOutcome {
    pub fn success(clip_id: impl Into<String>) -> Self {
        Self {
            clip_id: clip_id.into(),
            status: "success".to_string(),
            skeleton_path: None,
            message: None,
        }
    }

    pub fn processed(clip_id: impl Into<String>, skeleton_path: Option<String>) -> Self {
        Self {
            skeleton_path,
            ..Self::success(clip_id)
        }
    }

    pub fn failed(clip_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            clip_id: clip_id.into(),
            status: "failed".to_string(),
            skeleton_path: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Aggregate of a batch where each clip can fail on its own. `success` is the
/// number of clips that went through.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub details: Vec<ClipOutcome>,
}

impl BatchSummary {
    pub fn from_outcomes(details: Vec<ClipOutcome>) -> Self {
        let success = details.iter().filter(|d| d.is_success()).count();
        Self {
            total: details.len(),
            success,
            failed: details.len() - success,
            details,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportCounts {
    pub good: usize,
    pub normal: usize,
    pub bad: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ExportCounts {
    pub fn record(&mut self, label: ActionLabel) {
        match label {
            ActionLabel::Good => self.good += 1,
            ActionLabel::Normal => self.normal += 1,
            ActionLabel::Bad => self.bad += 1,
        }
    }

    pub fn exported(&self) -> usize {
        self.good + self.normal + self.bad
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExportResponse {
    pub success: bool,
    pub training_dir: String,
    pub exported: ExportCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClipStatistics {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_label: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: ClipStatistics,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrainingBatchQuery {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainingBatchItem {
    pub clip_id: String,
    pub label: ActionLabel,
    pub skeleton_path: String,
    pub duration: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrainingBatchResponse {
    pub success: bool,
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
    pub clips: Vec<TrainingBatchItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteAllResponse {
    pub success: bool,
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary_counts_successes() {
        let summary = BatchSummary::from_outcomes(vec![
            ClipOutcome::processed("a", Some("skeletons/a/skeleton.json".to_string())),
            ClipOutcome::success("b"),
            ClipOutcome::failed("c", "video unavailable"),
        ]);

        let body = serde_json::to_value(&summary).unwrap();
        assert_eq!(body["total"], 3);
        assert_eq!(body["success"], 2);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["details"][0]["skeleton_path"], "skeletons/a/skeleton.json");
        assert!(body["details"][0].get("message").is_none());
        assert!(body["details"][1].get("skeleton_path").is_none());
        assert_eq!(body["details"][2]["message"], "video unavailable");
    }
}
