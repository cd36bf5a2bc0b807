use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SourceType {
    Youtube,
    Local,
}

/// Quality class used by the action classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ActionLabel {
    Good,
    Normal,
    Bad,
}

impl ActionLabel {
    pub const ALL: [ActionLabel; 3] = [ActionLabel::Good, ActionLabel::Normal, ActionLabel::Bad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Normal => "normal",
            Self::Bad => "bad",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "good" => Some(Self::Good),
            "normal" => Some(Self::Normal),
            "bad" => Some(Self::Bad),
            _ => None,
        }
    }

    /// Folder name the trainer reads samples from.
    pub fn training_folder(&self) -> String {
        format!("{}_input_movid", self.as_str())
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ClipStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

impl ClipStatus {
    pub const ALL: [ClipStatus; 4] = [
        ClipStatus::Pending,
        ClipStatus::Approved,
        ClipStatus::Rejected,
        ClipStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }

    /// Transitions only move forward. Staying in the same status is allowed
    /// so repeated approve/reject calls are no-ops.
    pub fn can_transition_to(self, next: ClipStatus) -> bool {
        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Processed)
        )
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TrainingClip {
    pub clip_id: String,
    pub source_video: String,
    pub source_type: SourceType,
    pub start_time: f64,
    pub end_time: f64,
    pub label: ActionLabel,
    pub label_confidence: f64,
    pub description: String,
    pub error_type: Option<String>,
    pub status: ClipStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub skeleton_path: Option<String>,
}

impl TrainingClip {
    /// Builds a pending clip with a fresh 8-character id.
    pub fn new(
        source_video: impl Into<String>,
        source_type: SourceType,
        start_time: f64,
        end_time: f64,
        label: ActionLabel,
        label_confidence: f64,
    ) -> Self {
        Self {
            clip_id: new_short_id(),
            source_video: source_video.into(),
            source_type,
            start_time,
            end_time,
            label,
            label_confidence,
            description: String::new(),
            error_type: None,
            status: ClipStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
            skeleton_path: None,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }
}

/// First 8 hex characters of a v4 UUID.
pub fn new_short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
