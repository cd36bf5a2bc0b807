use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_augmentation() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TrainRequest {
    #[validate(length(min = 1, max = 64, message = "model_type is required"))]
    pub model_type: String,

    #[validate(range(min = 1, max = 1000, message = "epochs must be between 1 and 1000"))]
    pub epochs: u32,

    #[validate(range(min = 1, max = 1024, message = "batch_size must be between 1 and 1024"))]
    pub batch_size: u32,

    #[validate(range(
        exclusive_min = 0.0,
        max = 1.0,
        message = "learning_rate must be in (0, 1]"
    ))]
    pub learning_rate: f64,

    #[serde(default = "default_augmentation")]
    #[validate(range(min = 1, max = 20, message = "data_augmentation must be between 1 and 20"))]
    pub data_augmentation: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrainResponse {
    pub success: bool,
    pub task_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Initializing,
    Training,
    Completed,
    Failed,
    Cancelled,
}

impl TrainingStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Latest known state of a training job.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainingProgress {
    pub task_id: Uuid,
    pub status: TrainingStatus,
    pub message: String,
    pub current_epoch: u32,
    pub total_epochs: u32,
    pub accuracy: Option<f64>,
    pub val_accuracy: Option<f64>,
    pub loss: Option<f64>,
    pub val_loss: Option<f64>,
    pub logs: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
}

impl TrainingProgress {
    pub const LOG_TAIL: usize = 10;

    pub fn new(task_id: Uuid, total_epochs: u32) -> Self {
        Self {
            task_id,
            status: TrainingStatus::Initializing,
            message: "Initializing training".to_string(),
            current_epoch: 0,
            total_epochs,
            accuracy: None,
            val_accuracy: None,
            loss: None,
            val_loss: None,
            logs: Vec::new(),
            result: None,
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// Status view: last log lines only, `result` only once completed.
    pub fn snapshot(&self) -> Self {
        let start = self.logs.len().saturating_sub(Self::LOG_TAIL);
        Self {
            logs: self.logs[start..].to_vec(),
            result: if self.status == TrainingStatus::Completed {
                self.result.clone()
            } else {
                None
            },
            ..self.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrainingStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub progress: TrainingProgress,
}
