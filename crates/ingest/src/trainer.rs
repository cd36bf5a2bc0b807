//! Runs the external classifier trainer and turns its stdout into progress events.

use std::process::Stdio;

use serde::Deserialize;
use serde_json::Value;
use storage::dto::training::{TrainRequest, TrainingProgress, TrainingStatus};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::error::{IngestError, Result};
use crate::media::tail;
use crate::traits::Trainer;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EpochUpdate {
    pub epoch: u32,
    #[serde(default)]
    pub total_epochs: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub val_accuracy: Option<f64>,
    #[serde(default)]
    pub loss: Option<f64>,
    #[serde(default)]
    pub val_loss: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainerEvent {
    Epoch(EpochUpdate),
    /// Final metrics, reported once
    Result(Value),
    Log(String),
}

impl TrainerEvent {
    /// `{"event":"epoch",..}` and `{"event":"result",..}` lines are events,
    /// anything else is a log line.
    pub fn parse_line(line: &str) -> Self {
        let log = || TrainerEvent::Log(line.to_string());

        let Ok(value) = serde_json::from_str::<Value>(line.trim()) else {
            return log();
        };

        match value.get("event").and_then(Value::as_str) {
            Some("epoch") => serde_json::from_value(value)
                .map(TrainerEvent::Epoch)
                .unwrap_or_else(|_| log()),
            Some("result") => TrainerEvent::Result(value),
            _ => log(),
        }
    }

    pub fn apply(self, progress: &mut TrainingProgress) {
        match self {
            TrainerEvent::Epoch(update) => {
                progress.status = TrainingStatus::Training;
                progress.current_epoch = update.epoch;
                if let Some(total) = update.total_epochs {
                    progress.total_epochs = total;
                }
                progress.accuracy = update.accuracy.or(progress.accuracy);
                progress.val_accuracy = update.val_accuracy.or(progress.val_accuracy);
                progress.loss = update.loss.or(progress.loss);
                progress.val_loss = update.val_loss.or(progress.val_loss);
                progress.message = format!("Epoch {}/{}", progress.current_epoch, progress.total_epochs);
            }
            TrainerEvent::Result(result) => {
                progress.result = Some(result);
            }
            TrainerEvent::Log(line) => progress.push_log(line),
        }
    }
}

/// `<command> <config json>`, e.g. `python train_web.py '{"epochs":50,..}'`
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
}

impl CommandTrainer {
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| IngestError::ValidationError("trainer command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait::async_trait]
impl Trainer for CommandTrainer {
    async fn run(&self, config: &TrainRequest, events: mpsc::UnboundedSender<TrainerEvent>) -> Result<()> {
        let config_json = serde_json::to_string(config)?;
        tracing::info!("Starting trainer: {} {:?} {}", self.program, self.args, config_json);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&config_json)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| IngestError::TrainingError(format!("failed to start {}: {}", self.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| IngestError::TrainingError("trainer stdout unavailable".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| IngestError::TrainingError("trainer stderr unavailable".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            // Receiver gone means the job was dropped; keep draining so the child can exit
            let _ = events.send(TrainerEvent::parse_line(&line));
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(IngestError::TrainingError(format!(
                "trainer exited with {}: {}",
                status,
                tail(&stderr, 500)
            )));
        }

        tracing::info!("Trainer finished");
        Ok(())
    }
}
