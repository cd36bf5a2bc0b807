//! Pose landmarks and the per-frame measurements derived from them.
//!
//! Landmark indices follow the 33-point body model: 12 right shoulder,
//! 14 right elbow, 16 right wrist, 23/24 left/right hip, 26 right knee,
//! 28 right ankle. Coordinates are normalised to the frame, y grows downward.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{IngestError, Result};
use crate::media::tail;
use crate::traits::PoseEstimator;

const RIGHT_SHOULDER: u32 = 12;
const RIGHT_ELBOW: u32 = 14;
const RIGHT_WRIST: u32 = 16;
const LEFT_HIP: u32 = 23;
const RIGHT_HIP: u32 = 24;
const RIGHT_KNEE: u32 = 26;
const RIGHT_ANKLE: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub index: u32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

/// One frame of estimator output. `landmarks` is `None` when no body was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub frame_number: u32,
    pub landmarks: Option<Vec<Landmark>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePose {
    pub frame_index: usize,
    /// Degrees, direction of the right elbow to wrist vector
    pub racket_angle: f64,
    pub wrist_height: f64,
    pub elbow_height: f64,
    pub shoulder_height: f64,
    pub center_of_mass: Point3,
    pub elbow_angle: Option<f64>,
    pub knee_angle: Option<f64>,
    /// Mean landmark visibility
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSummary {
    pub total_frames: usize,
    pub analyzed_frames: usize,
    pub pose_sequence: Vec<FramePose>,
    pub avg_racket_angle: f64,
    pub racket_angle_variance: f64,
}

impl PoseSummary {
    pub fn has_pose(&self) -> bool {
        !self.pose_sequence.is_empty()
    }
}

fn find(landmarks: &[Landmark], index: u32) -> Option<&Landmark> {
    landmarks.iter().find(|l| l.index == index)
}

/// Angle at `joint` between the segments to `a` and `b`, in degrees.
/// `None` when either segment has no length.
pub fn joint_angle(a: (f64, f64), joint: (f64, f64), b: (f64, f64)) -> Option<f64> {
    let v1 = (a.0 - joint.0, a.1 - joint.1);
    let v2 = (b.0 - joint.0, b.1 - joint.1);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if mag1 < 0.0001 || mag2 < 0.0001 {
        return None;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees())
}

fn xy(l: &Landmark) -> (f64, f64) {
    (l.x, l.y)
}

/// Measurements for one frame. `None` when the right arm or the hips are missing.
pub fn measure_frame(frame_index: usize, landmarks: &[Landmark]) -> Option<FramePose> {
    let shoulder = find(landmarks, RIGHT_SHOULDER)?;
    let elbow = find(landmarks, RIGHT_ELBOW)?;
    let wrist = find(landmarks, RIGHT_WRIST)?;
    let left_hip = find(landmarks, LEFT_HIP)?;
    let right_hip = find(landmarks, RIGHT_HIP)?;

    let racket_angle = (wrist.y - elbow.y).atan2(wrist.x - elbow.x).to_degrees();

    let knee_angle = match (find(landmarks, RIGHT_KNEE), find(landmarks, RIGHT_ANKLE)) {
        (Some(knee), Some(ankle)) => joint_angle(xy(right_hip), xy(knee), xy(ankle)),
        _ => None,
    };

    let confidence = landmarks.iter().map(|l| l.visibility).sum::<f64>() / landmarks.len() as f64;

    Some(FramePose {
        frame_index,
        racket_angle,
        wrist_height: wrist.y,
        elbow_height: elbow.y,
        shoulder_height: shoulder.y,
        center_of_mass: Point3 {
            x: (left_hip.x + right_hip.x) / 2.0,
            y: (left_hip.y + right_hip.y) / 2.0,
            z: (left_hip.z + right_hip.z) / 2.0,
        },
        elbow_angle: joint_angle(xy(shoulder), xy(elbow), xy(wrist)),
        knee_angle,
        confidence,
    })
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Summarises one detection per keyframe, `None` meaning nothing was detected.
pub fn summarize(frames: &[Option<Vec<Landmark>>]) -> PoseSummary {
    let pose_sequence: Vec<FramePose> = frames
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.as_deref().and_then(|lm| measure_frame(i, lm)))
        .collect();

    let angles: Vec<f64> = pose_sequence.iter().map(|p| p.racket_angle).collect();

    PoseSummary {
        total_frames: frames.len(),
        analyzed_frames: pose_sequence.len(),
        avg_racket_angle: mean(&angles),
        racket_angle_variance: variance(&angles),
        pose_sequence,
    }
}

/// Runs an external estimator: `<command> <media>` must print a JSON array of
/// [`PoseFrame`] on stdout.
#[derive(Debug, Clone)]
pub struct CommandPoseEstimator {
    program: String,
    args: Vec<String>,
}

impl CommandPoseEstimator {
    /// `command` is split on whitespace, e.g. `"python skeleton.py"`.
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| IngestError::ValidationError("pose command is empty".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait::async_trait]
impl PoseEstimator for CommandPoseEstimator {
    async fn estimate(&self, media: &Path) -> Result<Vec<PoseFrame>> {
        tracing::debug!("Running pose estimator on {}", media.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(media)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| IngestError::MediaError(format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::MediaError(format!(
                "pose estimator exited with {}: {}",
                output.status,
                tail(&stderr, 500)
            )));
        }

        let frames: Vec<PoseFrame> = serde_json::from_slice(&output.stdout)?;
        Ok(frames)
    }
}
