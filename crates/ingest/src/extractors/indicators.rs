//! Rule-based technical indicators and the report used when no model is available.

use serde::{Deserialize, Serialize};

use crate::pose::{PoseSummary, variance};

const TILTED_ANGLE: f64 = 60.0;
const FLAT_ANGLE: f64 = 20.0;
const UNSTABLE_ANGLE_VARIANCE: f64 = 500.0;
const MODERATE_ANGLE_VARIANCE: f64 = 200.0;
const UNSTABLE_COM_VARIANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Normal,
    TooTilted,
    TooFlat,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RacketControl {
    Stable,
    Moderate,
    Unstable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Balance {
    Stable,
    Unstable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub stance: Stance,
    pub racket_control: RacketControl,
    pub body_balance: Balance,
}

pub fn evaluate(summary: &PoseSummary) -> TechnicalIndicators {
    if !summary.has_pose() {
        return TechnicalIndicators {
            stance: Stance::Unknown,
            racket_control: RacketControl::Unknown,
            body_balance: Balance::Unknown,
        };
    }

    let angle = summary.avg_racket_angle.abs();
    let stance = if angle > TILTED_ANGLE {
        Stance::TooTilted
    } else if angle < FLAT_ANGLE {
        Stance::TooFlat
    } else {
        Stance::Normal
    };

    let racket_control = if summary.racket_angle_variance > UNSTABLE_ANGLE_VARIANCE {
        RacketControl::Unstable
    } else if summary.racket_angle_variance > MODERATE_ANGLE_VARIANCE {
        RacketControl::Moderate
    } else {
        RacketControl::Stable
    };

    let com_y: Vec<f64> = summary.pose_sequence.iter().map(|p| p.center_of_mass.y).collect();
    let body_balance = if variance(&com_y) > UNSTABLE_COM_VARIANCE {
        Balance::Unstable
    } else {
        Balance::Stable
    };

    TechnicalIndicators {
        stance,
        racket_control,
        body_balance,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicReport {
    pub source: String,
    pub failure_reason: String,
    pub category: String,
    pub improvement_suggestions: Vec<String>,
    pub summary: String,
    pub severity: String,
}

pub fn basic_report(indicators: &TechnicalIndicators) -> BasicReport {
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    match indicators.stance {
        Stance::TooTilted => {
            issues.push("Racket face too tilted");
            suggestions.push("Adjust the racket angle and keep a moderate tilt");
        }
        Stance::TooFlat => {
            issues.push("Racket face too flat");
            suggestions.push("Close the racket face slightly to control the ball height");
        }
        Stance::Normal | Stance::Unknown => {}
    }

    if indicators.racket_control == RacketControl::Unstable {
        issues.push("Unstable racket control");
        suggestions.push("Strengthen wrist stability and keep a consistent stroke");
    }

    if indicators.body_balance == Balance::Unstable {
        issues.push("Unstable centre of gravity");
        suggestions.push("Keep the lower body stable and stay low through the stroke");
    }

    let severity = if issues.len() > 1 { "moderate" } else { "minor" };

    if issues.is_empty() {
        issues.push("No obvious technical problem");
        suggestions.push("Keep up the good technique");
    }

    BasicReport {
        source: "basic".to_string(),
        failure_reason: issues.join(", "),
        category: "technique".to_string(),
        improvement_suggestions: suggestions.into_iter().map(String::from).collect(),
        summary: format!("Main issue: {}", issues[0]),
        severity: severity.to_string(),
    }
}
