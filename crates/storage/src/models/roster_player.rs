use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayStyle {
    Attacking,
    Defensive,
    FastAttack,
    AllRound,
    Power,
}

impl PlayStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attacking => "attacking",
            Self::Defensive => "defensive",
            Self::FastAttack => "fast_attack",
            Self::AllRound => "all_round",
            Self::Power => "power",
        }
    }
}

impl fmt::Display for PlayStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "men" | "m" | "male" => Some(Self::Men),
            "women" | "w" | "f" | "female" => Some(Self::Women),
            _ => None,
        }
    }
}

/// Static roster entry used by the prediction heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RosterPlayer {
    pub name: String,
    pub country: String,
    pub rank: u32,
    pub rating: u32,
    pub style: PlayStyle,
    pub gender: Gender,
}
