use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{PlayStyle, RosterPlayer};

#[derive(Debug, Deserialize, IntoParams)]
pub struct RosterQuery {
    /// men or women
    pub gender: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RosterResponse {
    pub success: bool,
    pub total: usize,
    pub players: Vec<RosterPlayer>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MatchupRequest {
    #[validate(length(min = 1, max = 255, message = "player1 is required"))]
    pub player1: String,
    #[validate(length(min = 1, max = 255, message = "player2 is required"))]
    pub player2: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TacticsRequest {
    #[validate(length(min = 1, max = 255, message = "player is required"))]
    pub player: String,
    #[validate(length(min = 1, max = 255, message = "opponent is required"))]
    pub opponent: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HeadToHeadQuery {
    pub player1: String,
    pub player2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingFactor {
    pub player1_rank: u32,
    pub player2_rank: u32,
    pub advantage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RatingFactor {
    pub player1_rating: u32,
    pub player2_rating: u32,
    pub advantage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeadToHeadFactor {
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub advantage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FormFactor {
    /// "W L W" newest first, or "N/A"
    pub player1_form: String,
    pub player2_form: String,
    pub advantage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StyleFactor {
    pub player1_style: PlayStyle,
    pub player2_style: PlayStyle,
    /// Positive favours player1
    pub matchup_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionFactors {
    pub ranking: RankingFactor,
    pub rating: RatingFactor,
    pub head_to_head: HeadToHeadFactor,
    pub recent_form: FormFactor,
    pub style_matchup: StyleFactor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchPrediction {
    pub player1: String,
    pub player2: String,
    pub player1_win_prob: f64,
    pub player2_win_prob: f64,
    /// `None` when both sides are exactly even
    pub predicted_winner: Option<String>,
    pub confidence: f64,
    pub factors: PredictionFactors,
    /// Sets, "4-1" from player1's side
    pub suggested_score: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
}

impl WinLoss {
    pub fn record(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OpponentRankSplit {
    pub vs_top5: WinLoss,
    pub vs_top10: WinLoss,
    pub vs_top20: WinLoss,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlayerStats {
    pub name: String,
    pub total_matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub avg_sets_won: f64,
    pub avg_sets_lost: f64,
    /// "W" / "L", newest first, at most five
    pub recent_form: Vec<String>,
    pub by_round: BTreeMap<String, WinLoss>,
    pub by_opponent_rank: OpponentRankSplit,
}

impl PlayerStats {
    pub fn recent_win_rate(&self) -> f64 {
        if self.recent_form.is_empty() {
            return 0.0;
        }
        self.recent_form.iter().filter(|r| *r == "W").count() as f64 / self.recent_form.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeadToHeadMatch {
    pub date: Option<NaiveDate>,
    pub tournament: String,
    pub score: String,
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeadToHead {
    pub player1: String,
    pub player2: String,
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub matches: Vec<HeadToHeadMatch>,
}

impl HeadToHead {
    pub fn total(&self) -> u32 {
        self.player1_wins + self.player2_wins
    }

    /// player1's share of wins, `None` without any meeting.
    pub fn player1_win_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.player1_wins as f64 / total as f64),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: MatchPrediction,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchPreview {
    pub success: bool,
    pub prediction: MatchPrediction,
    pub player1_stats: PlayerStats,
    pub player2_stats: PlayerStats,
    pub head_to_head: Option<HeadToHead>,
    pub analysis_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlayerStatsResponse {
    pub success: bool,
    pub stats: PlayerStats,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HeadToHeadResponse {
    pub success: bool,
    pub head_to_head: Option<HeadToHead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TacticSuggestion {
    /// serve, receive, rally, counter or mental
    pub category: String,
    pub title: String,
    pub description: String,
    /// 1 to 5, 5 most important
    pub priority: u8,
    pub based_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchTactics {
    pub player: String,
    pub opponent: String,
    pub overall_strategy: String,
    pub key_points: Vec<String>,
    pub suggestions: Vec<TacticSuggestion>,
    pub opponent_weaknesses: Vec<String>,
    pub player_strengths: Vec<String>,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TacticsResponse {
    pub success: bool,
    pub tactics: MatchTactics,
}
