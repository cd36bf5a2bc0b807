use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MatchSide {
    Player1,
    Player2,
}

/// A completed professional match, used for head-to-head and form stats.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchRecord {
    pub match_id: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub tournament: String,
    #[serde(default)]
    pub round: String,
    pub player1_name: String,
    pub player1_rank: Option<i64>,
    pub player2_name: String,
    pub player2_rank: Option<i64>,
    pub winner: MatchSide,
    /// Sets won, "4-2" from player1's side.
    pub score: String,
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default = "default_gender")]
    pub gender: String,
}

fn default_gender() -> String {
    "men".to_string()
}

impl MatchRecord {
    pub fn involves(&self, player: &str) -> bool {
        self.player1_name.eq_ignore_ascii_case(player) || self.player2_name.eq_ignore_ascii_case(player)
    }

    pub fn winner_name(&self) -> &str {
        match self.winner {
            MatchSide::Player1 => &self.player1_name,
            MatchSide::Player2 => &self.player2_name,
        }
    }

    pub fn won_by(&self, player: &str) -> bool {
        self.winner_name().eq_ignore_ascii_case(player)
    }

    /// Sets won and lost from `player`'s side, parsed from `score`.
    pub fn sets_for(&self, player: &str) -> Option<(u32, u32)> {
        let (left, right) = self.score.split_once('-')?;
        let left: u32 = left.trim().parse().ok()?;
        let right: u32 = right.trim().parse().ok()?;

        if self.player1_name.eq_ignore_ascii_case(player) {
            Some((left, right))
        } else if self.player2_name.eq_ignore_ascii_case(player) {
            Some((right, left))
        } else {
            None
        }
    }

    /// The opponent's world rank at match time, as seen from `player`.
    pub fn opponent_rank(&self, player: &str) -> Option<i64> {
        if self.player1_name.eq_ignore_ascii_case(player) {
            self.player2_rank
        } else {
            self.player1_rank
        }
    }
}
