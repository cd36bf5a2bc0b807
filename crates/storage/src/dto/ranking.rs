use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common::PaginationParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingPlayer {
    pub rank: i64,
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub points: i64,
    pub previous_rank: Option<i64>,
    /// Positive when the player moved up
    pub rank_change: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryRanking {
    pub success: bool,
    pub category: String,
    pub updated_at: DateTime<Utc>,
    pub total_records: usize,
    pub players: Vec<RankingPlayer>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllRankingsResponse {
    pub success: bool,
    pub categories: BTreeMap<String, CategoryRanking>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RankingUpdateResponse {
    pub success: bool,
    pub message: String,
    /// Category to "success" or "failed"
    pub results: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorldRank {
    pub rank: i64,
    pub points: i64,
}

/// A player merged across every cached ranking category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorldPlayer {
    pub ittf_id: String,
    pub name: String,
    pub country: String,
    pub country_code: String,
    pub photo_url: Option<String>,
    /// Category name to the player's position there
    pub rankings: BTreeMap<String, WorldRank>,
}

impl WorldPlayer {
    /// Singles rank, used for ordering lists. Doubles-only players sort last.
    pub fn singles_rank(&self) -> i64 {
        ["SEN_SINGLES", "WOM_SINGLES"]
            .iter()
            .filter_map(|c| self.rankings.get(*c))
            .map(|r| r.rank)
            .min()
            .unwrap_or(i64::MAX)
    }
}

/// Query for the world-ranking player list. Page fields sit inline because
/// `serde(flatten)` loses number parsing in query strings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WorldPlayerFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl WorldPlayerFilter {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.pagination().validate()?;

        if let Some(ref search) = self.search
            && search.len() > 100
        {
            return Err("search must be at most 100 characters".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorldPlayerResponse {
    pub success: bool,
    pub player: WorldPlayer,
}
