use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::PlayerProfile;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProfileListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProfileSearchQuery {
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    pub player_id: String,
    pub display_name: String,
    pub total_matches: usize,
    pub aggregate_ratings: BTreeMap<String, f64>,
    pub avatar_url: Option<String>,
    pub country_code: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl From<PlayerProfile> for ProfileSummary {
    fn from(profile: PlayerProfile) -> Self {
        Self {
            player_id: profile.player_id,
            display_name: profile.display_name,
            total_matches: profile.total_matches,
            aggregate_ratings: profile.aggregate_ratings,
            avatar_url: profile.avatar_url,
            country_code: profile.country_code,
            last_updated: profile.last_updated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileListResponse {
    pub success: bool,
    pub total: usize,
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: PlayerProfile,
}
