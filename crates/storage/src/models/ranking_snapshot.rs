use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum RankingCategory {
    #[serde(rename = "SEN_SINGLES")]
    SenSingles,
    #[serde(rename = "SEN_DOUBLES")]
    SenDoubles,
    #[serde(rename = "WOM_SINGLES")]
    WomSingles,
    #[serde(rename = "WOM_DOUBLES")]
    WomDoubles,
    #[serde(rename = "MIX_DOUBLES")]
    MixDoubles,
}

impl RankingCategory {
    pub const ALL: [RankingCategory; 5] = [
        RankingCategory::SenSingles,
        RankingCategory::SenDoubles,
        RankingCategory::WomSingles,
        RankingCategory::WomDoubles,
        RankingCategory::MixDoubles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SenSingles => "SEN_SINGLES",
            Self::SenDoubles => "SEN_DOUBLES",
            Self::WomSingles => "WOM_SINGLES",
            Self::WomDoubles => "WOM_DOUBLES",
            Self::MixDoubles => "MIX_DOUBLES",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// WTT `SubEventCode` rows that belong to this category.
    pub fn sub_event_code(&self) -> &'static str {
        match self {
            Self::SenSingles => "MDI",
            Self::SenDoubles => "MD",
            Self::WomSingles => "WSI",
            Self::WomDoubles => "WD",
            Self::MixDoubles => "XD",
        }
    }

    pub fn is_doubles(&self) -> bool {
        matches!(self, Self::SenDoubles | Self::WomDoubles | Self::MixDoubles)
    }

    pub fn gender(&self) -> Option<&'static str> {
        match self {
            Self::SenSingles | Self::SenDoubles => Some("men"),
            Self::WomSingles | Self::WomDoubles => Some("women"),
            Self::MixDoubles => None,
        }
    }
}

impl fmt::Display for RankingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw WTT payload for one category as last fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub category: RankingCategory,
    pub payload: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}
