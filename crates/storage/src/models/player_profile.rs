use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::normalized_name::PlayerId;

pub const RATING_KEYS: [&str; 5] = ["serve", "receive", "attack", "defense", "tactics"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchHistoryEntry {
    pub match_id: String,
    pub video_id: String,
    pub opponent: String,
    pub date: String,
    pub result: String,
    pub ratings: BTreeMap<String, f64>,
    #[schema(value_type = Vec<Object>)]
    #[serde(default)]
    pub strengths: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    #[serde(default)]
    pub weaknesses: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlayerProfile {
    pub player_id: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub avatar_url: Option<String>,
    pub ittf_id: Option<String>,
    pub aggregate_ratings: BTreeMap<String, f64>,
    pub match_history: Vec<MatchHistoryEntry>,
    pub total_matches: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl PlayerProfile {
    pub fn new(display_name: &str) -> Self {
        let now = Utc::now();
        Self {
            player_id: PlayerId::from_name(display_name).into_inner(),
            display_name: display_name.trim().to_string(),
            aliases: Vec::new(),
            country: None,
            country_code: None,
            avatar_url: None,
            ittf_id: None,
            aggregate_ratings: BTreeMap::new(),
            match_history: Vec::new(),
            total_matches: 0,
            created_at: now,
            last_updated: now,
        }
    }

    /// Inserts or replaces the history entry for `entry.video_id` and
    /// recomputes the aggregate ratings. New entries go to the front.
    pub fn record_match(&mut self, entry: MatchHistoryEntry) {
        let now = Utc::now();

        if let Some(existing) = self
            .match_history
            .iter_mut()
            .find(|m| m.video_id == entry.video_id)
        {
            existing.ratings = entry.ratings;
            existing.strengths = entry.strengths;
            existing.weaknesses = entry.weaknesses;
            existing.result = entry.result;
            existing.updated_at = Some(now);
        } else {
            self.match_history.insert(0, entry);
        }

        self.total_matches = self.match_history.len();
        self.aggregate_ratings = aggregate_ratings(&self.match_history);
        self.last_updated = now;
    }

    /// Remembers another spelling of the player's name. Blank names, the
    /// display name and spellings already known (ignoring case) are skipped.
    pub fn add_alias(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(&self.display_name) {
            return false;
        }
        if self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            return false;
        }
        self.aliases.push(name.to_string());
        true
    }
}

/// Mean of each rating key across the history, rounded to one decimal.
/// Keys never rated are left out.
pub fn aggregate_ratings(history: &[MatchHistoryEntry]) -> BTreeMap<String, f64> {
    let mut aggregate = BTreeMap::new();

    for key in RATING_KEYS {
        let values: Vec<f64> = history
            .iter()
            .filter_map(|m| m.ratings.get(key).copied())
            .filter(|v| v.is_finite())
            .collect();

        if values.is_empty() {
            continue;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        aggregate.insert(key.to_string(), (mean * 10.0).round() / 10.0);
    }

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(video_id: &str, ratings: &[(&str, f64)]) -> MatchHistoryEntry {
        MatchHistoryEntry {
            match_id: format!("m-{}", video_id),
            video_id: video_id.to_string(),
            opponent: "Opponent".to_string(),
            date: "2025-01-01".to_string(),
            result: "unknown".to_string(),
            ratings: ratings.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            strengths: vec![],
            weaknesses: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_aggregate_ratings_mean_and_rounding() {
        let history = vec![
            entry("a", &[("serve", 8.0), ("attack", 9.0)]),
            entry("b", &[("serve", 7.25)]),
        ];
        let agg = aggregate_ratings(&history);
        assert_eq!(agg.get("serve"), Some(&7.6));
        assert_eq!(agg.get("attack"), Some(&9.0));
        assert!(!agg.contains_key("defense"));
    }

    #[test]
    fn test_record_match_upserts_by_video() {
        let mut profile = PlayerProfile::new("Fan Zhendong");
        assert_eq!(profile.player_id, "fan_zhendong");

        profile.record_match(entry("v1", &[("serve", 6.0)]));
        profile.record_match(entry("v2", &[("serve", 8.0)]));
        assert_eq!(profile.total_matches, 2);
        assert_eq!(profile.match_history[0].video_id, "v2");

        profile.record_match(entry("v1", &[("serve", 10.0)]));
        assert_eq!(profile.total_matches, 2);
        assert_eq!(profile.aggregate_ratings.get("serve"), Some(&9.0));
        assert!(profile.match_history[1].updated_at.is_some());
    }

    #[test]
    fn test_add_alias_skips_known_spellings() {
        let mut profile = PlayerProfile::new("Fan Zhendong");
        assert!(profile.add_alias("FAN Zhendong (CHN)"));
        assert!(!profile.add_alias("fan zhendong"));
        assert!(!profile.add_alias("  "));
        assert!(!profile.add_alias("fan zhendong (chn)"));
        assert!(profile.add_alias("Zhendong Fan"));
        assert_eq!(profile.aliases, vec!["FAN Zhendong (CHN)", "Zhendong Fan"]);
    }
}
