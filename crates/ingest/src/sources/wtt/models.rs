//! Field access for the WTT ranking feed. Numbers arrive as JSON numbers or
//! numeric strings depending on the file.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde_json::Value;
use storage::dto::ranking::{RankingPlayer, WorldPlayer, WorldRank};
use storage::models::{RankingCategory, RankingSnapshot, match_name};

/// Sort key for rows without a current rank
const UNRANKED: i64 = 999_999;

fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Rows of a payload, accepting both the bare feed and the `{data: {...}}` wrapper.
pub fn result_rows(payload: &Value) -> &[Value] {
    payload
        .get("Result")
        .or_else(|| payload.get("data").and_then(|d| d.get("Result")))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn current_rank(row: &Value) -> i64 {
    as_i64(row.get("CurrentRank")).unwrap_or(UNRANKED)
}

fn points(row: &Value) -> i64 {
    as_i64(row.get("RankingPointsYTD"))
        .or_else(|| as_i64(row.get("Points")))
        .unwrap_or(0)
}

/// Display name for a row. Doubles rows carry both partners.
fn row_name(row: &Value) -> String {
    if let Some(name) = as_string(row.get("PlayerName")) {
        return name;
    }

    ["PlayerName1", "PlayerName1d"]
        .iter()
        .filter_map(|key| as_string(row.get(*key)))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Singles field, falling back to the first partner of a pair.
fn first_of(row: &Value, key: &str) -> String {
    as_string(row.get(key))
        .or_else(|| as_string(row.get(format!("{}1", key).as_str())))
        .unwrap_or_default()
}

fn ranking_player(row: &Value) -> RankingPlayer {
    let rank = current_rank(row);
    let previous_rank = as_i64(row.get("PreviousRank"));

    RankingPlayer {
        rank,
        name: row_name(row),
        country: first_of(row, "CountryName"),
        country_code: first_of(row, "CountryCode"),
        points: points(row),
        previous_rank,
        rank_change: previous_rank.map_or(0, |prev| prev - rank),
    }
}

/// Rows for `category`, filtered by sub-event code and sorted by current rank.
pub fn category_players(category: RankingCategory, payload: &Value) -> Vec<RankingPlayer> {
    let code = category.sub_event_code();

    let mut rows: Vec<&Value> = result_rows(payload)
        .iter()
        .filter(|row| row.get("SubEventCode").and_then(Value::as_str) == Some(code))
        .collect();

    rows.sort_by_key(|row| current_rank(row));
    rows.into_iter().map(ranking_player).collect()
}

fn category_for_code(code: &str) -> Option<RankingCategory> {
    RankingCategory::ALL.into_iter().find(|c| c.sub_event_code() == code)
}

fn merge_player(
    players: &mut BTreeMap<String, WorldPlayer>,
    row: &Value,
    suffix: &str,
    category: RankingCategory,
) {
    let Some(ittf_id) = as_string(row.get(format!("IttfId{}", suffix).as_str())) else {
        return;
    };

    let rank = WorldRank {
        rank: current_rank(row),
        points: points(row),
    };

    let field = |key: &str| as_string(row.get(format!("{}{}", key, suffix).as_str())).unwrap_or_default();

    players
        .entry(ittf_id.clone())
        .or_insert_with(|| WorldPlayer {
            ittf_id,
            name: field("PlayerName"),
            country: field("CountryName"),
            country_code: field("CountryCode"),
            photo_url: as_string(row.get("PhotoUrl")),
            rankings: BTreeMap::new(),
        })
        .rankings
        .insert(category.as_str().to_string(), rank);
}

/// Every player across the cached categories, keyed by ITTF id and sorted by
/// singles rank. Doubles rows contribute both partners.
pub fn world_players(snapshots: &[RankingSnapshot]) -> Vec<WorldPlayer> {
    let mut players = BTreeMap::new();

    for snapshot in snapshots {
        for row in result_rows(&snapshot.payload) {
            let category = row
                .get("SubEventCode")
                .and_then(Value::as_str)
                .and_then(category_for_code)
                .unwrap_or(snapshot.category);

            if row.get("PairId").is_some() {
                merge_player(&mut players, row, "1", category);
                merge_player(&mut players, row, "1d", category);
            } else {
                merge_player(&mut players, row, "", category);
            }
        }
    }

    let mut players: Vec<WorldPlayer> = players.into_values().collect();
    players.sort_by_key(|p| p.singles_rank());
    players
}

/// Case-insensitive match on name, country or ITTF id.
pub fn search_players(players: Vec<WorldPlayer>, query: &str) -> Vec<WorldPlayer> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return players;
    }

    players
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query)
                || p.country.to_lowercase().contains(&query)
                || p.ittf_id.contains(&query)
        })
        .collect()
}

/// The listed player whose name best matches `name`. Ties go to the
/// better ranked player, so `players` is expected in ranking order.
pub fn best_name_match<'p>(players: &'p [WorldPlayer], name: &str) -> Option<&'p WorldPlayer> {
    players
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match_name(name, &p.name).map(|m| ((Reverse(m), i), p)))
        .min_by_key(|(key, _)| *key)
        .map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn singles_payload() -> Value {
        json!({"Result": [
            {"SubEventCode": "MDI", "CurrentRank": "2", "PreviousRank": "1", "PlayerName": "FAN Zhendong",
             "CountryName": "China", "CountryCode": "CHN", "RankingPointsYTD": "8000", "IttfId": "101929",
             "PhotoUrl": "https://example.org/fan.png"},
            {"SubEventCode": "MDI", "CurrentRank": 1, "PreviousRank": 3, "PlayerName": "WANG Chuqin",
             "CountryName": "China", "CountryCode": "CHN", "RankingPointsYTD": 9000, "IttfId": 121558},
            {"SubEventCode": "MD", "CurrentRank": 1, "PlayerName": "ignored"},
            {"SubEventCode": "MDI", "PlayerName": "Unranked", "IttfId": "1"}
        ]})
    }

    fn doubles_payload() -> Value {
        json!({"data": {"Result": [
            {"SubEventCode": "MD", "CurrentRank": 1, "PairId": "P1", "Points": 5000,
             "PlayerName1": "WANG Chuqin", "IttfId1": "121558", "CountryName1": "China", "CountryCode1": "CHN",
             "PlayerName1d": "LIANG Jingkun", "IttfId1d": "112092", "CountryName1d": "China", "CountryCode1d": "CHN"}
        ]}})
    }

    fn snapshot(category: RankingCategory, payload: Value) -> RankingSnapshot {
        RankingSnapshot {
            category,
            payload,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_filter_and_sort() {
        let players = category_players(RankingCategory::SenSingles, &singles_payload());
        assert_eq!(players.len(), 3);
        assert_eq!(players[0].name, "WANG Chuqin");
        assert_eq!(players[0].rank_change, 2);
        assert_eq!(players[1].name, "FAN Zhendong");
        assert_eq!(players[1].points, 8000);
        assert_eq!(players[1].rank_change, -1);
        assert_eq!(players[2].rank, UNRANKED);
    }

    #[test]
    fn test_doubles_names_joined() {
        let players = category_players(RankingCategory::SenDoubles, &doubles_payload());
        assert_eq!(players[0].name, "WANG Chuqin / LIANG Jingkun");
        assert_eq!(players[0].country, "China");
        assert_eq!(players[0].points, 5000);
    }

    #[test]
    fn test_world_players_merge_partners() {
        let players = world_players(&[
            snapshot(RankingCategory::SenSingles, singles_payload()),
            snapshot(RankingCategory::SenDoubles, doubles_payload()),
        ]);

        let wang = players.iter().find(|p| p.ittf_id == "121558").unwrap();
        assert_eq!(wang.rankings.len(), 2);
        assert_eq!(wang.rankings["SEN_DOUBLES"].rank, 1);

        let liang = players.iter().find(|p| p.ittf_id == "112092").unwrap();
        assert_eq!(liang.name, "LIANG Jingkun");
        assert_eq!(liang.singles_rank(), i64::MAX);

        assert_eq!(players[0].ittf_id, "121558");
        assert_eq!(players[0].photo_url, None);

        let fan = players.iter().find(|p| p.ittf_id == "101929").unwrap();
        assert_eq!(fan.photo_url.as_deref(), Some("https://example.org/fan.png"));
    }

    #[test]
    fn test_search_players() {
        let players = world_players(&[snapshot(RankingCategory::SenSingles, singles_payload())]);
        let found = search_players(players.clone(), "fan");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "FAN Zhendong");

        assert_eq!(search_players(players.clone(), "china").len(), 2);
        assert_eq!(search_players(players.clone(), "121558").len(), 1);
        assert_eq!(search_players(players, " ").len(), 3);
    }

    #[test]
    fn test_best_name_match() {
        let players = world_players(&[snapshot(RankingCategory::SenSingles, singles_payload())]);

        let fan = best_name_match(&players, "Fan Zhendong").unwrap();
        assert_eq!(fan.ittf_id, "101929");

        let wang = best_name_match(&players, "Chuqin Wang").unwrap();
        assert_eq!(wang.ittf_id, "121558");

        assert!(best_name_match(&players, "Timo Boll").is_none());
        assert!(best_name_match(&players, "").is_none());
    }
}
