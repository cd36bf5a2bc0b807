use std::cmp::Reverse;
use std::collections::HashSet;

use storage::{
    Database,
    models::{Gender, MatchRecord},
    repository::match_record::MatchRecordRepository,
    services::roster,
};

use crate::error::{WebError, WebResult};

/// Roster spelling of a name when the player is known.
pub fn canonical_name(name: &str) -> String {
    roster::find(name)
        .map(|p| p.name)
        .unwrap_or_else(|| name.trim().to_string())
}

pub fn parse_gender(gender: Option<&str>) -> WebResult<Option<Gender>> {
    match gender.map(str::trim).filter(|g| !g.is_empty()) {
        None => Ok(None),
        Some(g) => Gender::parse(g)
            .map(Some)
            .ok_or_else(|| WebError::BadRequest(format!("gender must be men or women, got {}", g))),
    }
}

/// Every match involving any of `names`, once each, newest first.
pub async fn load_matches(db: &Database, names: &[&str]) -> WebResult<Vec<MatchRecord>> {
    let repo = MatchRecordRepository::new(db.pool());
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for name in names {
        for record in repo.for_player(&canonical_name(name)).await? {
            if seen.insert(record.match_id.clone()) {
                matches.push(record);
            }
        }
    }

    matches.sort_by_key(|m| Reverse(m.date));
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use storage::models::MatchSide;

    fn record(id: &str, date: (i32, u32, u32), p1: &str, p2: &str) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            tournament: "WTT Champions".to_string(),
            round: "QF".to_string(),
            player1_name: p1.to_string(),
            player1_rank: Some(1),
            player2_name: p2.to_string(),
            player2_rank: Some(2),
            winner: MatchSide::Player1,
            score: "4-2".to_string(),
            sets: vec![],
            gender: "men".to_string(),
        }
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("  fan zhendong "), "Fan Zhendong");
        assert_eq!(canonical_name("Local Hero"), "Local Hero");
    }

    #[test]
    fn test_parse_gender() {
        assert_eq!(parse_gender(None).unwrap(), None);
        assert_eq!(parse_gender(Some("women")).unwrap(), Some(Gender::Women));
        assert!(parse_gender(Some("juniors")).is_err());
    }

    #[tokio::test]
    async fn test_load_matches_dedupes_shared_meetings() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();

        MatchRecordRepository::new(db.pool())
            .upsert_many(&[
                record("m1", (2024, 3, 1), "Fan Zhendong", "Ma Long"),
                record("m2", (2024, 5, 1), "Ma Long", "Hugo Calderano"),
                record("m3", (2024, 4, 1), "Fan Zhendong", "Felix Lebrun"),
            ])
            .await
            .unwrap();

        let matches = load_matches(&db, &["fan zhendong", "Ma Long"]).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m1"]);
    }
}
