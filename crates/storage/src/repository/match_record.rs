use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool, types::Json};

use crate::error::Result;
use crate::models::{MatchRecord, MatchSide};

#[derive(FromRow)]
struct MatchRow {
    match_id: String,
    match_date: Option<NaiveDate>,
    tournament: String,
    round: String,
    player1_name: String,
    player1_rank: Option<i64>,
    player2_name: String,
    player2_rank: Option<i64>,
    winner: MatchSide,
    score: String,
    sets: Json<Vec<String>>,
    gender: String,
}

impl From<MatchRow> for MatchRecord {
    fn from(row: MatchRow) -> Self {
        Self {
            match_id: row.match_id,
            date: row.match_date,
            tournament: row.tournament,
            round: row.round,
            player1_name: row.player1_name,
            player1_rank: row.player1_rank,
            player2_name: row.player2_name,
            player2_rank: row.player2_rank,
            winner: row.winner,
            score: row.score,
            sets: row.sets.0,
            gender: row.gender,
        }
    }
}

pub struct MatchRecordRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MatchRecordRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace records by `match_id`. Returns the number written.
    pub async fn upsert_many(&self, records: &[MatchRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO match_records (
                    match_id, match_date, tournament, round, player1_name, player1_rank,
                    player2_name, player2_rank, winner, score, sets, gender
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.match_id)
            .bind(record.date)
            .bind(&record.tournament)
            .bind(&record.round)
            .bind(&record.player1_name)
            .bind(record.player1_rank)
            .bind(&record.player2_name)
            .bind(record.player2_rank)
            .bind(record.winner)
            .bind(&record.score)
            .bind(Json(&record.sets))
            .bind(&record.gender)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(records.len())
    }

    /// Every match the player took part in, newest first
    pub async fn for_player(&self, name: &str) -> Result<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT * FROM match_records
            WHERE LOWER(player1_name) = LOWER(?) OR LOWER(player2_name) = LOWER(?)
            ORDER BY match_date DESC, rowid DESC
            "#,
        )
        .bind(name)
        .bind(name)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }

    /// Meetings between two players in either order, newest first
    pub async fn between(&self, a: &str, b: &str) -> Result<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT * FROM match_records
            WHERE (LOWER(player1_name) = LOWER(?) AND LOWER(player2_name) = LOWER(?))
               OR (LOWER(player1_name) = LOWER(?) AND LOWER(player2_name) = LOWER(?))
            ORDER BY match_date DESC, rowid DESC
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    fn record(id: &str, p1: &str, p2: &str, winner: MatchSide) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
            tournament: "WTT Champions".to_string(),
            round: "Final".to_string(),
            player1_name: p1.to_string(),
            player1_rank: Some(1),
            player2_name: p2.to_string(),
            player2_rank: Some(2),
            winner,
            score: "4-2".to_string(),
            sets: vec!["11-9".to_string()],
            gender: "men".to_string(),
        }
    }

    #[tokio::test]
    async fn test_between_matches_either_order() {
        let db = test_db().await;
        let repo = MatchRecordRepository::new(db.pool());
        repo.upsert_many(&[
            record("m1", "Wang Chuqin", "Fan Zhendong", MatchSide::Player1),
            record("m2", "Fan Zhendong", "Wang Chuqin", MatchSide::Player1),
            record("m3", "Ma Long", "Fan Zhendong", MatchSide::Player2),
        ])
        .await
        .unwrap();

        assert_eq!(repo.between("wang chuqin", "Fan Zhendong").await.unwrap().len(), 2);
        assert_eq!(repo.for_player("Fan Zhendong").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let db = test_db().await;
        let repo = MatchRecordRepository::new(db.pool());
        repo.upsert_many(&[record("m1", "A", "B", MatchSide::Player1)]).await.unwrap();
        repo.upsert_many(&[record("m1", "A", "B", MatchSide::Player2)]).await.unwrap();

        let all = repo.for_player("A").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].winner, MatchSide::Player2);
    }
}
