use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, types::Json};

use crate::error::{Result, StorageError};
use crate::models::{AnalysisRecord, new_short_id};

/// Only the newest records are kept.
pub const HISTORY_CAPACITY: i64 = 100;

#[derive(FromRow)]
struct AnalysisRow {
    record_id: String,
    video_id: String,
    video_title: String,
    video_url: String,
    video_duration: Option<f64>,
    thumbnail_url: String,
    player_focus: Option<String>,
    player2_focus: Option<String>,
    analysis_result: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalysisRecord {
    fn from(row: AnalysisRow) -> Self {
        Self {
            record_id: row.record_id,
            video_id: row.video_id,
            video_title: row.video_title,
            video_url: row.video_url,
            video_duration: row.video_duration,
            thumbnail_url: row.thumbnail_url,
            player_focus: row.player_focus,
            player2_focus: row.player2_focus,
            analysis_result: row.analysis_result.0,
            created_at: row.created_at,
        }
    }
}

/// Fields needed to store a new analysis.
pub struct NewAnalysis<'r> {
    pub video_id: &'r str,
    pub video_title: &'r str,
    pub video_url: &'r str,
    pub video_duration: Option<f64>,
    pub player_focus: Option<&'r str>,
    pub player2_focus: Option<&'r str>,
    pub analysis_result: &'r serde_json::Value,
}

pub struct AnalysisRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AnalysisRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store an analysis and return its record id. A video that was already
    /// analysed keeps its existing record.
    pub async fn save(&self, new: NewAnalysis<'_>) -> Result<String> {
        if let Some(existing) = self.find_id_by_video(new.video_id).await? {
            return Ok(existing);
        }

        let record_id = new_short_id();

        sqlx::query(
            r#"
            INSERT INTO analysis_records (
                record_id, video_id, video_title, video_url, video_duration,
                thumbnail_url, player_focus, player2_focus, analysis_result, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record_id)
        .bind(new.video_id)
        .bind(new.video_title)
        .bind(new.video_url)
        .bind(new.video_duration)
        .bind(AnalysisRecord::thumbnail_for(new.video_id))
        .bind(new.player_focus)
        .bind(new.player2_focus)
        .bind(Json(new.analysis_result))
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        self.prune().await?;

        Ok(record_id)
    }

    async fn find_id_by_video(&self, video_id: &str) -> Result<Option<String>> {
        let id = sqlx::query_scalar::<_, String>(
            "SELECT record_id FROM analysis_records WHERE video_id = ?",
        )
        .bind(video_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }

    async fn prune(&self) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM analysis_records
            WHERE record_id NOT IN (
                SELECT record_id FROM analysis_records
                ORDER BY created_at DESC, rowid DESC
                LIMIT ?
            )
            "#,
        )
        .bind(HISTORY_CAPACITY)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Newest first. `search` matches the title and both player focus fields,
    /// `player` only the player focus fields.
    pub async fn list(
        &self,
        limit: u32,
        search: Option<&str>,
        player: Option<&str>,
    ) -> Result<Vec<AnalysisRecord>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM analysis_records WHERE 1=1");

        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            query.push(" AND (LOWER(video_title) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(player_focus, '')) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(player2_focus, '')) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(player) = player.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", player.trim().to_lowercase());
            query.push(" AND (LOWER(COALESCE(player_focus, '')) LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR LOWER(COALESCE(player2_focus, '')) LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        query.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        query.push_bind(limit as i64);

        let rows: Vec<AnalysisRow> = query.build_query_as().fetch_all(self.pool).await?;

        Ok(rows.into_iter().map(AnalysisRecord::from).collect())
    }

    pub async fn find(&self, record_id: &str) -> Result<AnalysisRecord> {
        let row = sqlx::query_as::<_, AnalysisRow>(
            "SELECT * FROM analysis_records WHERE record_id = ?",
        )
        .bind(record_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(row.into())
    }

    pub async fn delete(&self, record_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM analysis_records WHERE record_id = ?")
            .bind(record_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;
    use serde_json::json;

    fn new_analysis<'r>(video_id: &'r str, title: &'r str, result: &'r serde_json::Value) -> NewAnalysis<'r> {
        NewAnalysis {
            video_id,
            video_title: title,
            video_url: "https://www.youtube.com/watch?v=x",
            video_duration: Some(120.0),
            player_focus: Some("Ma Long"),
            player2_focus: None,
            analysis_result: result,
        }
    }

    #[tokio::test]
    async fn test_save_dedupes_by_video() {
        let db = test_db().await;
        let repo = AnalysisRepository::new(db.pool());
        let result = json!({"summary": "ok"});

        let first = repo.save(new_analysis("vid1", "A vs B", &result)).await.unwrap();
        let second = repo.save(new_analysis("vid1", "A vs B again", &result)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.list(50, None, None).await.unwrap().len(), 1);

        let record = repo.find(&first).await.unwrap();
        assert_eq!(
            record.thumbnail_url,
            "https://img.youtube.com/vi/vid1/maxresdefault.jpg"
        );
        assert_eq!(record.analysis_result["summary"], "ok");
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let db = test_db().await;
        let repo = AnalysisRepository::new(db.pool());
        let result = json!({});

        let id = repo.save(new_analysis("v1", "WTT Finals Highlights", &result)).await.unwrap();
        repo.save(new_analysis("v2", "Training session", &result)).await.unwrap();

        let found = repo.list(50, Some("finals"), None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record_id, id);

        let by_player = repo.list(50, None, Some("ma long")).await.unwrap();
        assert_eq!(by_player.len(), 2);

        repo.delete(&id).await.unwrap();
        assert!(matches!(repo.find(&id).await, Err(StorageError::NotFound)));
    }
}
