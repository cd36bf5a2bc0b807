use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool, types::Json};

use crate::error::{Result, StorageError};
use crate::models::{RankingCategory, RankingSnapshot};

#[derive(FromRow)]
struct SnapshotRow {
    category: String,
    payload: Json<serde_json::Value>,
    fetched_at: DateTime<Utc>,
}

impl TryFrom<SnapshotRow> for RankingSnapshot {
    type Error = StorageError;

    fn try_from(row: SnapshotRow) -> Result<Self> {
        let category = RankingCategory::parse(&row.category).ok_or_else(|| {
            StorageError::InvalidInput(format!("unknown ranking category '{}'", row.category))
        })?;

        Ok(Self {
            category,
            payload: row.payload.0,
            fetched_at: row.fetched_at,
        })
    }
}

pub struct RankingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RankingRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the cached payload for a category
    pub async fn upsert(&self, category: RankingCategory, payload: &serde_json::Value) -> Result<DateTime<Utc>> {
        let fetched_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO ranking_snapshots (category, payload, fetched_at)
            VALUES (?, ?, ?)
            ON CONFLICT (category) DO UPDATE SET
                payload = excluded.payload,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(category.as_str())
        .bind(Json(payload))
        .bind(fetched_at)
        .execute(self.pool)
        .await?;

        Ok(fetched_at)
    }

    pub async fn find(&self, category: RankingCategory) -> Result<Option<RankingSnapshot>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            "SELECT category, payload, fetched_at FROM ranking_snapshots WHERE category = ?",
        )
        .bind(category.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(RankingSnapshot::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<RankingSnapshot>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT category, payload, fetched_at FROM ranking_snapshots ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RankingSnapshot::try_from).collect()
    }
}
