use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool, types::Json};

use crate::error::Result;
use crate::models::{MatchHistoryEntry, PlayerId, PlayerProfile};

#[derive(FromRow)]
struct ProfileRow {
    player_id: String,
    display_name: String,
    aliases: Json<Vec<String>>,
    country: Option<String>,
    country_code: Option<String>,
    avatar_url: Option<String>,
    ittf_id: Option<String>,
    aggregate_ratings: Json<BTreeMap<String, f64>>,
    match_history: Json<Vec<MatchHistoryEntry>>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl From<ProfileRow> for PlayerProfile {
    fn from(row: ProfileRow) -> Self {
        let match_history = row.match_history.0;
        Self {
            player_id: row.player_id,
            display_name: row.display_name,
            aliases: row.aliases.0,
            country: row.country,
            country_code: row.country_code,
            avatar_url: row.avatar_url,
            ittf_id: row.ittf_id,
            aggregate_ratings: row.aggregate_ratings.0,
            total_matches: match_history.len(),
            match_history,
            created_at: row.created_at,
            last_updated: row.last_updated,
        }
    }
}

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Look a profile up by any spelling of the player's name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<PlayerProfile>> {
        let id = PlayerId::from_name(name);

        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM player_profiles WHERE player_id = ?")
            .bind(id.as_str())
            .fetch_optional(self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(Some(row.into()));
        }

        self.find_by_alias(name).await
    }

    async fn find_by_alias(&self, name: &str) -> Result<Option<PlayerProfile>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM player_profiles WHERE LOWER(aliases) LIKE ? ORDER BY last_updated DESC",
        )
        .bind(format!("%{}%", name.to_lowercase()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(PlayerProfile::from)
            .find(|p| p.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))))
    }

    pub async fn save(&self, profile: &PlayerProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player_profiles (
                player_id, display_name, aliases, country, country_code, avatar_url,
                ittf_id, aggregate_ratings, match_history, created_at, last_updated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (player_id) DO UPDATE SET
                display_name = excluded.display_name,
                aliases = excluded.aliases,
                country = excluded.country,
                country_code = excluded.country_code,
                avatar_url = excluded.avatar_url,
                ittf_id = excluded.ittf_id,
                aggregate_ratings = excluded.aggregate_ratings,
                match_history = excluded.match_history,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&profile.player_id)
        .bind(&profile.display_name)
        .bind(Json(&profile.aliases))
        .bind(&profile.country)
        .bind(&profile.country_code)
        .bind(&profile.avatar_url)
        .bind(&profile.ittf_id)
        .bind(Json(&profile.aggregate_ratings))
        .bind(Json(&profile.match_history))
        .bind(profile.created_at)
        .bind(profile.last_updated)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Most recently updated first
    pub async fn list(&self, limit: u32) -> Result<Vec<PlayerProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM player_profiles ORDER BY last_updated DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PlayerProfile::from).collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<PlayerProfile>> {
        let pattern = format!("%{}%", query.trim().to_lowercase());

        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT * FROM player_profiles
            WHERE player_id LIKE ? OR LOWER(display_name) LIKE ? OR LOWER(aliases) LIKE ?
            ORDER BY last_updated DESC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PlayerProfile::from).collect())
    }
}
