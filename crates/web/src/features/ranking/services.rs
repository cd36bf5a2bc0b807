use std::collections::BTreeMap;

use ingest::RankingSource;
use ingest::sources::wtt::{self, models};
use storage::{
    Database,
    dto::ranking::CategoryRanking,
    error::StorageError,
    models::{RankingCategory, RankingSnapshot},
    repository::ranking::RankingRepository,
};

use crate::error::WebResult;

pub fn category_ranking(snapshot: &RankingSnapshot) -> CategoryRanking {
    let players = models::category_players(snapshot.category, &snapshot.payload);

    CategoryRanking {
        success: true,
        category: snapshot.category.as_str().to_string(),
        updated_at: snapshot.fetched_at,
        total_records: players.len(),
        players,
    }
}

/// Cached snapshot, fetched from WTT first when nothing is cached yet.
pub async fn load_or_fetch(
    db: &Database,
    source: &dyn RankingSource,
    category: RankingCategory,
) -> WebResult<RankingSnapshot> {
    let repo = RankingRepository::new(db.pool());

    if let Some(snapshot) = repo.find(category).await? {
        return Ok(snapshot);
    }

    tracing::info!("No cached {} rankings, fetching now", category.as_str());
    wtt::refresh_category(source, db, category).await?;

    Ok(repo.find(category).await?.ok_or(StorageError::NotFound)?)
}

pub async fn all_rankings(db: &Database) -> WebResult<BTreeMap<String, CategoryRanking>> {
    let snapshots = RankingRepository::new(db.pool()).list().await?;

    Ok(snapshots
        .iter()
        .map(|s| (s.category.as_str().to_string(), category_ranking(s)))
        .collect())
}
