//! World Table Tennis rankings: fetching, caching and reading the feed.

mod client;
pub mod models;

use std::collections::BTreeMap;

use storage::Database;
use storage::models::RankingCategory;
use storage::repository::ranking::RankingRepository;

pub use client::WttClient;

use crate::error::Result;
use crate::traits::RankingSource;

/// Fetches one category and stores it as the latest snapshot.
pub async fn refresh_category(
    source: &dyn RankingSource,
    db: &Database,
    category: RankingCategory,
) -> Result<usize> {
    let payload = source.fetch(category).await?;
    let count = models::category_players(category, &payload).len();

    RankingRepository::new(db.pool()).upsert(category, &payload).await?;
    tracing::info!("Updated {} rankings ({} players)", category.as_str(), count);

    Ok(count)
}

/// Refreshes every category, carrying on past failures.
/// Returns each category's outcome as "success" or "failed".
pub async fn refresh_all(source: &dyn RankingSource, db: &Database) -> BTreeMap<String, String> {
    let mut results = BTreeMap::new();

    for category in RankingCategory::ALL {
        let outcome = match refresh_category(source, db, category).await {
            Ok(_) => "success",
            Err(e) => {
                tracing::warn!("Failed to refresh {} rankings: {}", category.as_str(), e);
                "failed"
            }
        };
        results.insert(category.as_str().to_string(), outcome.to_string());
    }

    results
}
