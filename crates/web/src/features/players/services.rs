use ingest::sources::wtt::models;
use storage::{Database, dto::ranking::WorldPlayer, repository::ranking::RankingRepository};

use crate::error::WebResult;

pub async fn world_players(db: &Database) -> WebResult<Vec<WorldPlayer>> {
    let snapshots = RankingRepository::new(db.pool()).list().await?;
    Ok(models::world_players(&snapshots))
}

pub async fn find_player(db: &Database, ittf_id: &str) -> WebResult<Option<WorldPlayer>> {
    let players = world_players(db).await?;
    Ok(players.into_iter().find(|p| p.ittf_id == ittf_id))
}
