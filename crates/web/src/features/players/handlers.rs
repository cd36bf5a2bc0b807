use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use ingest::sources::wtt::models;
use storage::{
    Database,
    dto::common::PaginatedResponse,
    dto::ranking::{WorldPlayer, WorldPlayerFilter, WorldPlayerResponse},
};

use crate::error::WebError;
use crate::extract::{Json, Path, Query};

use super::services;

#[utoipa::path(
    get,
    path = "/api/players",
    params(WorldPlayerFilter),
    responses(
        (status = 200, description = "Players across all cached rankings", body = PaginatedResponse<WorldPlayer>),
        (status = 400, description = "Invalid pagination")
    ),
    tag = "players"
)]
pub async fn list_players(
    State(db): State<Database>,
    Query(filter): Query<WorldPlayerFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let players = services::world_players(&db).await?;
    let matched = models::search_players(players, filter.search.as_deref().unwrap_or_default());
    let total = matched.len();

    let pagination = filter.pagination();
    let page: Vec<WorldPlayer> = matched
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit())
        .collect();

    Ok(Json(PaginatedResponse::new(page, filter.page, filter.per_page, total)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/players/{ittf_id}",
    params(
        ("ittf_id" = String, Path, description = "ITTF player id")
    ),
    responses(
        (status = 200, description = "Player found", body = WorldPlayerResponse),
        (status = 404, description = "Player not ranked")
    ),
    tag = "players"
)]
pub async fn get_player(
    State(db): State<Database>,
    Path(ittf_id): Path<String>,
) -> Result<Response, WebError> {
    let player = services::find_player(&db, &ittf_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Player {} not found", ittf_id)))?;

    Ok(Json(WorldPlayerResponse {
        success: true,
        player,
    })
    .into_response())
}
