use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use ingest::RankingSource;
use ingest::sources::wtt;
use storage::{
    Database,
    dto::ranking::{AllRankingsResponse, CategoryRanking, RankingUpdateResponse},
    models::RankingCategory,
};

use crate::error::WebError;
use crate::extract::{Json, Path};

use super::services;

#[utoipa::path(
    get,
    path = "/api/rankings",
    responses(
        (status = 200, description = "Every cached ranking category", body = AllRankingsResponse)
    ),
    tag = "rankings"
)]
pub async fn list_rankings(State(db): State<Database>) -> Result<Response, WebError> {
    let categories = services::all_rankings(&db).await?;

    Ok(Json(AllRankingsResponse {
        success: true,
        categories,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/rankings/{category}",
    params(
        ("category" = String, Path, description = "SEN_SINGLES, SEN_DOUBLES, WOM_SINGLES, WOM_DOUBLES or MIX_DOUBLES")
    ),
    responses(
        (status = 200, description = "Ranking for one category", body = CategoryRanking),
        (status = 400, description = "Unknown category"),
        (status = 502, description = "WTT could not be reached")
    ),
    tag = "rankings"
)]
pub async fn get_category(
    State(db): State<Database>,
    State(source): State<Arc<dyn RankingSource>>,
    Path(category): Path<String>,
) -> Result<Response, WebError> {
    let category = RankingCategory::parse(&category)
        .ok_or_else(|| WebError::BadRequest(format!("Unknown ranking category: {}", category)))?;

    let snapshot = services::load_or_fetch(&db, source.as_ref(), category).await?;

    Ok(Json(services::category_ranking(&snapshot)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/update",
    responses(
        (status = 200, description = "Refresh outcome per category", body = RankingUpdateResponse)
    ),
    tag = "rankings"
)]
pub async fn update_rankings(
    State(db): State<Database>,
    State(source): State<Arc<dyn RankingSource>>,
) -> Result<Response, WebError> {
    let results = wtt::refresh_all(source.as_ref(), &db).await;
    let updated = results.values().filter(|r| *r == "success").count();

    Ok(Json(RankingUpdateResponse {
        success: updated > 0,
        message: format!("Updated {} of {} categories", updated, results.len()),
        results,
    })
    .into_response())
}
