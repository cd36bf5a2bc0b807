use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use storage::{
    Database,
    dto::common::HealthResponse,
    dto::prediction::{
        HeadToHeadQuery, HeadToHeadResponse, MatchPreview, MatchupRequest, PlayerStatsResponse, PredictionResponse,
        RosterQuery, RosterResponse, TacticsRequest, TacticsResponse,
    },
    services::{prediction, roster, tactics},
};
use validator::Validate;

use crate::error::WebError;
use crate::extract::{Json, Path, Query};

use super::services;

#[utoipa::path(
    get,
    path = "/api/predict/health",
    responses(
        (status = 200, description = "Prediction service is up", body = HealthResponse)
    ),
    tag = "predict"
)]
pub async fn health() -> Result<Response, WebError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: Some("match_prediction".to_string()),
        message: None,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/predict/players",
    params(RosterQuery),
    responses(
        (status = 200, description = "Known players sorted by rank", body = RosterResponse),
        (status = 400, description = "Unknown gender")
    ),
    tag = "predict"
)]
pub async fn list_players(Query(query): Query<RosterQuery>) -> Result<Response, WebError> {
    let gender = services::parse_gender(query.gender.as_deref())?;
    let players = roster::players(gender);

    Ok(Json(RosterResponse {
        success: true,
        total: players.len(),
        players,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/predict/match",
    request_body = MatchupRequest,
    responses(
        (status = 200, description = "Win probabilities", body = PredictionResponse),
        (status = 400, description = "Missing, identical or unknown players")
    ),
    tag = "predict"
)]
pub async fn predict_match(
    State(db): State<Database>,
    Json(req): Json<MatchupRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let matches = services::load_matches(&db, &[req.player1.as_str(), req.player2.as_str()]).await?;
    let matchup = prediction::matchup(&req.player1, &req.player2, &matches)?;

    Ok(Json(PredictionResponse {
        success: true,
        prediction: matchup.prediction,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/predict/preview",
    request_body = MatchupRequest,
    responses(
        (status = 200, description = "Prediction with both players' stats", body = MatchPreview),
        (status = 400, description = "Missing, identical or unknown players")
    ),
    tag = "predict"
)]
pub async fn match_preview(
    State(db): State<Database>,
    Json(req): Json<MatchupRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let matches = services::load_matches(&db, &[req.player1.as_str(), req.player2.as_str()]).await?;
    let matchup = prediction::matchup(&req.player1, &req.player2, &matches)?;

    Ok(Json(MatchPreview {
        success: true,
        prediction: matchup.prediction,
        player1_stats: matchup.player1_stats,
        player2_stats: matchup.player2_stats,
        head_to_head: matchup.head_to_head,
        analysis_time: Utc::now(),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/predict/stats/{name}",
    params(
        ("name" = String, Path, description = "Player name")
    ),
    responses(
        (status = 200, description = "Career statistics", body = PlayerStatsResponse),
        (status = 404, description = "No recorded matches")
    ),
    tag = "predict"
)]
pub async fn player_stats(
    State(db): State<Database>,
    Path(name): Path<String>,
) -> Result<Response, WebError> {
    let name = services::canonical_name(&name);
    let matches = services::load_matches(&db, &[name.as_str()]).await?;

    let stats = prediction::player_stats(&name, &matches);
    if stats.total_matches == 0 {
        return Err(WebError::NotFound(format!("No matches recorded for {}", name)));
    }

    Ok(Json(PlayerStatsResponse { success: true, stats }).into_response())
}

#[utoipa::path(
    get,
    path = "/api/predict/h2h",
    params(HeadToHeadQuery),
    responses(
        (status = 200, description = "Head-to-head record, null when they never met", body = HeadToHeadResponse)
    ),
    tag = "predict"
)]
pub async fn head_to_head(
    State(db): State<Database>,
    Query(query): Query<HeadToHeadQuery>,
) -> Result<Response, WebError> {
    let player1 = services::canonical_name(&query.player1);
    let player2 = services::canonical_name(&query.player2);
    if player1.is_empty() || player2.is_empty() {
        return Err(WebError::BadRequest("player1 and player2 are required".to_string()));
    }

    let matches = services::load_matches(&db, &[player1.as_str(), player2.as_str()]).await?;
    let record = prediction::head_to_head(&player1, &player2, &matches);

    let message = record
        .is_none()
        .then(|| format!("{} and {} have no recorded meetings", player1, player2));

    Ok(Json(HeadToHeadResponse {
        success: true,
        head_to_head: record,
        message,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/predict/tactics",
    request_body = TacticsRequest,
    responses(
        (status = 200, description = "Match plan for the player", body = TacticsResponse),
        (status = 400, description = "Missing, identical or unknown players")
    ),
    tag = "predict"
)]
pub async fn match_tactics(
    State(db): State<Database>,
    Json(req): Json<TacticsRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let matches = services::load_matches(&db, &[req.player.as_str(), req.opponent.as_str()]).await?;
    let matchup = prediction::matchup(&req.player, &req.opponent, &matches)?;

    Ok(Json(TacticsResponse {
        success: true,
        tactics: tactics::generate_tactics(&matchup),
    })
    .into_response())
}
