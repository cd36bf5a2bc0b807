use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use ingest::MediaToolkit;
use ingest::sources::youtube;
use storage::{
    Database,
    dto::analysis::{
        AnalysisInfoResponse, AnalysisSummary, HistoryListResponse, HistoryQuery, HistoryRecordResponse,
        PlayerAnalyzeRequest, PlayerAnalyzeResponse, ValidateUrlRequest, ValidateUrlResponse, VideoInfoResponse,
        YoutubeAnalyzeRequest, YoutubeAnalyzeResponse,
    },
    dto::common::MessageResponse,
    repository::analysis::AnalysisRepository,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::extract::{Json, Path, Query};
use crate::state::{Analyzers, Settings};

use super::services;

#[utoipa::path(
    post,
    path = "/api/youtube/validate",
    request_body = ValidateUrlRequest,
    responses(
        (status = 200, description = "Whether the URL names a YouTube video", body = ValidateUrlResponse),
        (status = 400, description = "Missing url")
    ),
    tag = "youtube"
)]
pub async fn validate_url(Json(req): Json<ValidateUrlRequest>) -> Result<Response, WebError> {
    req.validate()?;

    let video_id = youtube::extract_video_id(&req.url);

    Ok(Json(ValidateUrlResponse {
        success: true,
        valid: video_id.is_some(),
        video_id,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/youtube/analyze",
    request_body = YoutubeAnalyzeRequest,
    responses(
        (status = 200, description = "Match analysed and stored", body = YoutubeAnalyzeResponse),
        (status = 400, description = "Invalid request or URL"),
        (status = 502, description = "Download or model failure"),
        (status = 503, description = "No vision model configured")
    ),
    tag = "youtube"
)]
pub async fn analyze_video(
    State(db): State<Database>,
    State(analyzers): State<Analyzers>,
    State(settings): State<Arc<Settings>>,
    Json(req): Json<YoutubeAnalyzeRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let analyzer = analyzers
        .matches
        .clone()
        .ok_or_else(|| WebError::Unavailable("Gemini API key is not configured".to_string()))?;

    let focus = services::focus_from(&req);
    let work_dir = settings.work_dir(&format!("match_{}", Uuid::new_v4().simple()));

    let result = analyzer.analyze(&req.url, &focus, &work_dir).await;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        tracing::debug!("Could not remove {}: {}", work_dir.display(), e);
    }

    let analysis = result?;
    let video_info = services::video_info(&analysis.video_id, &analysis.metadata);
    let record_id = services::store_analysis(&db, &analysis, &video_info).await?;

    match services::update_profiles(&db, &analysis, &record_id).await {
        Ok(count) => tracing::info!("Analysis {} stored, {} profiles updated", record_id, count),
        Err(e) => tracing::warn!("Analysis {} stored but profiles were not updated: {}", record_id, e),
    }

    Ok(Json(YoutubeAnalyzeResponse {
        success: true,
        record_id,
        video_info,
        analysis: analysis.analysis,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/youtube/analyze-player",
    request_body = PlayerAnalyzeRequest,
    responses(
        (status = 200, description = "Player's scoring and losing rallies, graded and stored", body = PlayerAnalyzeResponse),
        (status = 400, description = "Invalid request or URL"),
        (status = 502, description = "Download or model failure"),
        (status = 503, description = "No vision model configured")
    ),
    tag = "youtube"
)]
pub async fn analyze_player(
    State(db): State<Database>,
    State(analyzers): State<Analyzers>,
    State(settings): State<Arc<Settings>>,
    Json(req): Json<PlayerAnalyzeRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let analyzer = analyzers
        .matches
        .clone()
        .ok_or_else(|| WebError::Unavailable("Gemini API key is not configured".to_string()))?;

    let work_dir = settings.work_dir(&format!("player_{}", Uuid::new_v4().simple()));

    let result = analyzer
        .analyze_player(&req.url, &req.player_name, req.player_description.as_deref(), &work_dir)
        .await;

    if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
        tracing::debug!("Could not remove {}: {}", work_dir.display(), e);
    }

    let analysis = result?;
    let video_info = services::video_info(&analysis.video_id, &analysis.metadata);
    let record_id = services::store_player_analysis(&db, &analysis, &video_info).await?;
    tracing::info!("Player review of {} stored as {}", analysis.player_name, record_id);

    Ok(Json(PlayerAnalyzeResponse {
        success: true,
        record_id,
        player_name: analysis.player_name,
        video_info,
        analysis: analysis.analysis,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/youtube/info",
    request_body = ValidateUrlRequest,
    responses(
        (status = 200, description = "Video metadata, nothing is downloaded", body = VideoInfoResponse),
        (status = 400, description = "Missing or non-YouTube url"),
        (status = 502, description = "Metadata lookup failed")
    ),
    tag = "youtube"
)]
pub async fn video_info(
    State(media): State<Arc<dyn MediaToolkit>>,
    Json(req): Json<ValidateUrlRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let video_id = youtube::extract_video_id(&req.url)
        .ok_or_else(|| WebError::BadRequest("Invalid YouTube URL".to_string()))?;
    let metadata = media.video_info(&req.url).await?;

    Ok(Json(VideoInfoResponse {
        success: true,
        video_info: services::video_info(&video_id, &metadata),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/youtube/info",
    responses(
        (status = 200, description = "What the YouTube analysis can do here", body = AnalysisInfoResponse)
    ),
    tag = "youtube"
)]
pub async fn analysis_info(State(analyzers): State<Analyzers>) -> Result<Response, WebError> {
    Ok(Json(services::analysis_info(analyzers.matches.is_some())).into_response())
}

#[utoipa::path(
    get,
    path = "/api/youtube/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Stored analyses, newest first", body = HistoryListResponse)
    ),
    tag = "youtube"
)]
pub async fn list_history(
    State(db): State<Database>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, WebError> {
    let records = AnalysisRepository::new(db.pool())
        .list(query.limit, query.search.as_deref(), query.player.as_deref())
        .await?;

    let records: Vec<AnalysisSummary> = records.into_iter().map(AnalysisSummary::from).collect();

    Ok(Json(HistoryListResponse {
        success: true,
        total: records.len(),
        records,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/youtube/history/{id}",
    params(
        ("id" = String, Path, description = "Analysis record id")
    ),
    responses(
        (status = 200, description = "Stored analysis", body = HistoryRecordResponse),
        (status = 404, description = "Record not found")
    ),
    tag = "youtube"
)]
pub async fn get_history(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let record = AnalysisRepository::new(db.pool()).find(&id).await?;

    Ok(Json(HistoryRecordResponse {
        success: true,
        record,
    })
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/api/youtube/history/{id}",
    params(
        ("id" = String, Path, description = "Analysis record id")
    ),
    responses(
        (status = 200, description = "Record deleted", body = MessageResponse),
        (status = 404, description = "Record not found")
    ),
    tag = "youtube"
)]
pub async fn delete_history(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    AnalysisRepository::new(db.pool()).delete(&id).await?;

    Ok(Json(MessageResponse::ok(format!("Record {} deleted", id))).into_response())
}
