use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use ingest::pipeline::ClipProcessor;
use storage::{
    Database,
    dto::auto_train::{
        ApproveClipRequest, BatchApproveRequest, BatchSummary, ClipListQuery, ClipListResponse, ClipResponse,
        DeleteAllResponse, ExportResponse, ImportAnalysisRequest, ImportPlayerAnalysisRequest, ImportResponse,
        StatisticsResponse, TrainingBatchQuery, TrainingBatchResponse, UpdateLabelRequest,
    },
    dto::common::{HealthResponse, MessageResponse},
    repository::clip::ClipRepository,
    services::clip_stats,
};
use validator::Validate;

use crate::error::WebError;
use crate::extract::{Json, Path, Query};
use crate::state::Settings;

use super::services;

#[utoipa::path(
    get,
    path = "/api/auto-train/health",
    responses(
        (status = 200, description = "Clip manager is up", body = HealthResponse)
    ),
    tag = "auto-train"
)]
pub async fn health() -> Result<Response, WebError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: Some("auto_training".to_string()),
        message: None,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/import",
    request_body = ImportAnalysisRequest,
    responses(
        (status = 200, description = "Clips created from a match analysis", body = ImportResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "auto-train"
)]
pub async fn import_analysis(
    State(db): State<Database>,
    Json(req): Json<ImportAnalysisRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let response = services::import_match(&db, &req).await?;
    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/import-player",
    request_body = ImportPlayerAnalysisRequest,
    responses(
        (status = 200, description = "Clips created from a player analysis", body = ImportResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "auto-train"
)]
pub async fn import_player_analysis(
    State(db): State<Database>,
    Json(req): Json<ImportPlayerAnalysisRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let response = services::import_player(&db, &req).await?;
    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/auto-train/clips",
    params(ClipListQuery),
    responses(
        (status = 200, description = "Clips, newest first", body = ClipListResponse),
        (status = 400, description = "Unknown status")
    ),
    tag = "auto-train"
)]
pub async fn list_clips(
    State(db): State<Database>,
    Query(query): Query<ClipListQuery>,
) -> Result<Response, WebError> {
    let status = services::parse_status(query.status.as_deref())?;
    let clips = ClipRepository::new(db.pool()).list(status).await?;

    Ok(Json(ClipListResponse {
        success: true,
        total: clips.len(),
        clips,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auto-train/clips/{id}",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    responses(
        (status = 200, description = "Clip found", body = ClipResponse),
        (status = 404, description = "Clip not found")
    ),
    tag = "auto-train"
)]
pub async fn get_clip(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let clip = ClipRepository::new(db.pool()).find(&id).await?;
    Ok(Json(ClipResponse { success: true, clip }).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/clips/{id}/approve",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    request_body(content = ApproveClipRequest, description = "Optional relabel, the body may be empty"),
    responses(
        (status = 200, description = "Clip approved", body = ClipResponse),
        (status = 400, description = "Body is not a valid relabel"),
        (status = 404, description = "Clip not found"),
        (status = 409, description = "Clip is no longer pending")
    ),
    tag = "auto-train"
)]
pub async fn approve_clip(
    State(db): State<Database>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, WebError> {
    let label = services::parse_approve_body(&body)?.label;

    let clip = ClipRepository::new(db.pool()).approve(&id, label).await?;
    tracing::info!("Approved clip {} as {}", clip.clip_id, clip.label);

    Ok(Json(ClipResponse { success: true, clip }).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/clips/approve-batch",
    request_body = BatchApproveRequest,
    responses(
        (status = 200, description = "Outcome per clip", body = BatchSummary),
        (status = 400, description = "Invalid request")
    ),
    tag = "auto-train"
)]
pub async fn approve_batch(
    State(db): State<Database>,
    Json(req): Json<BatchApproveRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let summary = services::approve_batch(&db, &req.clip_ids, req.label).await;
    tracing::info!("Batch approve: {} of {} succeeded", summary.success, summary.total);

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/clips/{id}/reject",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    responses(
        (status = 200, description = "Clip rejected", body = ClipResponse),
        (status = 404, description = "Clip not found"),
        (status = 409, description = "Clip is no longer pending")
    ),
    tag = "auto-train"
)]
pub async fn reject_clip(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let clip = ClipRepository::new(db.pool()).reject(&id).await?;
    Ok(Json(ClipResponse { success: true, clip }).into_response())
}

#[utoipa::path(
    put,
    path = "/api/auto-train/clips/{id}/label",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Label updated", body = ClipResponse),
        (status = 404, description = "Clip not found")
    ),
    tag = "auto-train"
)]
pub async fn update_label(
    State(db): State<Database>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLabelRequest>,
) -> Result<Response, WebError> {
    let clip = ClipRepository::new(db.pool()).update_label(&id, req.label).await?;
    Ok(Json(ClipResponse { success: true, clip }).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/auto-train/clips/{id}",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    responses(
        (status = 200, description = "Clip deleted", body = MessageResponse),
        (status = 404, description = "Clip not found")
    ),
    tag = "auto-train"
)]
pub async fn delete_clip(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    ClipRepository::new(db.pool()).delete(&id).await?;
    Ok(Json(MessageResponse::ok(format!("Clip {} deleted", id))).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/auto-train/clips",
    responses(
        (status = 200, description = "Every clip removed", body = DeleteAllResponse)
    ),
    tag = "auto-train"
)]
pub async fn delete_all_clips(State(db): State<Database>) -> Result<Response, WebError> {
    let deleted = ClipRepository::new(db.pool()).clear().await?;
    tracing::warn!("Deleted all {} clips", deleted);

    Ok(Json(DeleteAllResponse { success: true, deleted }).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/clips/{id}/process",
    params(
        ("id" = String, Path, description = "Clip id")
    ),
    responses(
        (status = 200, description = "Clip cut and pose extracted", body = ClipResponse),
        (status = 404, description = "Clip not found"),
        (status = 409, description = "Clip is not approved"),
        (status = 502, description = "Download or media tool failure")
    ),
    tag = "auto-train"
)]
pub async fn process_clip(
    State(db): State<Database>,
    State(processor): State<Arc<ClipProcessor>>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let clip = processor.process(&db, &id).await?;
    Ok(Json(ClipResponse { success: true, clip }).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/process-all",
    responses(
        (status = 200, description = "Outcome per approved clip", body = BatchSummary)
    ),
    tag = "auto-train"
)]
pub async fn process_all(
    State(db): State<Database>,
    State(processor): State<Arc<ClipProcessor>>,
) -> Result<Response, WebError> {
    let summary = processor.process_all(&db).await?;
    Ok(Json(summary).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auto-train/export",
    responses(
        (status = 200, description = "Clips copied into the training folders", body = ExportResponse)
    ),
    tag = "auto-train"
)]
pub async fn export_clips(
    State(db): State<Database>,
    State(processor): State<Arc<ClipProcessor>>,
    State(settings): State<Arc<Settings>>,
) -> Result<Response, WebError> {
    let exported = services::export(&db, processor.layout(), &settings.training_dir).await?;

    Ok(Json(ExportResponse {
        success: true,
        training_dir: settings.training_dir.display().to_string(),
        exported,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auto-train/statistics",
    responses(
        (status = 200, description = "Clip counts", body = StatisticsResponse)
    ),
    tag = "auto-train"
)]
pub async fn statistics(State(db): State<Database>) -> Result<Response, WebError> {
    let clips = ClipRepository::new(db.pool()).list(None).await?;

    Ok(Json(StatisticsResponse {
        success: true,
        statistics: clip_stats::summarize(&clips),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auto-train/training-batch",
    params(TrainingBatchQuery),
    responses(
        (status = 200, description = "Processed clips ready for training", body = TrainingBatchResponse),
        (status = 400, description = "Unknown label")
    ),
    tag = "auto-train"
)]
pub async fn training_batch(
    State(db): State<Database>,
    Query(query): Query<TrainingBatchQuery>,
) -> Result<Response, WebError> {
    let label = services::parse_label(query.label.as_deref())?;
    let clips = ClipRepository::new(db.pool()).list(None).await?;

    Ok(Json(services::training_batch(clips, label)).into_response())
}
