use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use storage::dto::training::{TrainRequest, TrainResponse, TrainingStatusResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::extract::{Json, Path};
use crate::jobs::TrainingJobs;

fn parse_task_id(task_id: &str) -> Result<Uuid, WebError> {
    Uuid::parse_str(task_id).map_err(|_| WebError::NotFound(format!("Task {} not found", task_id)))
}

#[utoipa::path(
    post,
    path = "/api/train",
    request_body = TrainRequest,
    responses(
        (status = 200, description = "Training job started", body = TrainResponse),
        (status = 400, description = "Invalid training configuration")
    ),
    tag = "training"
)]
pub async fn start_training(
    State(jobs): State<TrainingJobs>,
    Json(req): Json<TrainRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let task_id = jobs.start(req).await;

    Ok(Json(TrainResponse {
        success: true,
        task_id,
        message: "Training started".to_string(),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/train/status/{task_id}",
    params(
        ("task_id" = String, Path, description = "Training task id")
    ),
    responses(
        (status = 200, description = "Latest progress", body = TrainingStatusResponse),
        (status = 404, description = "Unknown task")
    ),
    tag = "training"
)]
pub async fn training_status(
    State(jobs): State<TrainingJobs>,
    Path(task_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_task_id(&task_id)?;
    let progress = jobs
        .status(id)
        .await
        .ok_or_else(|| WebError::NotFound(format!("Task {} not found", task_id)))?;

    Ok(Json(TrainingStatusResponse {
        success: true,
        progress,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/train/cancel/{task_id}",
    params(
        ("task_id" = String, Path, description = "Training task id")
    ),
    responses(
        (status = 200, description = "Task cancelled", body = TrainingStatusResponse),
        (status = 404, description = "Unknown task")
    ),
    tag = "training"
)]
pub async fn cancel_training(
    State(jobs): State<TrainingJobs>,
    Path(task_id): Path<String>,
) -> Result<Response, WebError> {
    let id = parse_task_id(&task_id)?;
    let progress = jobs
        .cancel(id)
        .await
        .ok_or_else(|| WebError::NotFound(format!("Task {} not found", task_id)))?;

    tracing::info!("Cancelled training task {}", task_id);

    Ok(Json(TrainingStatusResponse {
        success: true,
        progress,
    })
    .into_response())
}
