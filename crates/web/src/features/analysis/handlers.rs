use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use storage::dto::analysis::{AnalyzerConfigResponse, FailureAnalysisResponse, FailureBatchItem, FailureBatchResponse};

use crate::error::WebError;
use crate::extract::Json;
use crate::state::{Analyzers, Settings};

use super::services;

#[utoipa::path(
    post,
    path = "/api/analyze-failure",
    request_body(content_type = "multipart/form-data", description = "`file` video plus optional `use_gemini`"),
    responses(
        (status = 200, description = "Analysis of the lost point", body = FailureAnalysisResponse),
        (status = 400, description = "Missing file or unsupported format"),
        (status = 502, description = "Video could not be decoded")
    ),
    tag = "analysis"
)]
pub async fn analyze_failure(
    State(analyzers): State<Analyzers>,
    State(settings): State<Arc<Settings>>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut use_gemini = true;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = services::sanitize_filename(field.file_name().unwrap_or_default());
                let data = field.bytes().await?;
                upload = Some((filename, data.to_vec()));
            }
            "use_gemini" => use_gemini = services::parse_flag(&field.text().await?),
            _ => {}
        }
    }

    let (filename, data) = upload.ok_or_else(|| WebError::BadRequest("No video file uploaded".to_string()))?;
    if filename.is_empty() {
        return Err(WebError::BadRequest("No file selected".to_string()));
    }

    let analysis = services::analyze_upload(&analyzers.failure, &settings, &filename, &data, use_gemini).await?;
    tracing::info!("Analysed uploaded clip {}", filename);

    Ok(Json(FailureAnalysisResponse {
        success: true,
        filename,
        analysis,
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/analyze-failure/batch",
    request_body(content_type = "multipart/form-data", description = "One or more `files` videos plus optional `use_gemini`"),
    responses(
        (status = 200, description = "One result per uploaded file", body = FailureBatchResponse),
        (status = 400, description = "No files uploaded")
    ),
    tag = "analysis"
)]
pub async fn analyze_failure_batch(
    State(analyzers): State<Analyzers>,
    State(settings): State<Arc<Settings>>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let mut uploads: Vec<(String, Vec<u8>)> = Vec::new();
    let mut use_gemini = true;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let filename = services::sanitize_filename(field.file_name().unwrap_or_default());
                let data = field.bytes().await?;
                if !filename.is_empty() {
                    uploads.push((filename, data.to_vec()));
                }
            }
            "use_gemini" => use_gemini = services::parse_flag(&field.text().await?),
            _ => {}
        }
    }

    if uploads.is_empty() {
        return Err(WebError::BadRequest("No files uploaded in the files field".to_string()));
    }

    let total = uploads.len();
    let mut results = Vec::with_capacity(total);

    for (filename, data) in uploads {
        let item = match services::analyze_upload(&analyzers.failure, &settings, &filename, &data, use_gemini).await {
            Ok(analysis) => FailureBatchItem::analyzed(filename, analysis),
            Err(e) => {
                tracing::warn!("Batch analysis of {} failed: {}", filename, e);
                FailureBatchItem::failed(filename, e.to_string())
            }
        };
        results.push(item);
    }

    let analyzed = results.iter().filter(|r| r.success).count();
    tracing::info!("Batch analysis finished: {}/{} clips analysed", analyzed, total);

    Ok(Json(FailureBatchResponse {
        success: true,
        total,
        analyzed,
        results,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/analyze-failure/config",
    responses(
        (status = 200, description = "Analyzer capabilities", body = AnalyzerConfigResponse)
    ),
    tag = "analysis"
)]
pub async fn analyzer_config(
    State(analyzers): State<Analyzers>,
    State(settings): State<Arc<Settings>>,
) -> Result<Response, WebError> {
    Ok(Json(AnalyzerConfigResponse {
        success: true,
        gemini_available: analyzers.failure.model_available(),
        gemini_model: settings.gemini_model.clone(),
        supported_formats: services::SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
        max_duration_seconds: services::MAX_DURATION_SECONDS,
        recommended_duration_seconds: services::RECOMMENDED_DURATION_SECONDS,
    })
    .into_response())
}
