use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::handlers::{analyze_failure, analyze_failure_batch, analyzer_config};
use super::services::MAX_UPLOAD_BYTES;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(analyze_failure).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/batch",
            post(analyze_failure_batch).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/config", get(analyzer_config))
}
