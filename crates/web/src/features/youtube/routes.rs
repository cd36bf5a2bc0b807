use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{
    analysis_info, analyze_player, analyze_video, delete_history, get_history, list_history, validate_url, video_info,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate_url))
        .route("/info", get(analysis_info).post(video_info))
        .route("/analyze", post(analyze_video))
        .route("/analyze-player", post(analyze_player))
        .route("/history", get(list_history))
        .route("/history/:id", get(get_history).delete(delete_history))
}
