use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers::{
    approve_batch, approve_clip, delete_all_clips, delete_clip, export_clips, get_clip, health, import_analysis,
    import_player_analysis, list_clips, process_all, process_clip, reject_clip, statistics, training_batch,
    update_label,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/import", post(import_analysis))
        .route("/import-player", post(import_player_analysis))
        .route("/clips", get(list_clips).delete(delete_all_clips))
        .route("/clips/approve-batch", post(approve_batch))
        .route("/clips/:id", get(get_clip).delete(delete_clip))
        .route("/clips/:id/approve", post(approve_clip))
        .route("/clips/:id/reject", post(reject_clip))
        .route("/clips/:id/label", put(update_label))
        .route("/clips/:id/process", post(process_clip))
        .route("/process-all", post(process_all))
        .route("/export", post(export_clips))
        .route("/statistics", get(statistics))
        .route("/training-batch", get(training_batch))
}
