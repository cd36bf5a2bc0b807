use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{cancel_training, start_training, training_status};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(start_training))
        .route("/status/:task_id", get(training_status))
        .route("/cancel/:task_id", post(cancel_training))
}
