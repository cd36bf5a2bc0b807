use axum::{Router, routing::get};

use super::handlers::{api_health, health};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(api_health))
}
