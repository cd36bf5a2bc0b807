use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{get_category, list_rankings, update_rankings};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rankings", get(list_rankings))
        .route("/rankings/:category", get(get_category))
        .route("/update", post(update_rankings))
}
