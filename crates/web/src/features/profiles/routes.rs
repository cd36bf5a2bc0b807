use axum::{Router, routing::get};

use super::handlers::{get_profile, list_profiles, search_profiles};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles))
        .route("/search", get(search_profiles))
        .route("/:name", get(get_profile))
}
