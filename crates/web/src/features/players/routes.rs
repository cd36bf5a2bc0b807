use axum::{Router, routing::get};

use super::handlers::{get_player, list_players};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_players))
        .route("/:ittf_id", get(get_player))
}
