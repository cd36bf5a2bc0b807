use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{head_to_head, health, list_players, match_preview, match_tactics, player_stats, predict_match};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/players", get(list_players))
        .route("/match", post(predict_match))
        .route("/preview", post(match_preview))
        .route("/stats/:name", get(player_stats))
        .route("/h2h", get(head_to_head))
        .route("/tactics", post(match_tactics))
}
