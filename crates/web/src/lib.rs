pub mod config;
pub mod error;
pub mod extract;
pub mod features;
pub mod jobs;
pub mod scheduler;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::health::handlers::health,
        features::health::handlers::api_health,
        features::ranking::handlers::list_rankings,
        features::ranking::handlers::get_category,
        features::ranking::handlers::update_rankings,
        features::players::handlers::list_players,
        features::players::handlers::get_player,
        features::analysis::handlers::analyze_failure,
        features::analysis::handlers::analyze_failure_batch,
        features::analysis::handlers::analyzer_config,
        features::youtube::handlers::validate_url,
        features::youtube::handlers::video_info,
        features::youtube::handlers::analysis_info,
        features::youtube::handlers::analyze_video,
        features::youtube::handlers::analyze_player,
        features::youtube::handlers::list_history,
        features::youtube::handlers::get_history,
        features::youtube::handlers::delete_history,
        features::auto_train::handlers::health,
        features::auto_train::handlers::import_analysis,
        features::auto_train::handlers::import_player_analysis,
        features::auto_train::handlers::list_clips,
        features::auto_train::handlers::get_clip,
        features::auto_train::handlers::approve_clip,
        features::auto_train::handlers::approve_batch,
        features::auto_train::handlers::reject_clip,
        features::auto_train::handlers::update_label,
        features::auto_train::handlers::delete_clip,
        features::auto_train::handlers::delete_all_clips,
        features::auto_train::handlers::process_clip,
        features::auto_train::handlers::process_all,
        features::auto_train::handlers::export_clips,
        features::auto_train::handlers::statistics,
        features::auto_train::handlers::training_batch,
        features::training::handlers::start_training,
        features::training::handlers::training_status,
        features::training::handlers::cancel_training,
        features::profiles::handlers::list_profiles,
        features::profiles::handlers::search_profiles,
        features::profiles::handlers::get_profile,
        features::predict::handlers::health,
        features::predict::handlers::list_players,
        features::predict::handlers::predict_match,
        features::predict::handlers::match_preview,
        features::predict::handlers::player_stats,
        features::predict::handlers::head_to_head,
        features::predict::handlers::match_tactics,
    ),
    components(
        schemas(
            storage::dto::common::HealthResponse,
            storage::dto::common::MessageResponse,
            storage::dto::common::PaginationMeta,
            storage::dto::ranking::CategoryRanking,
            storage::dto::ranking::RankingPlayer,
            storage::dto::ranking::WorldPlayer,
            storage::dto::ranking::WorldRank,
            storage::dto::analysis::VideoInfo,
            storage::dto::analysis::AnalysisSummary,
            storage::dto::analysis::AnalysisLimits,
            storage::dto::analysis::FailureBatchItem,
            storage::dto::auto_train::ClipOutcome,
            storage::dto::auto_train::ClipStatistics,
            storage::dto::auto_train::ExportCounts,
            storage::dto::auto_train::TrainingBatchItem,
            storage::dto::training::TrainingProgress,
            storage::dto::training::TrainingStatus,
            storage::dto::prediction::MatchPrediction,
            storage::dto::prediction::PlayerStats,
            storage::dto::prediction::HeadToHead,
            storage::dto::prediction::MatchTactics,
            storage::models::TrainingClip,
            storage::models::ClipStatus,
            storage::models::ActionLabel,
            storage::models::SourceType,
            storage::models::AnalysisRecord,
            storage::models::PlayerProfile,
            storage::models::MatchHistoryEntry,
            storage::models::RosterPlayer,
            storage::models::PlayStyle,
            storage::models::Gender,
        )
    ),
    tags(
        (name = "health", description = "Liveness checks"),
        (name = "rankings", description = "Cached WTT world rankings"),
        (name = "players", description = "World-ranking players across categories"),
        (name = "analysis", description = "Single point failure analysis"),
        (name = "youtube", description = "Full match analysis from YouTube"),
        (name = "auto-train", description = "Training clip review and export"),
        (name = "training", description = "Action classifier training jobs"),
        (name = "profiles", description = "Player profiles built from analyses"),
        (name = "predict", description = "Match prediction and tactics"),
    )
)]
pub struct ApiDoc;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Every route plus Swagger UI, CORS and request tracing.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .merge(features::ranking::routes())
        .nest("/players", features::players::routes())
        .nest("/analyze-failure", features::analysis::routes())
        .nest("/youtube", features::youtube::routes())
        .nest("/auto-train", features::auto_train::routes())
        .nest("/train", features::training::routes())
        .nest("/profiles", features::profiles::routes())
        .nest("/predict", features::predict::routes());

    Router::new()
        .merge(features::health::routes())
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
