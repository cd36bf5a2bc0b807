use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::profile::{ProfileListQuery, ProfileListResponse, ProfileResponse, ProfileSearchQuery, ProfileSummary},
    models::PlayerProfile,
    repository::profile::ProfileRepository,
};

use crate::error::WebError;
use crate::extract::{Json, Path, Query};

fn list_response(profiles: Vec<PlayerProfile>) -> Response {
    let profiles: Vec<ProfileSummary> = profiles.into_iter().map(ProfileSummary::from).collect();

    Json(ProfileListResponse {
        success: true,
        total: profiles.len(),
        profiles,
    })
    .into_response()
}

#[utoipa::path(
    get,
    path = "/api/profiles",
    params(ProfileListQuery),
    responses(
        (status = 200, description = "Profiles, most recently updated first", body = ProfileListResponse)
    ),
    tag = "profiles"
)]
pub async fn list_profiles(
    State(db): State<Database>,
    Query(query): Query<ProfileListQuery>,
) -> Result<Response, WebError> {
    let profiles = ProfileRepository::new(db.pool()).list(query.limit).await?;
    Ok(list_response(profiles))
}

#[utoipa::path(
    get,
    path = "/api/profiles/search",
    params(ProfileSearchQuery),
    responses(
        (status = 200, description = "Profiles matching the query", body = ProfileListResponse),
        (status = 400, description = "Empty query")
    ),
    tag = "profiles"
)]
pub async fn search_profiles(
    State(db): State<Database>,
    Query(query): Query<ProfileSearchQuery>,
) -> Result<Response, WebError> {
    if query.q.trim().is_empty() {
        return Err(WebError::BadRequest("q is required".to_string()));
    }

    let profiles = ProfileRepository::new(db.pool()).search(query.q.trim()).await?;
    Ok(list_response(profiles))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{name}",
    params(
        ("name" = String, Path, description = "Player name, any spelling")
    ),
    responses(
        (status = 200, description = "Full profile with match history", body = ProfileResponse),
        (status = 404, description = "No profile for this player")
    ),
    tag = "profiles"
)]
pub async fn get_profile(
    State(db): State<Database>,
    Path(name): Path<String>,
) -> Result<Response, WebError> {
    let profile = ProfileRepository::new(db.pool())
        .find_by_name(&name)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("No profile for {}", name)))?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    })
    .into_response())
}
