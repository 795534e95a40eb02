use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tembea_core::identity::Profile;
use tembea_sync::profile::ProfileQuery;
use tembea_sync::view::ResourceQuery;

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/profile", get(get_profile).patch(update_profile))
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    full_name: String,
}

async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Profile>, ApiError> {
    let identity = user.require()?.clone();
    let profile = ProfileQuery {
        identity: Some(identity),
    }
    .load(state.client.as_ref())
    .await?
    .ok_or_else(|| ApiError::NotFoundError("Profile not found".to_string()))?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let identity = user.require()?.clone();
    state
        .intake
        .update_profile_name(Some(&identity), &req.full_name)
        .await?;

    // Explicit reload after the mutation rather than waiting on the feed.
    let profile = ProfileQuery {
        identity: Some(identity),
    }
    .load(state.client.as_ref())
    .await?
    .ok_or_else(|| ApiError::NotFoundError("Profile not found".to_string()))?;
    Ok(Json(profile))
}
