//! Account endpoints: registration, token issuance and the caller's profile.

use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::extract::ApiJson;
use super::{ApiError, AppState, TokenRequest, TokenResponse};
use crate::db::User;
use crate::services::{ProfileUpdate, Registration, UserProfile};

/// POST /api/user/create/
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let profile = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/user/token/
/// Exchange email and password for the user's token.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .users
        .authenticate(
            payload.email.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    let token = state.users.issue_token(&user).await?;

    Ok(Json(TokenResponse { token }))
}

/// GET /api/user/me/
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.users.get_profile(user.id).await?;
    Ok(Json(profile))
}

/// PATCH /api/user/me/
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.users.update_profile(user.id, payload).await?;
    Ok(Json(profile))
}
