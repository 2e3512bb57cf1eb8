//! Tag and ingredient endpoints. Both kinds share the same handlers.

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::parse_flag;
use super::{ApiError, AppState, TaxonomyDto, TaxonomyRequest};
use crate::db::User;
use crate::domain::TaxonomyKind;

#[derive(Debug, Default, Deserialize)]
pub struct TaxonomyQuery {
    pub assigned_only: Option<String>,
}

/// GET /api/recipe/tags/
pub async fn list_tags(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    query: Result<Query<TaxonomyQuery>, QueryRejection>,
) -> Result<Json<Vec<TaxonomyDto>>, ApiError> {
    list_items(TaxonomyKind::Tag, state, user, query).await
}

/// POST /api/recipe/tags/
pub async fn create_tag(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    payload: ApiJson<TaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyDto>), ApiError> {
    create_item(TaxonomyKind::Tag, state, user, payload).await
}

/// GET /api/recipe/ingredients/
pub async fn list_ingredients(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    query: Result<Query<TaxonomyQuery>, QueryRejection>,
) -> Result<Json<Vec<TaxonomyDto>>, ApiError> {
    list_items(TaxonomyKind::Ingredient, state, user, query).await
}

/// POST /api/recipe/ingredients/
pub async fn create_ingredient(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    payload: ApiJson<TaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyDto>), ApiError> {
    create_item(TaxonomyKind::Ingredient, state, user, payload).await
}

async fn list_items(
    kind: TaxonomyKind,
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    query: Result<Query<TaxonomyQuery>, QueryRejection>,
) -> Result<Json<Vec<TaxonomyDto>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;

    let assigned_only = match query.assigned_only.as_deref() {
        Some(raw) => parse_flag("assigned_only", raw)?,
        None => false,
    };

    let items = state
        .recipes
        .list_attributes(kind, user.id, assigned_only)
        .await?;

    Ok(Json(items.into_iter().map(TaxonomyDto::from).collect()))
}

async fn create_item(
    kind: TaxonomyKind,
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<TaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyDto>), ApiError> {
    let item = state
        .recipes
        .create_attribute(kind, user.id, payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(TaxonomyDto::from(item))))
}
