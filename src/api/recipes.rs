//! Recipe endpoints: listing with filters, detail, create, full and partial
//! update, and image upload.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartRejection, rejection::QueryRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::ApiJson;
use super::validation::{parse_id_list, validate_recipe_id};
use super::{ApiError, AppState, ImageUploadDto, RecipeDetailDto, RecipeDto};
use crate::db::User;
use crate::domain::UpdateMode;
use crate::models::recipe::RecipeFilter;
use crate::services::RecipeInput;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeQuery {
    fn into_filter(self) -> Result<RecipeFilter, ApiError> {
        Ok(RecipeFilter {
            tag_ids: self
                .tags
                .as_deref()
                .map(|raw| parse_id_list("tags", raw))
                .transpose()?,
            ingredient_ids: self
                .ingredients
                .as_deref()
                .map(|raw| parse_id_list("ingredients", raw))
                .transpose()?,
        })
    }
}

/// GET /api/recipe/recipes/
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    query: Result<Query<RecipeQuery>, QueryRejection>,
) -> Result<Json<Vec<RecipeDto>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    let filter = query.into_filter()?;

    let recipes = state.recipes.list_recipes(user.id, &filter).await?;

    Ok(Json(recipes.into_iter().map(RecipeDto::from).collect()))
}

/// POST /api/recipe/recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<(StatusCode, Json<RecipeDto>), ApiError> {
    let recipe = state.recipes.create_recipe(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(RecipeDto::from(recipe))))
}

/// GET /api/recipe/recipes/{id}/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<RecipeDetailDto>, ApiError> {
    let id = validate_recipe_id(&id)?;

    let detail = state.recipes.get_recipe(user.id, id).await?;

    Ok(Json(RecipeDetailDto::from_detail(detail, &state.images)))
}

/// PUT /api/recipe/recipes/{id}/
pub async fn replace_recipe(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    id: Path<String>,
    payload: ApiJson<RecipeInput>,
) -> Result<Json<RecipeDto>, ApiError> {
    update_recipe(UpdateMode::Full, state, user, id, payload).await
}

/// PATCH /api/recipe/recipes/{id}/
pub async fn patch_recipe(
    state: State<Arc<AppState>>,
    user: Extension<User>,
    id: Path<String>,
    payload: ApiJson<RecipeInput>,
) -> Result<Json<RecipeDto>, ApiError> {
    update_recipe(UpdateMode::Partial, state, user, id, payload).await
}

async fn update_recipe(
    mode: UpdateMode,
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RecipeInput>,
) -> Result<Json<RecipeDto>, ApiError> {
    let id = validate_recipe_id(&id)?;

    let recipe = state
        .recipes
        .update_recipe(user.id, id, payload, mode)
        .await?;

    Ok(Json(RecipeDto::from(recipe)))
}

/// POST /api/recipe/recipes/{id}/upload-image/
/// Expects a multipart body with the file in the `image` field.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageUploadDto>, ApiError> {
    let id = validate_recipe_id(&id)?;

    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;
    let mut bytes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(e.body_text()))?
                .to_vec();
            break;
        }
    }

    let stored = state.recipes.set_image(user.id, id, bytes).await?;

    Ok(Json(ImageUploadDto {
        id,
        image: state.images.url_for(&stored),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_query_into_filter() {
        let filter = RecipeQuery {
            tags: Some("1,2".to_string()),
            ingredients: None,
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.tag_ids, Some(vec![1, 2]));
        assert_eq!(filter.ingredient_ids, None);
    }

    #[test]
    fn test_recipe_query_rejects_malformed_ids() {
        let result = RecipeQuery {
            tags: None,
            ingredients: Some("a".to_string()),
        }
        .into_filter();

        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }
}
