//! `SeaORM` implementation of the `RecipeService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::db::{Store, is_unique_violation};
use crate::domain::{TaxonomyKind, UpdateMode, UserId};
use crate::models::recipe::{Recipe, RecipeDetail, RecipeFilter, TaxonomyItem};
use crate::services::image::ImageService;
use crate::services::recipe_service::{
    RecipeError, RecipeInput, RecipeService, build_changes, build_new_recipe, validate_name,
};

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    fn recipe_not_found(id: i32) -> RecipeError {
        RecipeError::NotFound(format!("Recipe {id}"))
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list_attributes(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<TaxonomyItem>, RecipeError> {
        Ok(self
            .store
            .list_taxonomy(kind, owner, assigned_only)
            .await?)
    }

    async fn create_attribute(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        name: Option<String>,
    ) -> Result<TaxonomyItem, RecipeError> {
        let name = validate_name(name.as_deref())?;

        self.store
            .create_taxonomy(kind, owner, name)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RecipeError::Validation(format!("A {kind} with this name already exists"))
                } else {
                    e.into()
                }
            })
    }

    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipeError> {
        Ok(self.store.list_recipes(owner, filter).await?)
    }

    async fn create_recipe(
        &self,
        owner: UserId,
        input: RecipeInput,
    ) -> Result<Recipe, RecipeError> {
        let recipe = build_new_recipe(input)?;
        let recipe = self.store.create_recipe(owner, recipe).await?;

        info!(user_id = %owner, recipe_id = recipe.id, "Created recipe");
        Ok(recipe)
    }

    async fn get_recipe(&self, owner: UserId, id: i32) -> Result<RecipeDetail, RecipeError> {
        self.store
            .get_recipe(owner, id)
            .await?
            .ok_or_else(|| Self::recipe_not_found(id))
    }

    async fn update_recipe(
        &self,
        owner: UserId,
        id: i32,
        input: RecipeInput,
        mode: UpdateMode,
    ) -> Result<Recipe, RecipeError> {
        if !self.store.recipe_exists(owner, id).await? {
            return Err(Self::recipe_not_found(id));
        }

        let changes = build_changes(input, mode)?;

        self.store
            .update_recipe(owner, id, changes)
            .await?
            .ok_or_else(|| Self::recipe_not_found(id))
    }

    async fn set_image(
        &self,
        owner: UserId,
        id: i32,
        bytes: Vec<u8>,
    ) -> Result<String, RecipeError> {
        if !self.store.recipe_exists(owner, id).await? {
            return Err(Self::recipe_not_found(id));
        }

        if bytes.is_empty() {
            return Err(RecipeError::Validation(
                "No file was submitted".to_string(),
            ));
        }

        let stored = self.images.save_recipe_image(bytes).await?;

        let previous = match self.store.set_recipe_image(owner, id, stored.clone()).await {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                self.images.remove(&stored).await;
                return Err(Self::recipe_not_found(id));
            }
            Err(e) => {
                self.images.remove(&stored).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous.filter(|p| *p != stored) {
            self.images.remove(&previous).await;
        }

        info!(user_id = %owner, recipe_id = id, path = %stored, "Uploaded recipe image");
        Ok(stored)
    }
}
