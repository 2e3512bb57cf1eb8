//! Domain service for tags, ingredients and recipes.
//!
//! Every operation is scoped to an owner. Rows belonging to other users are
//! indistinguishable from rows that do not exist.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::db::UnknownLink;
use crate::domain::{TaxonomyKind, UpdateMode, UserId};
use crate::models::recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, TaxonomyItem, price_to_cents,
};
use crate::services::image::ImageError;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_LINK_LENGTH: usize = 255;

/// Errors specific to recipe and taxonomy operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<UnknownLink>() {
            Ok(link) => Self::Validation(link.to_string()),
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ImageError> for RecipeError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidImage(_) => Self::Validation(err.to_string()),
            ImageError::Storage(_) | ImageError::Task(_) => Self::Internal(err.to_string()),
        }
    }
}

/// Recipe fields as submitted by a client. Any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// Domain service trait for the owner-scoped recipe catalogue.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Owner's tags or ingredients, ordered by name descending.
    async fn list_attributes(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<TaxonomyItem>, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for a blank name or one the owner
    /// already uses.
    async fn create_attribute(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        name: Option<String>,
    ) -> Result<TaxonomyItem, RecipeError>;

    async fn list_recipes(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for missing or invalid fields and for
    /// tag/ingredient ids the owner does not have.
    async fn create_recipe(&self, owner: UserId, input: RecipeInput)
    -> Result<Recipe, RecipeError>;

    async fn get_recipe(&self, owner: UserId, id: i32) -> Result<RecipeDetail, RecipeError>;

    async fn update_recipe(
        &self,
        owner: UserId,
        id: i32,
        input: RecipeInput,
        mode: UpdateMode,
    ) -> Result<Recipe, RecipeError>;

    /// Stores a new image for the recipe and returns its path relative to the
    /// media root.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::NotFound`] before looking at the payload if the
    /// owner has no such recipe, and [`RecipeError::Validation`] if the payload
    /// does not decode as an image.
    async fn set_image(&self, owner: UserId, id: i32, bytes: Vec<u8>)
    -> Result<String, RecipeError>;
}

pub fn validate_name(name: Option<&str>) -> Result<String, RecipeError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(RecipeError::Validation("Name may not be blank".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(RecipeError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_title(title: &str) -> Result<String, RecipeError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RecipeError::Validation("Title may not be blank".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(RecipeError::Validation(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_time_minutes(minutes: i32) -> Result<i32, RecipeError> {
    if minutes < 0 {
        return Err(RecipeError::Validation(
            "time_minutes must be greater than or equal to 0".to_string(),
        ));
    }
    Ok(minutes)
}

fn validate_price(price: Decimal) -> Result<i64, RecipeError> {
    price_to_cents(price).map_err(RecipeError::Validation)
}

/// Blank links are stored as no link at all.
fn normalize_link(link: Option<String>) -> Result<Option<String>, RecipeError> {
    let Some(link) = link else {
        return Ok(None);
    };

    let link = link.trim();
    if link.is_empty() {
        return Ok(None);
    }
    if link.chars().count() > MAX_LINK_LENGTH {
        return Err(RecipeError::Validation(format!(
            "Link must be at most {MAX_LINK_LENGTH} characters"
        )));
    }
    Ok(Some(link.to_string()))
}

fn missing_fields(input: &RecipeInput) -> Vec<&'static str> {
    [
        ("title", input.title.is_none()),
        ("time_minutes", input.time_minutes.is_none()),
        ("price", input.price.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect()
}

/// Validate a complete submission for a new recipe.
pub fn build_new_recipe(input: RecipeInput) -> Result<NewRecipe, RecipeError> {
    let missing = missing_fields(&input);

    match (input.title, input.time_minutes, input.price) {
        (Some(title), Some(time_minutes), Some(price)) => Ok(NewRecipe {
            title: validate_title(&title)?,
            time_minutes: validate_time_minutes(time_minutes)?,
            price_cents: validate_price(price)?,
            link: normalize_link(input.link)?,
            tag_ids: input.tags.unwrap_or_default(),
            ingredient_ids: input.ingredients.unwrap_or_default(),
        }),
        _ => Err(RecipeError::Validation(format!(
            "This field is required: {}",
            missing.join(", ")
        ))),
    }
}

/// Turn a submission into changes for an existing recipe.
///
/// A full update requires the same fields as a create; anything it omits
/// is cleared. A partial update only touches what was sent.
pub fn build_changes(input: RecipeInput, mode: UpdateMode) -> Result<RecipeChanges, RecipeError> {
    if mode.is_full() {
        let recipe = build_new_recipe(input)?;
        return Ok(RecipeChanges {
            title: Some(recipe.title),
            time_minutes: Some(recipe.time_minutes),
            price_cents: Some(recipe.price_cents),
            link: Some(recipe.link),
            tag_ids: Some(recipe.tag_ids),
            ingredient_ids: Some(recipe.ingredient_ids),
        });
    }

    Ok(RecipeChanges {
        title: input.title.as_deref().map(validate_title).transpose()?,
        time_minutes: input.time_minutes.map(validate_time_minutes).transpose()?,
        price_cents: input.price.map(validate_price).transpose()?,
        link: match input.link {
            Some(link) => Some(normalize_link(Some(link))?),
            None => None,
        },
        tag_ids: input.tags,
        ingredient_ids: input.ingredients,
    })
}
