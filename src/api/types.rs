use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::recipe::{Recipe, RecipeDetail, TaxonomyItem};
use crate::services::ImageService;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TaxonomyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyDto {
    pub id: i32,
    pub name: String,
}

impl From<TaxonomyItem> for TaxonomyDto {
    fn from(item: TaxonomyItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}

/// Recipe as returned by list, create and update.
#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
}

impl From<Recipe> for RecipeDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tag_ids,
            ingredients: recipe.ingredient_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetailDto {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<TaxonomyDto>,
    pub ingredients: Vec<TaxonomyDto>,
}

impl RecipeDetailDto {
    #[must_use]
    pub fn from_detail(detail: RecipeDetail, images: &ImageService) -> Self {
        Self {
            id: detail.id,
            title: detail.title,
            time_minutes: detail.time_minutes,
            price: detail.price,
            link: detail.link,
            image: detail.image.as_deref().map(|path| images.url_for(path)),
            tags: detail.tags.into_iter().map(TaxonomyDto::from).collect(),
            ingredients: detail
                .ingredients
                .into_iter()
                .map(TaxonomyDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageUploadDto {
    pub id: i32,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub uptime_secs: u64,
    pub version: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::cents_to_price;

    #[test]
    fn test_recipe_dto_serializes_price_as_string() {
        let dto = RecipeDto::from(Recipe {
            id: 1,
            title: "Soup".to_string(),
            time_minutes: 10,
            price: cents_to_price(500),
            link: None,
            image: None,
            tag_ids: vec![2],
            ingredient_ids: vec![],
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["price"], "5.00");
        assert_eq!(json["tags"], serde_json::json!([2]));
        assert!(json["link"].is_null());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "nope"}));
    }
}
