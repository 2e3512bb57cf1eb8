use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Largest accepted price: five digits with two decimal places.
pub const MAX_PRICE_CENTS: i64 = 99_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyItem {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<TaxonomyItem>,
    pub ingredients: Vec<TaxonomyItem>,
}

/// Restricts a recipe listing. Each id set matches recipes linked to any of
/// its ids; both sets must match when both are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price_cents: i64,
    pub link: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// Column and link changes for an existing recipe. `None` leaves the value as it is.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    pub link: Option<Option<String>>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

/// Converts a decimal price into integer cents.
///
/// Rejects negative values, more than two decimal places and anything above
/// [`MAX_PRICE_CENTS`].
pub fn price_to_cents(price: Decimal) -> Result<i64, String> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price must be greater than or equal to 0".to_string());
    }

    let normalized = price.normalize();
    if normalized.scale() > 2 {
        return Err("Price must have no more than 2 decimal places".to_string());
    }

    let cents = (normalized * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| "Price is out of range".to_string())?;

    if cents > MAX_PRICE_CENTS {
        return Err("Price must have no more than 5 digits in total".to_string());
    }

    Ok(cents)
}

#[must_use]
pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_price_to_cents() {
        assert_eq!(price_to_cents(Decimal::from_str("5.00").unwrap()), Ok(500));
        assert_eq!(price_to_cents(Decimal::from_str("5.5").unwrap()), Ok(550));
        assert_eq!(price_to_cents(Decimal::from(12)), Ok(1200));
        assert_eq!(price_to_cents(Decimal::ZERO), Ok(0));
        assert_eq!(price_to_cents(Decimal::from_str("999.99").unwrap()), Ok(99_999));
    }

    #[test]
    fn test_price_to_cents_rejects_invalid() {
        assert!(price_to_cents(Decimal::from_str("-1").unwrap()).is_err());
        assert!(price_to_cents(Decimal::from_str("1.005").unwrap()).is_err());
        assert!(price_to_cents(Decimal::from_str("1000.00").unwrap()).is_err());
    }

    #[test]
    fn test_cents_to_price_keeps_two_places() {
        assert_eq!(cents_to_price(500).to_string(), "5.00");
        assert_eq!(cents_to_price(1).to_string(), "0.01");
    }
}
