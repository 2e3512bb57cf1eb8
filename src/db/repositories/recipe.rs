use anyhow::Result;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

use super::taxonomy::ensure_owned;
use crate::domain::{TaxonomyKind, UserId};
use crate::entities::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use crate::models::recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, TaxonomyItem, cents_to_price,
};

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model_to_recipe(
        model: recipes::Model,
        tag_ids: Vec<i32>,
        ingredient_ids: Vec<i32>,
    ) -> Recipe {
        Recipe {
            id: model.id,
            title: model.title,
            time_minutes: model.time_minutes,
            price: cents_to_price(model.price_cents),
            link: model.link,
            image: model.image,
            tag_ids,
            ingredient_ids,
        }
    }

    /// Owner's recipes, newest first.
    pub async fn list(&self, owner: UserId, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        let mut query = recipes::Entity::find()
            .filter(recipes::Column::UserId.eq(owner.value()))
            .order_by_desc(recipes::Column::Id);

        if let Some(tag_ids) = &filter.tag_ids {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tags::Column::RecipeId)
                        .from(recipe_tags::Entity)
                        .and_where(recipe_tags::Column::TagId.is_in(tag_ids.iter().copied()))
                        .to_owned(),
                ),
            );
        }

        if let Some(ingredient_ids) = &filter.ingredient_ids {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_ingredients::Column::RecipeId)
                        .from(recipe_ingredients::Entity)
                        .and_where(
                            recipe_ingredients::Column::IngredientId
                                .is_in(ingredient_ids.iter().copied()),
                        )
                        .to_owned(),
                ),
            );
        }

        let models = query.all(&self.conn).await?;
        attach_link_ids(&self.conn, models).await
    }

    pub async fn exists(&self, owner: UserId, id: i32) -> Result<bool> {
        let model = recipes::Entity::find_by_id(id)
            .filter(recipes::Column::UserId.eq(owner.value()))
            .one(&self.conn)
            .await?;

        Ok(model.is_some())
    }

    /// Recipe with nested tags and ingredients, `None` if the owner has no such recipe.
    pub async fn get(&self, owner: UserId, id: i32) -> Result<Option<RecipeDetail>> {
        let Some(model) = recipes::Entity::find_by_id(id)
            .filter(recipes::Column::UserId.eq(owner.value()))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let tags = tags::Entity::find()
            .filter(
                tags::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tags::Column::TagId)
                        .from(recipe_tags::Entity)
                        .and_where(recipe_tags::Column::RecipeId.eq(id))
                        .to_owned(),
                ),
            )
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|t| TaxonomyItem {
                id: t.id,
                name: t.name,
            })
            .collect();

        let ingredients = ingredients::Entity::find()
            .filter(
                ingredients::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_ingredients::Column::IngredientId)
                        .from(recipe_ingredients::Entity)
                        .and_where(recipe_ingredients::Column::RecipeId.eq(id))
                        .to_owned(),
                ),
            )
            .order_by_asc(ingredients::Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|i| TaxonomyItem {
                id: i.id,
                name: i.name,
            })
            .collect();

        Ok(Some(RecipeDetail {
            id: model.id,
            title: model.title,
            time_minutes: model.time_minutes,
            price: cents_to_price(model.price_cents),
            link: model.link,
            image: model.image,
            tags,
            ingredients,
        }))
    }

    /// Insert a recipe and its links in one transaction.
    pub async fn create(&self, owner: UserId, recipe: NewRecipe) -> Result<Recipe> {
        let tag_ids = dedup_ids(recipe.tag_ids);
        let ingredient_ids = dedup_ids(recipe.ingredient_ids);

        let txn = self.conn.begin().await?;

        ensure_owned(&txn, TaxonomyKind::Tag, owner, &tag_ids).await?;
        ensure_owned(&txn, TaxonomyKind::Ingredient, owner, &ingredient_ids).await?;

        let now = chrono::Utc::now().to_rfc3339();
        let model = recipes::ActiveModel {
            user_id: Set(owner.value()),
            title: Set(recipe.title),
            time_minutes: Set(recipe.time_minutes),
            price_cents: Set(recipe.price_cents),
            link: Set(recipe.link),
            image: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        replace_tag_links(&txn, model.id, &tag_ids).await?;
        replace_ingredient_links(&txn, model.id, &ingredient_ids).await?;

        txn.commit().await?;

        Ok(Self::map_model_to_recipe(model, tag_ids, ingredient_ids))
    }

    /// Apply `changes` in one transaction, `None` if the owner has no such recipe.
    pub async fn update(
        &self,
        owner: UserId,
        id: i32,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>> {
        let txn = self.conn.begin().await?;

        let Some(model) = recipes::Entity::find_by_id(id)
            .filter(recipes::Column::UserId.eq(owner.value()))
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let tag_ids = changes.tag_ids.map(dedup_ids);
        let ingredient_ids = changes.ingredient_ids.map(dedup_ids);

        if let Some(ids) = &tag_ids {
            ensure_owned(&txn, TaxonomyKind::Tag, owner, ids).await?;
        }
        if let Some(ids) = &ingredient_ids {
            ensure_owned(&txn, TaxonomyKind::Ingredient, owner, ids).await?;
        }

        let mut active: recipes::ActiveModel = model.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = changes.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price_cents) = changes.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(link) = changes.link {
            active.link = Set(link);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&txn).await?;

        if let Some(ids) = &tag_ids {
            replace_tag_links(&txn, id, ids).await?;
        }
        if let Some(ids) = &ingredient_ids {
            replace_ingredient_links(&txn, id, ids).await?;
        }

        let recipe = attach_link_ids(&txn, vec![model]).await?.pop();

        txn.commit().await?;
        Ok(recipe)
    }

    /// Record a new image path.
    ///
    /// The outer `None` means the owner has no such recipe; the inner value is
    /// the path that was replaced.
    pub async fn set_image(
        &self,
        owner: UserId,
        id: i32,
        image: String,
    ) -> Result<Option<Option<String>>> {
        let Some(model) = recipes::Entity::find_by_id(id)
            .filter(recipes::Column::UserId.eq(owner.value()))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let previous = model.image.clone();

        let mut active: recipes::ActiveModel = model.into();
        active.image = Set(Some(image));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(Some(previous))
    }
}

fn dedup_ids(mut ids: Vec<i32>) -> Vec<i32> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn replace_tag_links<C>(db: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<()>
where
    C: ConnectionTrait,
{
    recipe_tags::Entity::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !tag_ids.is_empty() {
        let links: Vec<recipe_tags::ActiveModel> = tag_ids
            .iter()
            .map(|&tag_id| recipe_tags::ActiveModel {
                recipe_id: Set(recipe_id),
                tag_id: Set(tag_id),
            })
            .collect();

        recipe_tags::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }

    Ok(())
}

async fn replace_ingredient_links<C>(db: &C, recipe_id: i32, ingredient_ids: &[i32]) -> Result<()>
where
    C: ConnectionTrait,
{
    recipe_ingredients::Entity::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    if !ingredient_ids.is_empty() {
        let links: Vec<recipe_ingredients::ActiveModel> = ingredient_ids
            .iter()
            .map(|&ingredient_id| recipe_ingredients::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(ingredient_id),
            })
            .collect();

        recipe_ingredients::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }

    Ok(())
}

/// Load the tag and ingredient ids of each recipe, preserving input order.
async fn attach_link_ids<C>(db: &C, models: Vec<recipes::Model>) -> Result<Vec<Recipe>>
where
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

    let mut tags_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in recipe_tags::Entity::find()
        .filter(recipe_tags::Column::RecipeId.is_in(ids.iter().copied()))
        .order_by_asc(recipe_tags::Column::TagId)
        .all(db)
        .await?
    {
        tags_by_recipe
            .entry(link.recipe_id)
            .or_default()
            .push(link.tag_id);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in recipe_ingredients::Entity::find()
        .filter(recipe_ingredients::Column::RecipeId.is_in(ids.iter().copied()))
        .order_by_asc(recipe_ingredients::Column::IngredientId)
        .all(db)
        .await?
    {
        ingredients_by_recipe
            .entry(link.recipe_id)
            .or_default()
            .push(link.ingredient_id);
    }

    Ok(models
        .into_iter()
        .map(|model| {
            let tag_ids = tags_by_recipe.remove(&model.id).unwrap_or_default();
            let ingredient_ids = ingredients_by_recipe.remove(&model.id).unwrap_or_default();
            RecipeRepository::map_model_to_recipe(model, tag_ids, ingredient_ids)
        })
        .collect())
}
