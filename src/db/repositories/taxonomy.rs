use anyhow::Result;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashSet;

use crate::domain::{TaxonomyKind, UserId};
use crate::entities::{ingredients, recipe_ingredients, recipe_tags, tags};
use crate::models::recipe::TaxonomyItem;

/// A tag or ingredient id that does not exist for the requesting owner.
#[derive(Debug, thiserror::Error)]
#[error("Invalid {kind} id {id}: object does not exist")]
pub struct UnknownLink {
    pub kind: TaxonomyKind,
    pub id: i32,
}

pub struct TaxonomyRepository {
    conn: DatabaseConnection,
}

impl TaxonomyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Owner's items ordered by name descending, optionally only those linked to a recipe.
    pub async fn list(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<TaxonomyItem>> {
        let items = match kind {
            TaxonomyKind::Tag => {
                let mut query = tags::Entity::find()
                    .filter(tags::Column::UserId.eq(owner.value()))
                    .order_by_desc(tags::Column::Name);

                if assigned_only {
                    query = query.filter(
                        tags::Column::Id.in_subquery(
                            Query::select()
                                .column(recipe_tags::Column::TagId)
                                .from(recipe_tags::Entity)
                                .to_owned(),
                        ),
                    );
                }

                query
                    .all(&self.conn)
                    .await?
                    .into_iter()
                    .map(|m| TaxonomyItem {
                        id: m.id,
                        name: m.name,
                    })
                    .collect()
            }
            TaxonomyKind::Ingredient => {
                let mut query = ingredients::Entity::find()
                    .filter(ingredients::Column::UserId.eq(owner.value()))
                    .order_by_desc(ingredients::Column::Name);

                if assigned_only {
                    query = query.filter(
                        ingredients::Column::Id.in_subquery(
                            Query::select()
                                .column(recipe_ingredients::Column::IngredientId)
                                .from(recipe_ingredients::Entity)
                                .to_owned(),
                        ),
                    );
                }

                query
                    .all(&self.conn)
                    .await?
                    .into_iter()
                    .map(|m| TaxonomyItem {
                        id: m.id,
                        name: m.name,
                    })
                    .collect()
            }
        };

        Ok(items)
    }

    /// Insert a new item. A duplicate name for the same owner fails with the
    /// underlying unique-constraint `DbErr`.
    pub async fn create(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        name: String,
    ) -> Result<TaxonomyItem> {
        let item = match kind {
            TaxonomyKind::Tag => {
                let model = tags::ActiveModel {
                    name: Set(name),
                    user_id: Set(owner.value()),
                    ..Default::default()
                }
                .insert(&self.conn)
                .await?;

                TaxonomyItem {
                    id: model.id,
                    name: model.name,
                }
            }
            TaxonomyKind::Ingredient => {
                let model = ingredients::ActiveModel {
                    name: Set(name),
                    user_id: Set(owner.value()),
                    ..Default::default()
                }
                .insert(&self.conn)
                .await?;

                TaxonomyItem {
                    id: model.id,
                    name: model.name,
                }
            }
        };

        Ok(item)
    }
}

/// Fail with [`UnknownLink`] unless every id names an item owned by `owner`.
pub async fn ensure_owned<C>(db: &C, kind: TaxonomyKind, owner: UserId, ids: &[i32]) -> Result<()>
where
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(());
    }

    let found: HashSet<i32> = match kind {
        TaxonomyKind::Tag => tags::Entity::find()
            .filter(tags::Column::UserId.eq(owner.value()))
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        TaxonomyKind::Ingredient => ingredients::Entity::find()
            .filter(ingredients::Column::UserId.eq(owner.value()))
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
    };

    if let Some(&id) = ids.iter().find(|id| !found.contains(id)) {
        return Err(UnknownLink { kind, id }.into());
    }

    Ok(())
}
