use crate::config::{Config, SecurityConfig};
use crate::domain::{TaxonomyKind, UserId};
use crate::models::recipe::{
    NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, TaxonomyItem,
};
use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::taxonomy::UnknownLink;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let conn = Self::connect(db_url, max_connections, min_connections).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Open a pool without touching the schema.
    pub async fn connect(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<DatabaseConnection> {
        let in_memory = is_in_memory(db_url);

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str).context("Failed to create database file")?;
            }
        }

        // An in-memory database lives only as long as its connections, keep exactly one.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        Ok(Database::connect(opt).await?)
    }

    pub async fn migrate(&self) -> Result<()> {
        use sea_orm_migration::MigratorTrait;

        migrator::Migrator::up(&self.conn, None).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn taxonomy_repo(&self) -> repositories::taxonomy::TaxonomyRepository {
        repositories::taxonomy::TaxonomyRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users & tokens
    // ========================================================================

    pub async fn create_user(&self, user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, config).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_profile(
        &self,
        id: UserId,
        name: Option<String>,
        password: Option<String>,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .update_profile(id, name, password, config)
            .await
    }

    pub async fn get_or_create_token(&self, user_id: UserId) -> Result<String> {
        self.token_repo().get_or_create(user_id).await
    }

    pub async fn resolve_token(&self, key: &str) -> Result<Option<User>> {
        self.token_repo().resolve(key).await
    }

    // ========================================================================
    // Tags & ingredients
    // ========================================================================

    pub async fn list_taxonomy(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<TaxonomyItem>> {
        self.taxonomy_repo().list(kind, owner, assigned_only).await
    }

    pub async fn create_taxonomy(
        &self,
        kind: TaxonomyKind,
        owner: UserId,
        name: String,
    ) -> Result<TaxonomyItem> {
        self.taxonomy_repo().create(kind, owner, name).await
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn list_recipes(&self, owner: UserId, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        self.recipe_repo().list(owner, filter).await
    }

    pub async fn recipe_exists(&self, owner: UserId, id: i32) -> Result<bool> {
        self.recipe_repo().exists(owner, id).await
    }

    pub async fn get_recipe(&self, owner: UserId, id: i32) -> Result<Option<RecipeDetail>> {
        self.recipe_repo().get(owner, id).await
    }

    pub async fn create_recipe(&self, owner: UserId, recipe: NewRecipe) -> Result<Recipe> {
        self.recipe_repo().create(owner, recipe).await
    }

    pub async fn update_recipe(
        &self,
        owner: UserId,
        id: i32,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>> {
        self.recipe_repo().update(owner, id, changes).await
    }

    pub async fn set_recipe_image(
        &self,
        owner: UserId,
        id: i32,
        image: String,
    ) -> Result<Option<Option<String>>> {
        self.recipe_repo().set_image(owner, id, image).await
    }
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// True when the error chain carries a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_in_memory() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:test?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:data/recipes.db"));
    }

    #[test]
    fn test_is_unique_violation_ignores_other_errors() {
        let err = anyhow::anyhow!("boom");
        assert!(!is_unique_violation(&err));

        let err: anyhow::Error = DbErr::RecordNotFound("recipe".to_string()).into();
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_connect_reports_unusable_database_directory() {
        let blocker = std::env::temp_dir().join(format!("recipe-api-{}", uuid::Uuid::new_v4()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let db_url = format!("sqlite://{}", blocker.join("data").join("recipes.db").display());
        let err = Store::connect(&db_url, 1, 1).await.unwrap_err();

        assert!(format!("{err:#}").contains("Failed to create database directory"));
        let _ = std::fs::remove_file(&blocker);
    }
}
