use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use super::user::User;
use crate::domain::UserId;
use crate::entities::{auth_tokens, users};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Return the user's token, creating one on first use.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<String> {
        if let Some(key) = self.find_key(user_id).await? {
            return Ok(key);
        }

        self.insert_or_existing(user_id).await
    }

    async fn find_key(&self, user_id: UserId) -> Result<Option<String>> {
        let existing = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query token by user")?;

        Ok(existing.map(|token| token.key))
    }

    /// Insert a fresh token. A concurrent request that stored one first wins.
    async fn insert_or_existing(&self, user_id: UserId) -> Result<String> {
        let inserted = auth_tokens::ActiveModel {
            key: Set(generate_token_key()),
            user_id: Set(user_id.value()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        }
        .insert(&self.conn)
        .await;

        match inserted {
            Ok(token) => Ok(token.key),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                self.find_key(user_id)
                    .await?
                    .context("Token conflict without a stored token")
            }
            Err(err) => Err(err).context("Failed to store token"),
        }
    }

    /// Look up the owner of a token
    pub async fn resolve(&self, key: &str) -> Result<Option<User>> {
        let row = auth_tokens::Entity::find_by_id(key.to_string())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(row.and_then(|(_, user)| user).map(User::from))
    }
}

/// Generate a random token key (40 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::db::{NewUser, Store};

    async fn store_with_user(db_url: &str) -> (Store, UserId) {
        let store = Store::with_pool_options(db_url, 4, 1).await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };

        let user = store
            .create_user(
                NewUser {
                    email: "token@example.com".to_string(),
                    password: "testpass123".to_string(),
                    name: String::new(),
                    is_staff: false,
                    is_superuser: false,
                },
                &security,
            )
            .await
            .unwrap();

        (store, user.id)
    }

    #[tokio::test]
    async fn test_conflicting_insert_returns_stored_token() {
        let (store, user_id) = store_with_user("sqlite::memory:").await;
        let repo = TokenRepository::new(store.conn.clone());

        let first = repo.get_or_create(user_id).await.unwrap();
        let second = repo.insert_or_existing(user_id).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_token() {
        let dir = std::env::temp_dir()
            .join("recipe-api-tests")
            .join(uuid::Uuid::new_v4().to_string());
        let db_url = format!("sqlite://{}", dir.join("tokens.db").display());
        let (store, user_id) = store_with_user(&db_url).await;

        let repo_a = TokenRepository::new(store.conn.clone());
        let repo_b = TokenRepository::new(store.conn.clone());
        let (a, b) = tokio::join!(repo_a.get_or_create(user_id), repo_b.get_or_create(user_id));

        let a = a.unwrap();
        assert_eq!(a, b.unwrap());
        assert_eq!(repo_a.get_or_create(user_id).await.unwrap(), a);

        drop(store);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_generate_token_key_format() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }
}
