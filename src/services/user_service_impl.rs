//! `SeaORM` implementation of the `UserService` trait.

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User, is_unique_violation};
use crate::domain::UserId;
use crate::services::user_service::{
    ProfileUpdate, Registration, UserError, UserProfile, UserService, normalize_email,
    validate_password,
};
use async_trait::async_trait;
use tracing::info;

const DUPLICATE_EMAIL: &str = "A user with this email already exists";

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn create(&self, new_user: NewUser) -> Result<User, UserError> {
        validate_password(&new_user.password, self.security.min_password_length)?;

        if self.store.get_user_by_email(&new_user.email).await?.is_some() {
            return Err(UserError::Validation(DUPLICATE_EMAIL.to_string()));
        }

        self.store
            .create_user(new_user, &self.security)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::Validation(DUPLICATE_EMAIL.to_string())
                } else {
                    e.into()
                }
            })
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, registration: Registration) -> Result<UserProfile, UserError> {
        let email = normalize_email(registration.email.as_deref().unwrap_or_default())?;

        let user = self
            .create(NewUser {
                email,
                password: registration.password.unwrap_or_default(),
                name: registration.name.unwrap_or_default().trim().to_string(),
                is_staff: false,
                is_superuser: false,
            })
            .await?;

        info!(user_id = %user.id, "Registered new user");
        Ok(UserProfile::from(user))
    }

    async fn create_superuser(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, UserError> {
        let email = normalize_email(email)?;

        let user = self
            .create(NewUser {
                email,
                password: password.to_string(),
                name: String::new(),
                is_staff: true,
                is_superuser: true,
            })
            .await?;

        info!(user_id = %user.id, "Created superuser");
        Ok(UserProfile::from(user))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let email = normalize_email(email).map_err(|_| UserError::InvalidCredentials)?;

        let user = self
            .store
            .verify_user_password(&email, password)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !user.is_active {
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn issue_token(&self, user: &User) -> Result<String, UserError> {
        let token = self.store.get_or_create_token(user.id).await?;
        info!(user_id = %user.id, "Issued auth token");
        Ok(token)
    }

    async fn resolve_token(&self, token: &str) -> Result<User, UserError> {
        if token.is_empty() {
            return Err(UserError::InvalidToken);
        }

        self.store
            .resolve_token(token)
            .await?
            .filter(|user| user.is_active)
            .ok_or(UserError::InvalidToken)
    }

    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, UserError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(UserProfile::from(user))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, UserError> {
        if let Some(password) = &update.password {
            validate_password(password, self.security.min_password_length)?;
        }

        if self.store.get_user(user_id).await?.is_none() {
            return Err(UserError::NotFound);
        }

        let password_changed = update.password.is_some();
        let user = self
            .store
            .update_user_profile(
                user_id,
                update.name.map(|n| n.trim().to_string()),
                update.password,
                &self.security,
            )
            .await?;

        if password_changed {
            info!(user_id = %user_id, "Password changed");
        }

        Ok(UserProfile::from(user))
    }
}
