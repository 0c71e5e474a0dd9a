use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    utils::{encode_token, hash_password, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

fn valid_username(username: &str) -> bool {
    (3..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new user. Returns (user, token).
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<(UserModel, String)> {
        if !valid_username(username) {
            return Err(AppError::Validation(
                "Username must be 3-30 characters of letters, numbers, and underscores"
                    .to_string(),
            ));
        }

        let email = email.trim().to_lowercase();

        if self.user_exists(username, &email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: sea_orm::ActiveValue::Set(username.to_string()),
            email: sea_orm::ActiveValue::Set(email),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            // Display name falls back to the username until the user sets one
            display_name: sea_orm::ActiveValue::Set(username.to_string()),
            role: sea_orm::ActiveValue::Set(user::ROLE_USER.to_string()),
            reputation: sea_orm::ActiveValue::Set(0),
            is_active: sea_orm::ActiveValue::Set(true),
            email_notifications: sea_orm::ActiveValue::Set(true),
            dark_mode: sea_orm::ActiveValue::Set(true),
            show_online_status: sea_orm::ActiveValue::Set(true),
            last_active: sea_orm::ActiveValue::Set(now),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_user.insert(&self.db).await?;
        let token = encode_token(&created.id.to_string())?;

        Ok((created, token))
    }

    /// Login with email + password. Returns (user, token).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserModel, String)> {
        let email = email.trim().to_lowercase();

        let found = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let is_valid = verify_password(password, &found.password_hash)?;
        if !is_valid {
            return Err(AppError::Unauthorized);
        }

        if !found.is_active {
            return Err(AppError::Forbidden);
        }

        let token = encode_token(&found.id.to_string())?;
        Ok((found, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                sea_orm::Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
