use crate::{
    error::{AppError, AppResult},
    models::{post, user, Post, User, UserModel},
    services::follow::FollowService,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Profile as read by other users: the model plus counts computed from
/// relationships at query time.
#[derive(Debug)]
pub struct UserProfile {
    pub user: UserModel,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub email_notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub show_online_status: Option<bool>,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserModel> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_profile(&self, username: &str) -> AppResult<UserProfile> {
        let found = self.get_by_username(username).await?;

        let post_count = Post::find()
            .filter(post::Column::AuthorId.eq(found.id))
            .filter(post::Column::Status.eq(post::STATUS_PUBLISHED))
            .count(&self.db)
            .await?;

        let follows = FollowService::new(self.db.clone());
        let follower_count = follows.follower_count(found.id).await?;
        let following_count = follows.following_count(found.id).await?;

        Ok(UserProfile {
            user: found,
            post_count,
            follower_count,
            following_count,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> AppResult<UserModel> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        if let Some(display_name) = changes.display_name {
            if display_name.len() > 50 {
                return Err(AppError::Validation(
                    "Display name cannot exceed 50 characters".to_string(),
                ));
            }
            active.display_name = sea_orm::ActiveValue::Set(display_name);
        }
        if let Some(bio) = changes.bio {
            if bio.len() > 500 {
                return Err(AppError::Validation(
                    "Bio cannot exceed 500 characters".to_string(),
                ));
            }
            active.bio = sea_orm::ActiveValue::Set(Some(bio));
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = sea_orm::ActiveValue::Set(Some(avatar));
        }
        if let Some(email_notifications) = changes.email_notifications {
            active.email_notifications = sea_orm::ActiveValue::Set(email_notifications);
        }
        if let Some(dark_mode) = changes.dark_mode {
            active.dark_mode = sea_orm::ActiveValue::Set(dark_mode);
        }
        if let Some(show_online_status) = changes.show_online_status {
            active.show_online_status = sea_orm::ActiveValue::Set(show_online_status);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Substring search over username and display name.
    pub async fn search(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        if query.len() < 2 {
            return Err(AppError::Validation(
                "Search query must be at least 2 characters".to_string(),
            ));
        }

        let paginator = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.contains(query))
                    .add(user::Column::DisplayName.contains(query)),
            )
            .order_by_asc(user::Column::Username)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((users, total))
    }
}
