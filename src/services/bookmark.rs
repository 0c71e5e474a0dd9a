use crate::{
    error::{AppError, AppResult},
    models::{bookmark, post, Bookmark, Post, PostModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;

pub struct BookmarkService {
    db: DatabaseConnection,
}

impl BookmarkService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Toggle bookmark. One row per (user, post); returns true if the post
    /// is now bookmarked.
    pub async fn toggle(&self, user_id: i32, post_id: i32) -> AppResult<bool> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let existing = Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .filter(bookmark::Column::PostId.eq(post_id))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            Bookmark::delete_by_id(existing.id).exec(&self.db).await?;
            Ok(false)
        } else {
            let now = chrono::Utc::now().naive_utc();
            let model = bookmark::ActiveModel {
                user_id: sea_orm::ActiveValue::Set(user_id),
                post_id: sea_orm::ActiveValue::Set(post_id),
                created_at: sea_orm::ActiveValue::Set(now),
                ..Default::default()
            };
            model.insert(&self.db).await?;
            Ok(true)
        }
    }

    /// The user's bookmarked posts, most recently bookmarked first.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let paginator = Bookmark::find()
            .filter(bookmark::Column::UserId.eq(user_id))
            .order_by_desc(bookmark::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let bookmarks = paginator.fetch_page(page.saturating_sub(1)).await?;

        let post_ids: Vec<i32> = bookmarks.iter().map(|b| b.post_id).collect();
        if post_ids.is_empty() {
            return Ok((vec![], total));
        }

        let posts = Post::find()
            .filter(post::Column::Id.is_in(post_ids.clone()))
            .all(&self.db)
            .await?;

        // Restore bookmark ordering
        let mut post_map: HashMap<i32, PostModel> =
            posts.into_iter().map(|p| (p.id, p)).collect();
        let ordered: Vec<PostModel> = post_ids
            .into_iter()
            .filter_map(|id| post_map.remove(&id))
            .collect();

        Ok((ordered, total))
    }
}
