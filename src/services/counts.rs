use crate::{
    error::AppResult,
    models::{comment, Comment},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Statement,
};

/// Maintains the denormalized counters: `posts.comment_count`,
/// `comments.reply_count` and `categories.post_count`. These columns are
/// write-only outputs of this service; nothing else in the crate sets them.
///
/// Comment and reply counts are full recounts rather than increments: an
/// extra read per write, but a missed or double-applied update cannot leave
/// the counter drifted. Category post_count is a plain increment since
/// per-category post volume is low. None of this runs inside the triggering
/// write's transaction; callers log failures and move on.
pub struct CountService {
    db: DatabaseConnection,
}

impl CountService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recount active top-level comments for a post and stamp its
    /// last_activity in the same write.
    pub async fn refresh_post_comment_count(&self, post_id: i32) -> AppResult<()> {
        let count = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::Status.eq(comment::STATUS_ACTIVE))
            .count(&self.db)
            .await?;

        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE posts SET comment_count = $1, last_activity = NOW() WHERE id = $2",
                vec![(count as i32).into(), post_id.into()],
            ))
            .await?;

        Ok(())
    }

    /// Recount active replies for a top-level comment.
    pub async fn refresh_reply_count(&self, parent_id: i32) -> AppResult<()> {
        let count = Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .filter(comment::Column::Status.eq(comment::STATUS_ACTIVE))
            .count(&self.db)
            .await?;

        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE comments SET reply_count = $1 WHERE id = $2",
                vec![(count as i32).into(), parent_id.into()],
            ))
            .await?;

        Ok(())
    }

    /// Adjust a category's post count by +1/-1, clamped at zero.
    pub async fn bump_category_post_count(&self, category_id: i32, delta: i32) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE categories SET post_count = GREATEST(post_count + $1, 0) WHERE id = $2",
                vec![delta.into(), category_id.into()],
            ))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Counter writes themselves are exercised in tests/comment_test.rs and
    // tests/post_test.rs against a real database; here we pin down the
    // clamping arithmetic the SQL relies on.

    fn clamped(current: i32, delta: i32) -> i32 {
        (current + delta).max(0)
    }

    #[test]
    fn increment_from_zero() {
        assert_eq!(clamped(0, 1), 1);
    }

    #[test]
    fn decrement_clamps_at_zero() {
        assert_eq!(clamped(0, -1), 0);
    }

    #[test]
    fn decrement_normal() {
        assert_eq!(clamped(5, -1), 4);
    }
}
