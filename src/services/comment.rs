use crate::{
    error::{AppError, AppResult},
    models::{comment, user, Comment, CommentModel, Post, UserModel},
    services::counts::CountService,
    utils::sanitize_html,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, Statement,
};
use std::collections::HashMap;

/// How many replies ride along with each top-level comment in a listing;
/// the full thread is paged separately via list_replies.
const REPLY_PREVIEW_LIMIT: usize = 3;

pub struct CommentService {
    db: DatabaseConnection,
}

fn can_modify(comment: &CommentModel, actor: &UserModel) -> bool {
    comment.author_id == actor.id || actor.role == user::ROLE_ADMIN
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Create a top-level comment or a reply.
    ///
    /// Replies attach only to top-level comments: a parent that itself has a
    /// parent is rejected rather than silently re-parented, so the thread
    /// shape stays exactly two levels deep.
    pub async fn create(
        &self,
        post_id: i32,
        author_id: i32,
        parent_id: Option<i32>,
        content: &str,
    ) -> AppResult<CommentModel> {
        let post = Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if post.is_locked {
            return Err(AppError::Locked);
        }

        if let Some(pid) = parent_id {
            self.validate_parent(pid, post_id).await?;
        }

        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            post_id: sea_orm::ActiveValue::Set(post_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            parent_id: sea_orm::ActiveValue::Set(parent_id),
            content: sea_orm::ActiveValue::Set(sanitize_html(content)),
            status: sea_orm::ActiveValue::Set(comment::STATUS_ACTIVE.to_string()),
            is_edited: sea_orm::ActiveValue::Set(false),
            reply_count: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_comment.insert(&self.db).await?;
        self.sync_derived_counts(&created).await;
        Ok(created)
    }

    /// Edit comment content. Author or admin only; a soft-deleted comment is
    /// gone for mutation purposes.
    pub async fn update(&self, id: i32, actor: &UserModel, content: &str) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;

        if existing.status == comment::STATUS_DELETED {
            return Err(AppError::NotFound);
        }
        if !can_modify(&existing, actor) {
            return Err(AppError::Forbidden);
        }

        let now = chrono::Utc::now().naive_utc();

        let mut active: comment::ActiveModel = existing.into();
        active.content = sea_orm::ActiveValue::Set(sanitize_html(content));
        active.is_edited = sea_orm::ActiveValue::Set(true);
        active.edited_at = sea_orm::ActiveValue::Set(Some(now));
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        self.sync_derived_counts(&updated).await;
        Ok(updated)
    }

    /// Soft delete: status flips to deleted and the content is replaced with
    /// a placeholder. The row stays, so reply threads keep their shape and
    /// ids stay stable. One-directional; there is no restore.
    pub async fn soft_delete(&self, id: i32, actor: &UserModel) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;

        if !can_modify(&existing, actor) {
            return Err(AppError::Forbidden);
        }

        let now = chrono::Utc::now().naive_utc();

        let mut active: comment::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(comment::STATUS_DELETED.to_string());
        active.content = sea_orm::ActiveValue::Set(comment::DELETED_PLACEHOLDER.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let deleted = active.update(&self.db).await?;
        self.sync_derived_counts(&deleted).await;
        Ok(())
    }

    /// Page through a post's active top-level comments, each carrying up to
    /// REPLY_PREVIEW_LIMIT of its oldest active replies.
    pub async fn list_top_level(
        &self,
        post_id: i32,
        sort: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<(CommentModel, Vec<CommentModel>)>, u64)> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let filter = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::ParentId.is_null())
            .filter(comment::Column::Status.eq(comment::STATUS_ACTIVE));

        let total = filter.clone().count(&self.db).await?;

        let comments = match sort {
            "popular" => self.fetch_popular_page(post_id, page, limit).await?,
            "oldest" => {
                filter
                    .order_by_asc(comment::Column::CreatedAt)
                    .paginate(&self.db, limit)
                    .fetch_page(page.saturating_sub(1))
                    .await?
            }
            _ => {
                // "newest" (default)
                filter
                    .order_by_desc(comment::Column::CreatedAt)
                    .paginate(&self.db, limit)
                    .fetch_page(page.saturating_sub(1))
                    .await?
            }
        };

        let with_previews = self.attach_reply_previews(comments).await?;
        Ok((with_previews, total))
    }

    /// Replies of one top-level comment, oldest first (chronological reading
    /// order), paged independently of the parent listing.
    pub async fn list_replies(
        &self,
        parent_id: i32,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<CommentModel>, u64)> {
        self.get_by_id(parent_id).await?;

        let paginator = Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .filter(comment::Column::Status.eq(comment::STATUS_ACTIVE))
            .order_by_asc(comment::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let replies = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((replies, total))
    }

    /// "popular" orders by live like count (reactions are never denormalized
    /// onto comments), so it needs a join the ORM paginator can't express.
    async fn fetch_popular_page(
        &self,
        post_id: i32,
        page: u64,
        limit: u64,
    ) -> AppResult<Vec<CommentModel>> {
        let offset = page.saturating_sub(1) * limit;

        let sql = "SELECT c.id, c.post_id, c.author_id, c.parent_id, c.content, c.status, \
                c.is_edited, c.edited_at, c.reply_count, c.created_at, c.updated_at \
                FROM comments c \
                LEFT JOIN (\
                    SELECT target_id, COUNT(*) AS like_count FROM reactions \
                    WHERE target_type = 'comment' AND value = 1 GROUP BY target_id\
                ) r ON r.target_id = c.id \
                WHERE c.post_id = $1 AND c.parent_id IS NULL AND c.status = 'active' \
                ORDER BY COALESCE(r.like_count, 0) DESC, c.created_at DESC \
                LIMIT $2 OFFSET $3";

        let comments = CommentModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            vec![
                post_id.into(),
                (limit as i64).into(),
                (offset as i64).into(),
            ],
        ))
        .all(&self.db)
        .await?;

        Ok(comments)
    }

    async fn attach_reply_previews(
        &self,
        comments: Vec<CommentModel>,
    ) -> AppResult<Vec<(CommentModel, Vec<CommentModel>)>> {
        let parent_ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        let replies = Comment::find()
            .filter(comment::Column::ParentId.is_in(parent_ids))
            .filter(comment::Column::Status.eq(comment::STATUS_ACTIVE))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut previews = group_previews(replies);
        Ok(comments
            .into_iter()
            .map(|c| {
                let replies = previews.remove(&c.id).unwrap_or_default();
                (c, replies)
            })
            .collect())
    }

    async fn validate_parent(&self, parent_id: i32, post_id: i32) -> AppResult<()> {
        let parent = Comment::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if parent.post_id != post_id {
            return Err(AppError::Validation(
                "Parent comment belongs to a different post".to_string(),
            ));
        }

        if parent.parent_id.is_some() {
            return Err(AppError::Validation(
                "Cannot reply to a reply; reply to the top-level comment instead".to_string(),
            ));
        }

        Ok(())
    }

    /// Recompute the counters this write may have invalidated. The comment
    /// itself is already persisted; a failed recount leaves a stale counter
    /// until the next comment write, which is acceptable since these columns are
    /// non-authoritative.
    async fn sync_derived_counts(&self, written: &CommentModel) {
        let counts = CountService::new(self.db.clone());

        if let Err(e) = counts.refresh_post_comment_count(written.post_id).await {
            tracing::warn!(
                "Failed to refresh comment count for post {}: {e}",
                written.post_id
            );
        }

        if let Some(parent_id) = written.parent_id {
            if let Err(e) = counts.refresh_reply_count(parent_id).await {
                tracing::warn!("Failed to refresh reply count for comment {parent_id}: {e}");
            }
        }
    }
}

/// Group replies by parent, keeping only the first REPLY_PREVIEW_LIMIT per
/// parent. Input must already be in preview order (oldest first).
fn group_previews(replies: Vec<CommentModel>) -> HashMap<i32, Vec<CommentModel>> {
    let mut grouped: HashMap<i32, Vec<CommentModel>> = HashMap::new();
    for reply in replies {
        let Some(parent_id) = reply.parent_id else {
            continue;
        };
        let bucket = grouped.entry(parent_id).or_default();
        if bucket.len() < REPLY_PREVIEW_LIMIT {
            bucket.push(reply);
        }
    }
    grouped
}
