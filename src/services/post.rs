use crate::{
    error::{AppError, AppResult},
    models::{category, post, post_tag, user, Category, Post, PostModel, PostTag, UserModel},
    services::counts::CountService,
    utils::{derive_excerpt, sanitize_html, slugify},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Statement,
};
use std::collections::HashMap;

const POST_COLUMNS: &str = "p.id, p.author_id, p.category_id, p.title, p.slug, p.content, \
     p.excerpt, p.cover_image, p.views, p.status, p.is_pinned, p.is_locked, \
     p.comment_count, p.last_activity, p.created_at, p.updated_at";

#[derive(Debug, Default)]
pub struct PostFilters {
    pub category_slug: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

fn can_modify(post: &PostModel, actor: &UserModel) -> bool {
    post.author_id == actor.id || actor.role == user::ROLE_ADMIN
}

/// Trim, lowercase, drop empties, dedup preserving order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

pub struct PostService {
    db: DatabaseConnection,
}

impl PostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PostModel> {
        Post::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Fetch a post by slug for display, bumping its view counter.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<PostModel> {
        let mut found = Post::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE posts SET views = views + 1 WHERE id = $1",
                [found.id.into()],
            ))
            .await?;
        found.views += 1;

        Ok(found)
    }

    pub async fn create(
        &self,
        author_id: i32,
        category_id: i32,
        title: &str,
        content: &str,
        tags: Vec<String>,
        cover_image: Option<String>,
        status: Option<String>,
    ) -> AppResult<PostModel> {
        Category::find_by_id(category_id)
            .filter(category::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let status = status.unwrap_or_else(|| post::STATUS_PUBLISHED.to_string());
        if !post::STATUSES.contains(&status.as_str()) {
            return Err(AppError::Validation(format!("Invalid status '{status}'")));
        }

        let slug = self.unique_slug(title, None).await?;
        let content = sanitize_html(content);
        let excerpt = derive_excerpt(&content);
        let now = chrono::Utc::now().naive_utc();

        let new_post = post::ActiveModel {
            author_id: sea_orm::ActiveValue::Set(author_id),
            category_id: sea_orm::ActiveValue::Set(category_id),
            title: sea_orm::ActiveValue::Set(title.to_string()),
            slug: sea_orm::ActiveValue::Set(slug),
            content: sea_orm::ActiveValue::Set(content),
            excerpt: sea_orm::ActiveValue::Set(excerpt),
            cover_image: sea_orm::ActiveValue::Set(cover_image.unwrap_or_default()),
            views: sea_orm::ActiveValue::Set(0),
            status: sea_orm::ActiveValue::Set(status),
            is_pinned: sea_orm::ActiveValue::Set(false),
            is_locked: sea_orm::ActiveValue::Set(false),
            comment_count: sea_orm::ActiveValue::Set(0),
            last_activity: sea_orm::ActiveValue::Set(now),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_post.insert(&self.db).await?;
        self.replace_tags(created.id, tags).await?;

        let counts = CountService::new(self.db.clone());
        if let Err(e) = counts.bump_category_post_count(category_id, 1).await {
            tracing::warn!("Failed to bump post count for category {category_id}: {e}");
        }

        Ok(created)
    }

    pub async fn update(
        &self,
        id: i32,
        actor: &UserModel,
        changes: PostChanges,
    ) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        if !can_modify(&existing, actor) {
            return Err(AppError::Forbidden);
        }

        if let Some(status) = &changes.status {
            if !post::STATUSES.contains(&status.as_str()) {
                return Err(AppError::Validation(format!("Invalid status '{status}'")));
            }
        }
        if let Some(category_id) = changes.category_id {
            Category::find_by_id(category_id)
                .filter(category::Column::IsActive.eq(true))
                .one(&self.db)
                .await?
                .ok_or(AppError::NotFound)?;
        }

        let now = chrono::Utc::now().naive_utc();
        let post_id = existing.id;

        let mut active: post::ActiveModel = existing.into();
        if let Some(title) = &changes.title {
            let slug = self.unique_slug(title, Some(post_id)).await?;
            active.title = sea_orm::ActiveValue::Set(title.clone());
            active.slug = sea_orm::ActiveValue::Set(slug);
        }
        if let Some(content) = &changes.content {
            active.content = sea_orm::ActiveValue::Set(sanitize_html(content));
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = sea_orm::ActiveValue::Set(category_id);
        }
        if let Some(cover_image) = changes.cover_image {
            active.cover_image = sea_orm::ActiveValue::Set(cover_image);
        }
        if let Some(status) = changes.status {
            active.status = sea_orm::ActiveValue::Set(status);
        }
        active.last_activity = sea_orm::ActiveValue::Set(now);
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;

        if let Some(tags) = changes.tags {
            self.replace_tags(updated.id, tags).await?;
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: i32, actor: &UserModel) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if !can_modify(&existing, actor) {
            return Err(AppError::Forbidden);
        }

        let category_id = existing.category_id;
        Post::delete_by_id(id).exec(&self.db).await?;

        let counts = CountService::new(self.db.clone());
        if let Err(e) = counts.bump_category_post_count(category_id, -1).await {
            tracing::warn!("Failed to decrement post count for category {category_id}: {e}");
        }

        Ok(())
    }

    /// Published posts, filtered and sorted. Search delegates matching and
    /// ranking to Postgres full-text search; "most-liked" needs a live
    /// reactions join. Both go through raw SQL, everything else through the
    /// ORM paginator.
    pub async fn list(
        &self,
        filters: &PostFilters,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let category_id = match &filters.category_slug {
            Some(slug) => {
                // Unknown category slugs simply don't filter
                Category::find()
                    .filter(category::Column::Slug.eq(slug))
                    .one(&self.db)
                    .await?
                    .map(|c| c.id)
            }
            None => None,
        };

        if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
            return self
                .search(search, category_id, filters.tag.as_deref(), page, limit)
                .await;
        }

        let sort = filters.sort.as_deref().unwrap_or("newest");
        if sort == "most-liked" {
            return self
                .list_most_liked(category_id, filters.tag.as_deref(), page, limit)
                .await;
        }

        let mut query = Post::find().filter(post::Column::Status.eq(post::STATUS_PUBLISHED));

        if let Some(category_id) = category_id {
            query = query.filter(post::Column::CategoryId.eq(category_id));
        }
        if let Some(tag) = &filters.tag {
            let tagged = self.post_ids_with_tag(tag).await?;
            query = query.filter(post::Column::Id.is_in(tagged));
        }

        query = query.order_by_desc(post::Column::IsPinned);
        query = match sort {
            "oldest" => query.order_by_asc(post::Column::CreatedAt),
            "popular" => query
                .order_by_desc(post::Column::Views)
                .order_by_desc(post::Column::CreatedAt),
            "trending" => query.order_by_desc(post::Column::LastActivity),
            _ => query.order_by_desc(post::Column::CreatedAt),
        };

        let paginator = query.paginate(&self.db, limit);
        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((posts, total))
    }

    /// Trending: likes are weighted 3x, comments 5x, views 1x.
    pub async fn trending(&self, limit: u64) -> AppResult<Vec<PostModel>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             LEFT JOIN (\
                 SELECT target_id, COUNT(*) AS like_count FROM reactions \
                 WHERE target_type = 'post' AND value = 1 GROUP BY target_id\
             ) r ON r.target_id = p.id \
             WHERE p.status = 'published' \
             ORDER BY (COALESCE(r.like_count, 0) * 3 + p.views + p.comment_count * 5) DESC, \
                 p.created_at DESC \
             LIMIT $1"
        );

        let posts = PostModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &sql,
            vec![(limit as i64).into()],
        ))
        .all(&self.db)
        .await?;

        Ok(posts)
    }

    /// Published posts from authors the user follows, plus their own.
    pub async fn feed(
        &self,
        user_id: i32,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let follows = crate::models::Follow::find()
            .filter(crate::models::follow::Column::FollowerId.eq(user_id))
            .all(&self.db)
            .await?;

        let mut author_ids: Vec<i32> = follows.iter().map(|f| f.following_id).collect();
        author_ids.push(user_id);

        let paginator = Post::find()
            .filter(post::Column::AuthorId.is_in(author_ids))
            .filter(post::Column::Status.eq(post::STATUS_PUBLISHED))
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((posts, total))
    }

    /// A user's published posts, newest first.
    pub async fn list_by_author(
        &self,
        author_id: i32,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let paginator = Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .filter(post::Column::Status.eq(post::STATUS_PUBLISHED))
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((posts, total))
    }

    pub async fn toggle_pin(&self, id: i32) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        let mut active: post::ActiveModel = existing.clone().into();
        active.is_pinned = sea_orm::ActiveValue::Set(!existing.is_pinned);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn toggle_lock(&self, id: i32) -> AppResult<PostModel> {
        let existing = self.get_by_id(id).await?;
        let mut active: post::ActiveModel = existing.clone().into();
        active.is_locked = sea_orm::ActiveValue::Set(!existing.is_locked);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn tags_for_post(&self, post_id: i32) -> AppResult<Vec<String>> {
        let rows = PostTag::find()
            .filter(post_tag::Column::PostId.eq(post_id))
            .order_by_asc(post_tag::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.tag).collect())
    }

    /// Batch tag lookup for listings.
    pub async fn tags_for_posts(&self, post_ids: &[i32]) -> AppResult<HashMap<i32, Vec<String>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PostTag::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.to_vec()))
            .order_by_asc(post_tag::Column::Id)
            .all(&self.db)
            .await?;

        let mut grouped: HashMap<i32, Vec<String>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(row.tag);
        }
        Ok(grouped)
    }

    async fn search(
        &self,
        search: &str,
        category_id: Option<i32>,
        tag: Option<&str>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let offset = page.saturating_sub(1) * limit;

        let mut conditions = String::from(
            "p.search_vector @@ plainto_tsquery('english', $1) AND p.status = 'published'",
        );
        let mut values: Vec<sea_orm::Value> = vec![search.into()];

        if let Some(category_id) = category_id {
            values.push(category_id.into());
            conditions.push_str(&format!(" AND p.category_id = ${}", values.len()));
        }
        if let Some(tag) = tag {
            values.push(tag.to_lowercase().into());
            conditions.push_str(&format!(
                " AND p.id IN (SELECT post_id FROM post_tags WHERE tag = ${})",
                values.len()
            ));
        }

        let count_sql = format!("SELECT COUNT(*) AS count FROM posts p WHERE {conditions}");
        let count_result = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &count_sql,
                values.clone(),
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        let total: i64 = count_result.try_get_by_index(0)?;

        values.push((limit as i64).into());
        let limit_param = values.len();
        values.push((offset as i64).into());
        let offset_param = values.len();

        let search_sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             WHERE {conditions} \
             ORDER BY ts_rank(p.search_vector, plainto_tsquery('english', $1)) DESC, \
                 p.created_at DESC \
             LIMIT ${limit_param} OFFSET ${offset_param}"
        );

        let posts = PostModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &search_sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok((posts, total as u64))
    }

    async fn list_most_liked(
        &self,
        category_id: Option<i32>,
        tag: Option<&str>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<PostModel>, u64)> {
        let offset = page.saturating_sub(1) * limit;

        let mut conditions = String::from("p.status = 'published'");
        let mut values: Vec<sea_orm::Value> = vec![];

        if let Some(category_id) = category_id {
            values.push(category_id.into());
            conditions.push_str(&format!(" AND p.category_id = ${}", values.len()));
        }
        if let Some(tag) = tag {
            values.push(tag.to_lowercase().into());
            conditions.push_str(&format!(
                " AND p.id IN (SELECT post_id FROM post_tags WHERE tag = ${})",
                values.len()
            ));
        }

        let count_sql = format!("SELECT COUNT(*) AS count FROM posts p WHERE {conditions}");
        let count_result = self
            .db
            .query_one(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                &count_sql,
                values.clone(),
            ))
            .await?
            .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
        let total: i64 = count_result.try_get_by_index(0)?;

        values.push((limit as i64).into());
        let limit_param = values.len();
        values.push((offset as i64).into());
        let offset_param = values.len();

        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p \
             LEFT JOIN (\
                 SELECT target_id, COUNT(*) AS like_count FROM reactions \
                 WHERE target_type = 'post' AND value = 1 GROUP BY target_id\
             ) r ON r.target_id = p.id \
             WHERE {conditions} \
             ORDER BY p.is_pinned DESC, COALESCE(r.like_count, 0) DESC, p.created_at DESC \
             LIMIT ${limit_param} OFFSET ${offset_param}"
        );

        let posts = PostModel::find_by_statement(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            &sql,
            values,
        ))
        .all(&self.db)
        .await?;

        Ok((posts, total as u64))
    }

    async fn post_ids_with_tag(&self, tag: &str) -> AppResult<Vec<i32>> {
        let rows = PostTag::find()
            .filter(post_tag::Column::Tag.eq(tag.to_lowercase()))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|r| r.post_id).collect())
    }

    /// Derive a slug from the title, de-duplicating with a numeric suffix
    /// when another post already owns it.
    async fn unique_slug(&self, title: &str, exclude_id: Option<i32>) -> AppResult<String> {
        let base = slugify(title);
        let mut candidate = base.clone();
        let mut counter = 1;

        loop {
            let mut query = Post::find().filter(post::Column::Slug.eq(candidate.clone()));
            if let Some(exclude_id) = exclude_id {
                query = query.filter(post::Column::Id.ne(exclude_id));
            }

            if query.one(&self.db).await?.is_none() {
                return Ok(candidate);
            }

            candidate = format!("{base}-{counter}");
            counter += 1;
        }
    }

    async fn replace_tags(&self, post_id: i32, tags: Vec<String>) -> AppResult<()> {
        PostTag::delete_many()
            .filter(post_tag::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await?;

        for tag in normalize_tags(tags) {
            let model = post_tag::ActiveModel {
                post_id: sea_orm::ActiveValue::Set(post_id),
                tag: sea_orm::ActiveValue::Set(tag),
                ..Default::default()
            };
            model.insert(&self.db).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_lowercased_and_trimmed() {
        let tags = normalize_tags(vec![" Rust ".to_string(), "WebDev".to_string()]);
        assert_eq!(tags, vec!["rust", "webdev"]);
    }

    #[test]
    fn duplicate_tags_collapse() {
        let tags = normalize_tags(vec![
            "rust".to_string(),
            "RUST".to_string(),
            "rust ".to_string(),
        ]);
        assert_eq!(tags, vec!["rust"]);
    }

    #[test]
    fn empty_tags_dropped() {
        let tags = normalize_tags(vec!["".to_string(), "  ".to_string(), "ok".to_string()]);
        assert_eq!(tags, vec!["ok"]);
    }

    #[test]
    fn tag_order_preserved() {
        let tags = normalize_tags(vec!["b".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(tags, vec!["b", "a"]);
    }
}
