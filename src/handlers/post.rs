use crate::error::{AppError, AppResult};
use crate::middleware::auth::{current_user, parse_user_id, require_moderator};
use crate::middleware::AuthUser;
use crate::models::{PostModel, User};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::category::CategoryService;
use crate::services::post::{PostChanges, PostFilters, PostService};
use crate::services::reaction::{ReactionKind, ReactionService};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 5, max = 200))]
    pub title: String,
    #[validate(length(min = 10))]
    pub content: String,
    pub category_id: i32,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 5, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 10))]
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrendingQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i32,
    pub author_id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub tags: Vec<String>,
    pub views: i32,
    pub status: String,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub comment_count: i32,
    pub last_activity: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PostResponse {
    fn from_model(p: PostModel, tags: Vec<String>) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            category_id: p.category_id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            excerpt: p.excerpt,
            cover_image: p.cover_image,
            tags,
            views: p.views,
            status: p.status,
            is_pinned: p.is_pinned,
            is_locked: p.is_locked,
            comment_count: p.comment_count,
            last_activity: p.last_activity.to_string(),
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
        }
    }
}

/// Full post page payload: the post plus its author, category, and live
/// reaction counts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author: crate::handlers::user::UserProfileResponse,
    pub category: crate::handlers::category::CategoryResponse,
    pub like_count: u64,
    pub dislike_count: u64,
}

/// Batch-resolve tags so listings don't issue one query per post.
pub async fn post_responses(
    service: &PostService,
    posts: Vec<PostModel>,
) -> AppResult<Vec<PostResponse>> {
    let ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut tags = service.tags_for_posts(&ids).await?;

    Ok(posts
        .into_iter()
        .map(|p| {
            let post_tags = tags.remove(&p.id).unwrap_or_default();
            PostResponse::from_model(p, post_tags)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("category" = Option<String>, Query, description = "Category slug filter"),
        ("tag" = Option<String>, Query, description = "Tag filter"),
        ("search" = Option<String>, Query, description = "Full-text search query"),
        ("sort" = Option<String>, Query, description = "newest | oldest | popular | trending | most-liked"),
    ),
    responses(
        (status = 200, description = "Published posts", body = PaginatedResponse<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PostListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let filters = PostFilters {
        category_slug: params.category,
        tag: params.tag,
        search: params.search,
        sort: params.sort,
    };

    let service = PostService::new(db);
    let (posts, total) = service.list(&filters, page, limit).await?;
    let items = post_responses(&service, posts).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/posts/trending",
    params(("limit" = Option<u64>, Query, description = "Max posts to return")),
    responses(
        (status = 200, description = "Trending posts", body = Vec<PostResponse>),
    ),
    tag = "posts"
)]
pub async fn trending_posts(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(5).min(20);

    let service = PostService::new(db);
    let posts = service.trending(limit).await?;
    let items = post_responses(&service, posts).await?;

    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/posts/feed",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Posts from followed authors", body = PaginatedResponse<PostResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_feed(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let service = PostService::new(db);
    let (posts, total) = service.feed(user_id, page, limit).await?;
    let items = post_responses(&service, posts).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post detail", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn get_post(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db.clone());
    let post = service.get_by_slug(&slug).await?;

    let author = User::find_by_id(post.author_id)
        .one(&db)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = CategoryService::new(db.clone()).get_by_id(post.category_id).await?;

    let reactions = ReactionService::new(db);
    let like_count = reactions
        .count(crate::models::reaction::TARGET_POST, post.id, ReactionKind::Like)
        .await?;
    let dislike_count = reactions
        .count(crate::models::reaction::TARGET_POST, post.id, ReactionKind::Dislike)
        .await?;

    let tags = service.tags_for_post(post.id).await?;

    Ok(ApiResponse::ok(PostDetailResponse {
        post: PostResponse::from_model(post, tags),
        author: crate::handlers::user::UserProfileResponse::from(author),
        category: crate::handlers::category::CategoryResponse::from(category),
        like_count,
        dislike_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    security(("jwt_token" = [])),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Post created", body = PostResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;

    let service = PostService::new(db);
    let created = service
        .create(
            user_id,
            payload.category_id,
            &payload.title,
            &payload.content,
            payload.tags.unwrap_or_default(),
            payload.cover_image,
            payload.status,
        )
        .await?;

    let tags = service.tags_for_post(created.id).await?;
    Ok(ApiResponse::ok(PostResponse::from_model(created, tags)))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn update_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let actor = current_user(&db, &auth_user).await?;

    let changes = PostChanges {
        title: payload.title,
        content: payload.content,
        category_id: payload.category_id,
        tags: payload.tags,
        cover_image: payload.cover_image,
        status: payload.status,
    };

    let service = PostService::new(db);
    let updated = service.update(id, &actor, changes).await?;
    let tags = service.tags_for_post(updated.id).await?;

    Ok(ApiResponse::ok(PostResponse::from_model(updated, tags)))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn delete_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = current_user(&db, &auth_user).await?;

    let service = PostService::new(db);
    service.delete(id, &actor).await?;

    Ok(ApiResponse::ok("Post deleted"))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}/pin",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Pin toggled", body = PostResponse),
        (status = 403, description = "Moderator only", body = AppError),
    ),
    tag = "posts"
)]
pub async fn pin_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let service = PostService::new(db);
    let updated = service.toggle_pin(id).await?;
    let tags = service.tags_for_post(updated.id).await?;

    Ok(ApiResponse::ok(PostResponse::from_model(updated, tags)))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}/lock",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Lock toggled", body = PostResponse),
        (status = 403, description = "Moderator only", body = AppError),
    ),
    tag = "posts"
)]
pub async fn lock_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_moderator(&db, &auth_user).await?;

    let service = PostService::new(db);
    let updated = service.toggle_lock(id).await?;
    let tags = service.tags_for_post(updated.id).await?;

    Ok(ApiResponse::ok(PostResponse::from_model(updated, tags)))
}
