use crate::error::{AppError, AppResult};
use crate::middleware::auth::{current_user, parse_user_id};
use crate::middleware::AuthUser;
use crate::models::{user, CommentModel, User, UserModel};
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::comment::CommentService;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub post_id: i32,
    /// Id of the top-level comment being replied to, if any
    pub parent_comment: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// newest | oldest | popular
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&UserModel> for CommentAuthor {
    fn from(u: &UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            display_name: u.display_name.clone(),
            avatar: u.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub parent_comment: Option<i32>,
    pub content: String,
    pub status: String,
    pub is_edited: bool,
    pub edited_at: Option<String>,
    pub reply_count: i32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<CommentAuthor>,
    /// Preview of the oldest replies; the full list comes from the replies
    /// endpoint
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentResponse>,
}

// Hand-rolled: the derive can't express the recursive `replies` field.
impl utoipa::ToSchema for CommentResponse {
    fn name() -> std::borrow::Cow<'static, str> {
        "CommentResponse".into()
    }
}

impl utoipa::PartialSchema for CommentResponse {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        use utoipa::openapi::schema::{ArrayBuilder, ObjectBuilder, Schema, Type};
        use utoipa::PartialSchema;
        utoipa::openapi::RefOr::T(Schema::Object(
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .property("id", i32::schema())
                .property("postId", i32::schema())
                .property("authorId", i32::schema())
                .property("parentComment", Option::<i32>::schema())
                .property("content", String::schema())
                .property("status", String::schema())
                .property("isEdited", bool::schema())
                .property("editedAt", Option::<String>::schema())
                .property("replyCount", i32::schema())
                .property("createdAt", String::schema())
                .property("updatedAt", String::schema())
                .property("author", CommentAuthor::schema())
                .property(
                    "replies",
                    ArrayBuilder::new()
                        .items(utoipa::openapi::Ref::from_schema_name("CommentResponse"))
                        .build(),
                )
                .required("id")
                .required("postId")
                .required("authorId")
                .required("content")
                .required("status")
                .required("isEdited")
                .required("replyCount")
                .required("createdAt")
                .required("updatedAt")
                .build(),
        ))
    }
}

impl CommentResponse {
    fn from_model(c: CommentModel, author: Option<CommentAuthor>) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            parent_comment: c.parent_id,
            content: c.content,
            status: c.status,
            is_edited: c.is_edited,
            edited_at: c.edited_at.map(|t| t.to_string()),
            reply_count: c.reply_count,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
            author,
            replies: Vec::new(),
        }
    }
}

/// Batch-load the authors referenced by a set of comments.
async fn load_authors(
    db: &DatabaseConnection,
    comments: &[&CommentModel],
) -> AppResult<HashMap<i32, UserModel>> {
    let mut author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?;

    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

#[utoipa::path(
    post,
    path = "/api/comments",
    security(("jwt_token" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Post is locked", body = AppError),
        (status = 404, description = "Post or parent comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user_id = parse_user_id(&auth_user)?;

    let service = CommentService::new(db.clone());
    let created = service
        .create(
            payload.post_id,
            user_id,
            payload.parent_comment,
            &payload.content,
        )
        .await?;

    let authors = load_authors(&db, &[&created]).await?;
    let author = authors.get(&created.author_id).map(CommentAuthor::from);

    Ok(ApiResponse::with_message(
        CommentResponse::from_model(created, author),
        "Comment added successfully".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/comments/post/{post_id}",
    params(
        ("post_id" = i32, Path, description = "Post ID"),
        ("sort" = Option<String>, Query, description = "newest | oldest | popular"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Top-level comments with reply previews", body = PaginatedResponse<CommentResponse>),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_post_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<i32>,
    Query(params): Query<CommentListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20).min(100);
    let sort = params.sort.unwrap_or_else(|| "newest".to_string());

    let service = CommentService::new(db.clone());
    let (threads, total) = service.list_top_level(post_id, &sort, page, limit).await?;

    let all: Vec<&CommentModel> = threads
        .iter()
        .flat_map(|(parent, replies)| std::iter::once(parent).chain(replies.iter()))
        .collect();
    let authors = load_authors(&db, &all).await?;

    let items: Vec<CommentResponse> = threads
        .into_iter()
        .map(|(parent, replies)| {
            let author = authors.get(&parent.author_id).map(CommentAuthor::from);
            let mut response = CommentResponse::from_model(parent, author);
            response.replies = replies
                .into_iter()
                .map(|reply| {
                    let author = authors.get(&reply.author_id).map(CommentAuthor::from);
                    CommentResponse::from_model(reply, author)
                })
                .collect();
            response
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/comments/{comment_id}/replies",
    params(
        ("comment_id" = i32, Path, description = "Parent comment ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Replies, oldest first", body = PaginatedResponse<CommentResponse>),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_replies(
    Extension(db): Extension<DatabaseConnection>,
    Path(comment_id): Path<i32>,
    Query(params): Query<ReplyListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let service = CommentService::new(db.clone());
    let (replies, total) = service.list_replies(comment_id, page, limit).await?;

    let refs: Vec<&CommentModel> = replies.iter().collect();
    let authors = load_authors(&db, &refs).await?;

    let items: Vec<CommentResponse> = replies
        .into_iter()
        .map(|reply| {
            let author = authors.get(&reply.author_id).map(CommentAuthor::from);
            CommentResponse::from_model(reply, author)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let actor = current_user(&db, &auth_user).await?;

    let service = CommentService::new(db);
    let updated = service.update(id, &actor, &payload.content).await?;

    Ok(ApiResponse::ok(CommentResponse::from_model(updated, None)))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment soft-deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor = current_user(&db, &auth_user).await?;

    let service = CommentService::new(db);
    service.soft_delete(id, &actor).await?;

    Ok(ApiResponse::ok("Comment deleted successfully"))
}
