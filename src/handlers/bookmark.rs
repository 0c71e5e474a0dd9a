use crate::error::{AppError, AppResult};
use crate::handlers::post::{post_responses, PostResponse};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::bookmark::BookmarkService;
use crate::services::post::PostService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkToggleResponse {
    pub is_bookmarked: bool,
}

#[utoipa::path(
    post,
    path = "/api/users/bookmarks/{post_id}",
    security(("jwt_token" = [])),
    params(("post_id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Bookmark toggled", body = BookmarkToggleResponse),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "bookmarks"
)]
pub async fn toggle_bookmark(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(post_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = BookmarkService::new(db);
    let is_bookmarked = service.toggle(user_id, post_id).await?;

    Ok(ApiResponse::ok(BookmarkToggleResponse { is_bookmarked }))
}

#[utoipa::path(
    get,
    path = "/api/users/me/bookmarks",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Bookmarked posts", body = PaginatedResponse<PostResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "bookmarks"
)]
pub async fn list_bookmarks(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let service = BookmarkService::new(db.clone());
    let (posts, total) = service.list_for_user(user_id, page, limit).await?;

    let post_service = PostService::new(db);
    let items = post_responses(&post_service, posts).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}
