use crate::error::{AppError, AppResult};
use crate::handlers::user::UserProfileResponse;
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::follow::FollowService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowToggleResponse {
    pub is_following: bool,
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/follow",
    security(("jwt_token" = [])),
    params(("user_id" = i32, Path, description = "User to follow/unfollow")),
    responses(
        (status = 200, description = "Follow toggled", body = FollowToggleResponse),
        (status = 400, description = "Cannot follow yourself", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "follows"
)]
pub async fn toggle_follow(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(user_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let follower_id = parse_user_id(&auth_user)?;

    let service = FollowService::new(db);
    let is_following = service.toggle(follower_id, user_id).await?;

    Ok(ApiResponse::ok(FollowToggleResponse { is_following }))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/followers",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Followers", body = PaginatedResponse<UserProfileResponse>),
    ),
    tag = "follows"
)]
pub async fn list_followers(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20).min(100);

    let service = FollowService::new(db);
    let (users, total) = service.list_followers(user_id, page, limit).await?;
    let items: Vec<UserProfileResponse> =
        users.into_iter().map(UserProfileResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/following",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Followed users", body = PaginatedResponse<UserProfileResponse>),
    ),
    tag = "follows"
)]
pub async fn list_following(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(20).min(100);

    let service = FollowService::new(db);
    let (users, total) = service.list_following(user_id, page, limit).await?;
    let items: Vec<UserProfileResponse> =
        users.into_iter().map(UserProfileResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}
