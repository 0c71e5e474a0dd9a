use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::reaction::{TARGET_COMMENT, TARGET_POST};
use crate::response::ApiResponse;
use crate::services::reaction::{ReactionKind, ReactionService};
use axum::{extract::Path, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DislikeToggleResponse {
    pub disliked: bool,
    pub dislike_count: u64,
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn like_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = ReactionService::new(db);
    let toggle = service
        .toggle(user_id, TARGET_POST, id, ReactionKind::Like)
        .await?;

    Ok(ApiResponse::ok(LikeToggleResponse {
        liked: toggle.active,
        like_count: toggle.count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/dislike",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Dislike toggled", body = DislikeToggleResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Post not found", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn dislike_post(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = ReactionService::new(db);
    let toggle = service
        .toggle(user_id, TARGET_POST, id, ReactionKind::Dislike)
        .await?;

    Ok(ApiResponse::ok(DislikeToggleResponse {
        disliked: toggle.active,
        dislike_count: toggle.count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/comments/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 403, description = "Post is locked", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn like_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = ReactionService::new(db);
    let toggle = service
        .toggle(user_id, TARGET_COMMENT, id, ReactionKind::Like)
        .await?;

    Ok(ApiResponse::ok(LikeToggleResponse {
        liked: toggle.active,
        like_count: toggle.count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/comments/{id}/dislike",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Dislike toggled", body = DislikeToggleResponse),
        (status = 403, description = "Post is locked", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn dislike_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = ReactionService::new(db);
    let toggle = service
        .toggle(user_id, TARGET_COMMENT, id, ReactionKind::Dislike)
        .await?;

    Ok(ApiResponse::ok(DislikeToggleResponse {
        disliked: toggle.active,
        dislike_count: toggle.count,
    }))
}
