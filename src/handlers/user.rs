use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::post::PostService;
use crate::services::user::{ProfileChanges, UserService};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of a user: no email, no preferences.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub reputation: i32,
    pub last_active: String,
    pub created_at: String,
}

impl From<UserModel> for UserProfileResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            bio: u.bio,
            avatar: u.avatar,
            role: u.role,
            reputation: u.reputation,
            last_active: u.last_active.to_string(),
            created_at: u.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetailResponse {
    #[serde(flatten)]
    pub user: UserProfileResponse,
    pub post_count: u64,
    pub follower_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub preferences: Option<PreferencesRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub email_notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub show_online_status: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserSearchQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = ProfileDetailResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(username): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let profile = service.get_profile(&username).await?;

    Ok(ApiResponse::ok(ProfileDetailResponse {
        user: UserProfileResponse::from(profile.user),
        post_count: profile.post_count,
        follower_count: profile.follower_count,
        following_count: profile.following_count,
    }))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfileResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let changes = ProfileChanges {
        display_name: payload.display_name,
        bio: payload.bio,
        avatar: payload.avatar,
        email_notifications: payload
            .preferences
            .as_ref()
            .and_then(|p| p.email_notifications),
        dark_mode: payload.preferences.as_ref().and_then(|p| p.dark_mode),
        show_online_status: payload
            .preferences
            .as_ref()
            .and_then(|p| p.show_online_status),
    };

    let service = UserService::new(db);
    let updated = service.update_profile(user_id, changes).await?;

    Ok(ApiResponse::ok(UserProfileResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/api/users/{username}/posts",
    params(
        ("username" = String, Path, description = "Username"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "User's published posts", body = PaginatedResponse<crate::handlers::post::PostResponse>),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_posts(
    Extension(db): Extension<DatabaseConnection>,
    Path(username): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let users = UserService::new(db.clone());
    let found = users.get_by_username(&username).await?;

    let posts = PostService::new(db);
    let (page_items, total) = posts.list_by_author(found.id, page, limit).await?;
    let items = crate::handlers::post::post_responses(&posts, page_items).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/users/search",
    params(
        ("q" = String, Query, description = "Search query (min 2 characters)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Matching users", body = PaginatedResponse<UserProfileResponse>),
        (status = 400, description = "Query too short", body = AppError),
    ),
    tag = "users"
)]
pub async fn search_users(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<UserSearchQuery>,
) -> AppResult<impl IntoResponse> {
    let query = params.q.unwrap_or_default();
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10).min(100);

    let service = UserService::new(db);
    let (users, total) = service.search(&query, page, limit).await?;
    let items: Vec<UserProfileResponse> =
        users.into_iter().map(UserProfileResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}
