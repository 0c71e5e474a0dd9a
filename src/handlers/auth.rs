use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::utils::cookie::{build_auth_cookie, build_clear_cookie, TOKEN_COOKIE};
use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-30 characters, letters/numbers/underscores)
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 6 characters)
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// JWT, also set as an HttpOnly cookie
    pub token: String,
    pub user: CurrentUserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub reputation: i32,
    pub preferences: PreferencesResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub email_notifications: bool,
    pub dark_mode: bool,
    pub show_online_status: bool,
}

impl From<UserModel> for CurrentUserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            display_name: u.display_name,
            bio: u.bio,
            avatar: u.avatar,
            role: u.role,
            reputation: u.reputation,
            preferences: PreferencesResponse {
                email_notifications: u.email_notifications,
                dark_mode: u.dark_mode,
                show_online_status: u.show_online_status,
            },
        }
    }
}

fn set_auth_cookie(response: &mut Response, token: &str) -> AppResult<()> {
    let cookie = build_auth_cookie(
        TOKEN_COOKIE,
        token,
        crate::utils::jwt::token_expiry_seconds(),
    );
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate field", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let (created, token) = service
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    let body = AuthResponse {
        token: token.clone(),
        user: CurrentUserResponse::from(created),
    };

    let mut response =
        ApiResponse::with_message(body, "Registration successful".to_string()).into_response();
    set_auth_cookie(&mut response, &token)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (found, token) = service.login(&payload.email, &payload.password).await?;

    let body = AuthResponse {
        token: token.clone(),
        user: CurrentUserResponse::from(found),
    };

    let mut response = ApiResponse::ok(body).into_response();
    set_auth_cookie(&mut response, &token)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Logged out", body = String),
    ),
    tag = "auth"
)]
pub async fn logout(_auth_user: AuthUser) -> AppResult<impl IntoResponse> {
    let mut response = ApiResponse::ok("Logged out").into_response();
    let value = HeaderValue::from_str(&build_clear_cookie(TOKEN_COOKIE))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = AuthService::new(db);
    let found = service.get_user_by_id(user_id).await?;

    Ok(ApiResponse::ok(CurrentUserResponse::from(found)))
}
