use crate::{
    error::AppError,
    models::{user, User, UserModel},
    utils::{
        cookie::{extract_cookie, TOKEN_COOKIE},
        jwt::decode_jwt,
    },
};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response, Extension};
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Statement};

/// Extracted user information from JWT token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// JWT authentication middleware.
///
/// Reads the token from the HttpOnly cookie (Bearer header as fallback),
/// verifies it, checks the account is still present and active, and stamps
/// the user's last_active.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_cookie(&headers, TOKEN_COOKIE)
        .or_else(|| extract_bearer_token(&headers))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID in token".to_string()))?;

    let found = User::find_by_id(user_id)
        .one(&db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !found.is_active {
        return Err(AppError::Forbidden);
    }

    // Presence bookkeeping; a failure here must not fail the request.
    let _ = db
        .execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE users SET last_active = NOW() WHERE id = $1",
            vec![user_id.into()],
        ))
        .await;

    let auth_user = AuthUser {
        user_id: claims.sub,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Parse user_id from AuthUser string to i32
pub fn parse_user_id(auth_user: &AuthUser) -> crate::error::AppResult<i32> {
    auth_user
        .user_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID".to_string()))
}

/// Load the authenticated user's full record.
pub async fn current_user(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
) -> crate::error::AppResult<UserModel> {
    let user_id = parse_user_id(auth_user)?;
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Verify the current user is an admin.
pub async fn require_admin(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
) -> crate::error::AppResult<UserModel> {
    let found = current_user(db, auth_user).await?;
    if found.role != user::ROLE_ADMIN {
        return Err(AppError::Forbidden);
    }
    Ok(found)
}

/// Verify the current user is a moderator or admin.
pub async fn require_moderator(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
) -> crate::error::AppResult<UserModel> {
    let found = current_user(db, auth_user).await?;
    if found.role != user::ROLE_ADMIN && found.role != user::ROLE_MODERATOR {
        return Err(AppError::Forbidden);
    }
    Ok(found)
}

/// Extractor for AuthUser from request extensions
use axum::extract::FromRequestParts;

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
