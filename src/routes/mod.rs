use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Anonymous account endpoints, throttled hardest.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::auth::register))
        .route("/auth/login", routing::post(handlers::auth::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public reads: profiles, categories, posts, comment threads.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Users
        .route("/users/search", routing::get(handlers::user::search_users))
        .route(
            "/users/{username}",
            routing::get(handlers::user::get_user_profile),
        )
        .route(
            "/users/{username}/posts",
            routing::get(handlers::user::get_user_posts),
        )
        .route(
            "/users/{user_id}/followers",
            routing::get(handlers::follow::list_followers),
        )
        .route(
            "/users/{user_id}/following",
            routing::get(handlers::follow::list_following),
        )
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        .route(
            "/categories/{slug}",
            routing::get(handlers::category::get_category),
        )
        // Posts
        .route("/posts", routing::get(handlers::post::list_posts))
        .route(
            "/posts/trending",
            routing::get(handlers::post::trending_posts),
        )
        .route("/posts/{id}", routing::get(handlers::post::get_post))
        // Comments
        .route(
            "/comments/post/{post_id}",
            routing::get(handlers::comment::list_post_comments),
        )
        .route(
            "/comments/{id}/replies",
            routing::get(handlers::comment::list_replies),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Authenticated writes (and the personalized feed).
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/logout", routing::post(handlers::auth::logout))
        .route("/auth/me", routing::get(handlers::auth::get_current_user))
        // Users
        .route(
            "/users/profile",
            routing::put(handlers::user::update_profile),
        )
        .route(
            "/users/{user_id}/follow",
            routing::post(handlers::follow::toggle_follow),
        )
        .route(
            "/users/me/bookmarks",
            routing::get(handlers::bookmark::list_bookmarks),
        )
        .route(
            "/users/bookmarks/{post_id}",
            routing::post(handlers::bookmark::toggle_bookmark),
        )
        // Categories (admin checked in handlers)
        .route(
            "/categories",
            routing::post(handlers::category::create_category),
        )
        .route(
            "/categories/{slug}",
            routing::put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        // Posts
        .route("/posts", routing::post(handlers::post::create_post))
        .route("/posts/feed", routing::get(handlers::post::get_feed))
        .route(
            "/posts/{id}",
            routing::put(handlers::post::update_post).delete(handlers::post::delete_post),
        )
        .route("/posts/{id}/pin", routing::put(handlers::post::pin_post))
        .route("/posts/{id}/lock", routing::put(handlers::post::lock_post))
        .route(
            "/posts/{id}/like",
            routing::post(handlers::reaction::like_post),
        )
        .route(
            "/posts/{id}/dislike",
            routing::post(handlers::reaction::dislike_post),
        )
        // Comments
        .route(
            "/comments",
            routing::post(handlers::comment::create_comment),
        )
        .route(
            "/comments/{id}",
            routing::put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        .route(
            "/comments/{id}/like",
            routing::post(handlers::reaction::like_comment),
        )
        .route(
            "/comments/{id}/dislike",
            routing::post(handlers::reaction::dislike_comment),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
