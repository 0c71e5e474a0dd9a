#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Once, OnceLock,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static CATEGORY_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Each spawn_app truncates the shared database, so tests within one binary
// must not interleave. The guard lives in TestApp and serializes them.
static TEST_LOCK: OnceLock<Arc<tokio::sync::Mutex<()>>> = OnceLock::new();

fn test_lock() -> Arc<tokio::sync::Mutex<()>> {
    TEST_LOCK
        .get_or_init(|| Arc::new(tokio::sync::Mutex::new(())))
        .clone()
}

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // The governor gets in the way of rapid-fire test requests
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = thinkify::config::jwt::JwtConfig::from_env().unwrap();
        let _ = thinkify::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let guard = test_lock().lock_owned().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        thinkify::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(thinkify::routes::create_routes())
        .layer(axum::middleware::from_fn(
            thinkify::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        _guard: guard,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "post_tags",
        "bookmarks",
        "follows",
        "reactions",
        "comments",
        "posts",
        "categories",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for user '{}': status={}, error={}",
            unique_username, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user id for '{}': {:?}", unique_username, body))
        as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token for '{}': {:?}", unique_username, body))
        .to_string();
    (user_id, token)
}

/// Promote a user to admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'admin' WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// Promote a user to moderator by directly updating the database.
pub async fn make_moderator(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'moderator' WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user moderator");
}

/// Create a category via the API (caller must pass an admin token).
/// Returns (category_id, slug).
pub async fn create_test_category(app: &TestApp, admin_token: &str) -> (i32, String) {
    let counter = CATEGORY_COUNTER.fetch_add(1, Ordering::SeqCst);

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Test Category {}", counter),
            "description": "A test category"
        }))
        .send()
        .await
        .expect("Failed to create category");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create category: status={}, body={}", status, body);
    }

    let id = body["data"]["id"].as_i64().expect("Response missing id") as i32;
    let slug = body["data"]["slug"]
        .as_str()
        .expect("Response missing slug")
        .to_string();
    (id, slug)
}

/// Create a published post and return (post_id, slug).
pub async fn create_test_post(
    app: &TestApp,
    token: &str,
    category_id: i32,
    title: &str,
) -> (i32, String) {
    let resp = app
        .client
        .post(app.url("/posts"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "content": "Some sufficiently long post content.",
            "categoryId": category_id
        }))
        .send()
        .await
        .expect("Failed to create post");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create post: status={}, body={}", status, body);
    }

    let id = body["data"]["id"].as_i64().expect("Response missing id") as i32;
    let slug = body["data"]["slug"]
        .as_str()
        .expect("Response missing slug")
        .to_string();
    (id, slug)
}

/// Create a comment (optionally a reply) and return its id.
pub async fn create_test_comment(
    app: &TestApp,
    token: &str,
    post_id: i32,
    parent_comment: Option<i32>,
    content: &str,
) -> i32 {
    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "postId": post_id,
            "parentComment": parent_comment,
            "content": content
        }))
        .send()
        .await
        .expect("Failed to create comment");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse response");

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create comment: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("Response missing id") as i32
}

/// Read a post's denormalized comment_count straight from the database.
pub async fn post_comment_count(db: &DatabaseConnection, post_id: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT comment_count FROM posts WHERE id = $1",
            vec![post_id.into()],
        ))
        .await
        .expect("Failed to query post")
        .expect("Post not found");
    row.try_get_by_index::<i32>(0).unwrap()
}

/// Read a comment's denormalized reply_count straight from the database.
pub async fn comment_reply_count(db: &DatabaseConnection, comment_id: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT reply_count FROM comments WHERE id = $1",
            vec![comment_id.into()],
        ))
        .await
        .expect("Failed to query comment")
        .expect("Comment not found");
    row.try_get_by_index::<i32>(0).unwrap()
}

/// Read a category's denormalized post_count straight from the database.
pub async fn category_post_count(db: &DatabaseConnection, category_id: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT post_count FROM categories WHERE id = $1",
            vec![category_id.into()],
        ))
        .await
        .expect("Failed to query category")
        .expect("Category not found");
    row.try_get_by_index::<i32>(0).unwrap()
}

/// Lock a post directly in the database (moderation shortcut for tests).
pub async fn lock_post(db: &DatabaseConnection, post_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE posts SET is_locked = TRUE WHERE id = $1",
        vec![post_id.into()],
    ))
    .await
    .expect("Failed to lock post");
}
