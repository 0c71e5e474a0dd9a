mod common;

use serde_json::Value;

async fn setup(app: &common::TestApp) -> (String, i32) {
    let (user_id, token) = common::create_test_user(app, "reactor").await;
    common::make_admin(&app.db, user_id).await;
    let (category_id, _) = common::create_test_category(app, &token).await;
    let (post_id, _) = common::create_test_post(app, &token, category_id, "Reaction Test Post").await;
    (token, post_id)
}

async fn toggle(app: &common::TestApp, token: &str, path: &str) -> Value {
    let resp = app
        .client
        .post(app.url(path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "toggle {path} failed");
    resp.json().await.unwrap()
}

#[tokio::test]
async fn like_toggles_on_and_off() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likeCount"], 1);

    // Second call flips back to the original state
    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likeCount"], 0);
}

#[tokio::test]
async fn like_then_dislike_is_mutually_exclusive() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["likeCount"], 1);

    // Disliking replaces the like: one row per (user, target)
    let body = toggle(&app, &token, &format!("/posts/{}/dislike", post_id)).await;
    assert_eq!(body["data"]["disliked"], true);
    assert_eq!(body["data"]["dislikeCount"], 1);

    // Liking again replaces the dislike; the count proves the like was gone
    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likeCount"], 1);

    let row = sea_orm::ConnectionTrait::query_one(
        &app.db,
        sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM reactions WHERE target_type = 'post' AND target_id = $1",
            vec![post_id.into()],
        ),
    )
    .await
    .unwrap()
    .unwrap();
    let total: i64 = row.try_get_by_index(0).unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn two_users_like_independently() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;
    let (_other_id, other_token) = common::create_test_user(&app, "other_reactor").await;

    toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    let body = toggle(&app, &other_token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["likeCount"], 2);

    // One user un-liking doesn't touch the other's reaction
    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likeCount"], 1);
}

#[tokio::test]
async fn comment_likes_toggle() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let comment_id = common::create_test_comment(&app, &token, post_id, None, "Like me").await;

    let body = toggle(&app, &token, &format!("/comments/{}/like", comment_id)).await;
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likeCount"], 1);

    let body = toggle(&app, &token, &format!("/comments/{}/like", comment_id)).await;
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likeCount"], 0);
}

#[tokio::test]
async fn liking_comments_of_a_locked_post_is_rejected() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let comment_id = common::create_test_comment(&app, &token, post_id, None, "Frozen").await;
    common::lock_post(&app.db, post_id).await;

    let resp = app
        .client
        .post(app.url(&format!("/comments/{}/like", comment_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn liking_a_missing_target_is_not_found() {
    let app = common::spawn_app().await;
    let (token, _post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url("/posts/999999/like"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .post(app.url("/comments/999999/like"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn reactions_require_authentication() {
    let app = common::spawn_app().await;
    let (_token, post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/like", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn self_like_is_permitted() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    // The author liking their own post is allowed
    let body = toggle(&app, &token, &format!("/posts/{}/like", post_id)).await;
    assert_eq!(body["data"]["liked"], true);
}
