mod common;

use serde_json::Value;

/// Register an author, create a category and a post to comment on.
/// Returns (token, post_id).
async fn setup(app: &common::TestApp) -> (String, i32) {
    let (user_id, token) = common::create_test_user(app, "commenter").await;
    common::make_admin(&app.db, user_id).await;
    let (category_id, _slug) = common::create_test_category(app, &token).await;
    let (post_id, _slug) = common::create_test_post(app, &token, category_id, "Comment Test Post").await;
    (token, post_id)
}

#[tokio::test]
async fn comment_count_tracks_active_top_level_comments() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let id =
            common::create_test_comment(&app, &token, post_id, None, &format!("Comment {i}"))
                .await;
        ids.push(id);
    }
    assert_eq!(common::post_comment_count(&app.db, post_id).await, 3);

    // Soft-delete one; the recount drops to N-1
    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", ids[0])))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(common::post_comment_count(&app.db, post_id).await, 2);
}

#[tokio::test]
async fn reply_count_tracks_active_replies() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "Parent").await;

    let mut reply_ids = Vec::new();
    for i in 0..2 {
        let id = common::create_test_comment(
            &app,
            &token,
            post_id,
            Some(parent),
            &format!("Reply {i}"),
        )
        .await;
        reply_ids.push(id);
    }
    assert_eq!(common::comment_reply_count(&app.db, parent).await, 2);

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", reply_ids[0])))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(common::comment_reply_count(&app.db, parent).await, 1);
}

#[tokio::test]
async fn replies_do_not_count_toward_post_comment_count() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    // C1 top-level, C2 reply to C1, C3 top-level
    let c1 = common::create_test_comment(&app, &token, post_id, None, "C1").await;
    let c2 = common::create_test_comment(&app, &token, post_id, Some(c1), "C2").await;
    let _c3 = common::create_test_comment(&app, &token, post_id, None, "C3").await;

    assert_eq!(common::post_comment_count(&app.db, post_id).await, 2);
    assert_eq!(common::comment_reply_count(&app.db, c1).await, 1);

    // Deleting the reply drops replyCount but leaves commentCount alone
    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", c2)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(common::comment_reply_count(&app.db, c1).await, 0);
    assert_eq!(common::post_comment_count(&app.db, post_id).await, 2);
}

#[tokio::test]
async fn locked_post_rejects_new_comments() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    common::create_test_comment(&app, &token, post_id, None, "Before lock").await;
    common::lock_post(&app.db, post_id).await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "postId": post_id,
            "content": "After lock"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Rejected before any write: the count is untouched
    assert_eq!(common::post_comment_count(&app.db, post_id).await, 1);
}

#[tokio::test]
async fn reply_to_a_reply_is_rejected() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "Top").await;
    let reply = common::create_test_comment(&app, &token, post_id, Some(parent), "Reply").await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "postId": post_id,
            "parentComment": reply,
            "content": "Grandchild"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn parent_comment_must_belong_to_same_post() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "On post 1").await;

    let (user_id, other_token) = common::create_test_user(&app, "otherposter").await;
    common::make_admin(&app.db, user_id).await;
    let (category_id, _) = common::create_test_category(&app, &other_token).await;
    let (other_post, _) =
        common::create_test_post(&app, &other_token, category_id, "Another Post").await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "postId": other_post,
            "parentComment": parent,
            "content": "Cross-post reply"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn soft_deleted_comments_vanish_from_listings() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let keep = common::create_test_comment(&app, &token, post_id, None, "Keep me").await;
    let remove = common::create_test_comment(&app, &token, post_id, None, "Remove me").await;

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", remove)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/comments/post/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    // The surviving comment keeps its id — nothing is renumbered
    assert_eq!(items[0]["id"].as_i64().unwrap() as i32, keep);

    // The deleted row is still there, placeholder content, status=deleted
    let row = sea_orm::ConnectionTrait::query_one(
        &app.db,
        sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT content, status FROM comments WHERE id = $1",
            vec![remove.into()],
        ),
    )
    .await
    .unwrap()
    .expect("Soft-deleted comment row should remain");
    let content: String = row.try_get_by_index(0).unwrap();
    let status: String = row.try_get_by_index(1).unwrap();
    assert_eq!(content, "[This comment has been deleted]");
    assert_eq!(status, "deleted");
}

#[tokio::test]
async fn soft_deleted_replies_vanish_but_thread_survives() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "Parent").await;
    let r1 = common::create_test_comment(&app, &token, post_id, Some(parent), "First").await;
    let r2 = common::create_test_comment(&app, &token, post_id, Some(parent), "Second").await;

    app.client
        .delete(app.url(&format!("/comments/{}", r1)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", parent)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64().unwrap() as i32, r2);
}

#[tokio::test]
async fn editing_sets_edited_markers() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let id = common::create_test_comment(&app, &token, post_id, None, "Original").await;

    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "Edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["content"], "Edited");
    assert_eq!(body["data"]["isEdited"], true);
    assert!(body["data"]["editedAt"].is_string());
}

#[tokio::test]
async fn only_author_or_admin_can_edit() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let id = common::create_test_comment(&app, &token, post_id, None, "Mine").await;

    let (_stranger_id, stranger_token) = common::create_test_user(&app, "stranger").await;
    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&stranger_token)
        .json(&serde_json::json!({ "content": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let (admin_id, admin_token) = common::create_test_user(&app, "comment_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "content": "Moderated" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn editing_a_deleted_comment_fails() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let id = common::create_test_comment(&app, &token, post_id, None, "Short-lived").await;
    app.client
        .delete(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/comments/{}", id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "Necromancy" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn listing_carries_reply_previews_and_counts() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "Thread root").await;
    for i in 0..5 {
        common::create_test_comment(&app, &token, post_id, Some(parent), &format!("Reply {i}"))
            .await;
    }

    let resp = app
        .client
        .get(app.url(&format!("/comments/post/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);

    // Authoritative count is full; preview is capped at 3, oldest first
    assert_eq!(items[0]["replyCount"], 5);
    let previews = items[0]["replies"].as_array().unwrap();
    assert_eq!(previews.len(), 3);
    assert_eq!(previews[0]["content"], "Reply 0");
    assert_eq!(previews[1]["content"], "Reply 1");
}

#[tokio::test]
async fn replies_paginate_independently_oldest_first() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let parent = common::create_test_comment(&app, &token, post_id, None, "Root").await;
    for i in 0..5 {
        common::create_test_comment(&app, &token, post_id, Some(parent), &format!("R{i}")).await;
    }

    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies?page=2&limit=2", parent)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["content"], "R2");
    assert_eq!(items[1]["content"], "R3");

    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["currentPage"], 2);
    assert_eq!(pagination["totalItems"], 5);
    assert_eq!(pagination["totalPages"], 3);
    assert_eq!(pagination["hasNextPage"], true);
    assert_eq!(pagination["hasPrevPage"], true);
}

#[tokio::test]
async fn popular_sort_orders_by_like_count() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let first = common::create_test_comment(&app, &token, post_id, None, "First").await;
    let second = common::create_test_comment(&app, &token, post_id, None, "Second").await;

    // Like the older comment so recency alone can't explain the order
    let resp = app
        .client
        .post(app.url(&format!("/comments/{}/like", first)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/comments/post/{}?sort=popular", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items[0]["id"].as_i64().unwrap() as i32, first);
    assert_eq!(items[1]["id"].as_i64().unwrap() as i32, second);
}

#[tokio::test]
async fn commenting_requires_authentication() {
    let app = common::spawn_app().await;
    let (_token, post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .json(&serde_json::json!({
            "postId": post_id,
            "content": "Anonymous"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn commenting_on_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let (token, _post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "postId": 999999,
            "content": "Into the void"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
