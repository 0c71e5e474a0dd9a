mod common;

use serde_json::Value;

async fn setup(app: &common::TestApp) -> (String, i32) {
    let (user_id, token) = common::create_test_user(app, "bookmarker").await;
    common::make_admin(&app.db, user_id).await;
    let (category_id, _) = common::create_test_category(app, &token).await;
    let (post_id, _) = common::create_test_post(app, &token, category_id, "Bookmark Test Post").await;
    (token, post_id)
}

#[tokio::test]
async fn bookmark_toggles_on_and_off() {
    let app = common::spawn_app().await;
    let (token, post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/users/bookmarks/{}", post_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isBookmarked"], true);

    let resp = app
        .client
        .post(app.url(&format!("/users/bookmarks/{}", post_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["isBookmarked"], false);
}

#[tokio::test]
async fn bookmarks_list_most_recent_first() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "bookworm").await;
    common::make_admin(&app.db, user_id).await;
    let (category_id, _) = common::create_test_category(&app, &token).await;

    let (first, _) = common::create_test_post(&app, &token, category_id, "First Post").await;
    let (second, _) = common::create_test_post(&app, &token, category_id, "Second Post").await;

    for post_id in [first, second] {
        let resp = app
            .client
            .post(app.url(&format!("/users/bookmarks/{}", post_id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .get(app.url("/users/me/bookmarks"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"].as_i64().unwrap() as i32, second);
    assert_eq!(items[1]["id"].as_i64().unwrap() as i32, first);
}

#[tokio::test]
async fn bookmarking_a_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "lostbookmarker").await;

    let resp = app
        .client
        .post(app.url("/users/bookmarks/999999"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn bookmarks_require_authentication() {
    let app = common::spawn_app().await;
    let (_token, post_id) = setup(&app).await;

    let resp = app
        .client
        .post(app.url(&format!("/users/bookmarks/{}", post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/users/me/bookmarks"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
