mod common;

use serde_json::Value;

#[tokio::test]
async fn admin_creates_category_with_derived_slug() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "catadmin").await;
    common::make_admin(&app.db, user_id).await;

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "name": "Web Development",
            "description": "All things web"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "web-development");
    // Defaults from the product's branding
    assert_eq!(body["data"]["icon"], "💬");
    assert_eq!(body["data"]["color"], "#4ADE80");
    assert_eq!(body["data"]["postCount"], 0);
}

#[tokio::test]
async fn non_admin_cannot_manage_categories() {
    let app = common::spawn_app().await;
    let (_id, token) = common::create_test_user(&app, "plebeian").await;

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "Forbidden" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn duplicate_category_name_reports_the_field() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "dupadmin").await;
    common::make_admin(&app.db, user_id).await;

    for _ in 0..2 {
        let _ = app
            .client
            .post(app.url("/categories"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "name": "Singleton" }))
            .send()
            .await
            .unwrap();
    }

    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "Singleton" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("already exists"), "got: {message}");
}

#[tokio::test]
async fn listing_excludes_deactivated_categories() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "softdeleter").await;
    common::make_admin(&app.db, user_id).await;

    let (keep_id, _) = common::create_test_category(&app, &token).await;
    let (drop_id, drop_slug) = common::create_test_category(&app, &token).await;

    let resp = app
        .client
        .delete(app.url(&format!("/categories/{}", drop_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.get(app.url("/categories")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64().unwrap() as i32, keep_id);

    // Slug lookups treat it as gone too
    let resp = app
        .client
        .get(app.url(&format!("/categories/{}", drop_slug)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn renaming_a_category_reslugs_it() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "renamer").await;
    common::make_admin(&app.db, user_id).await;

    let (id, _) = common::create_test_category(&app, &token).await;

    let resp = app
        .client
        .put(app.url(&format!("/categories/{}", id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "name": "Brand New Name" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "brand-new-name");
}

#[tokio::test]
async fn categories_sort_by_order_then_name() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "orderer").await;
    common::make_admin(&app.db, user_id).await;

    for (name, order) in [("Zebra", 0), ("Apple", 0), ("Pinned First", -1)] {
        let resp = app
            .client
            .post(app.url("/categories"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "name": name, "sortOrder": order }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app.client.get(app.url("/categories")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Pinned First", "Apple", "Zebra"]);
}
