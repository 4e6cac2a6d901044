mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_post_starts_at_version_one_with_derived_slug() {
    let app = common::test_app().await;

    let post = common::create_post(&app, "Hello World", "first body").await;
    assert_eq!(post["slug"], "hello-world");
    assert_eq!(post["current_version"], 1);
    assert_eq!(post["is_published"], false);

    let (status, listing) = common::request(&app, "GET", "/api/posts/1/versions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["current_version"], 1);
    // Only the implicit current entry; no snapshots yet.
    assert_eq!(listing["versions"].as_array().unwrap().len(), 1);
    assert_eq!(listing["versions"][0]["is_current"], true);
}

#[tokio::test]
async fn title_and_content_are_required() {
    let app = common::test_app().await;

    let (status, body) = common::request(
        &app,
        "POST",
        "/api/posts",
        Some(json!({"title": "  ", "content": "body"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn duplicate_titles_get_distinct_slugs() {
    let app = common::test_app().await;

    let first = common::create_post(&app, "Hello World", "one").await;
    let second = common::create_post(&app, "Hello World", "two").await;

    assert_eq!(first["slug"], "hello-world");
    let second_slug = second["slug"].as_str().unwrap();
    assert!(second_slug.starts_with("hello-world-"));
    assert_ne!(second_slug, "hello-world");
}

#[tokio::test]
async fn title_edit_regenerates_the_slug() {
    let app = common::test_app().await;
    common::create_post(&app, "Hello World", "body").await;

    let (status, updated) = common::request(
        &app,
        "PUT",
        "/api/posts/1",
        Some(json!({"title": "Hello World 2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "hello-world-2");
    assert_eq!(updated["current_version"], 2);
}

#[tokio::test]
async fn publish_toggle_alone_does_not_bump_the_version() {
    let app = common::test_app().await;
    common::create_post(&app, "Hello World", "body").await;

    // Content edit: version 1 -> 2, one snapshot.
    let (_, updated) = common::request(
        &app,
        "PUT",
        "/api/posts/1",
        Some(json!({"title": "Hello World 2"})),
    )
    .await;
    assert_eq!(updated["current_version"], 2);

    // Publish flag only: no bump, no snapshot.
    let (status, toggled) = common::request(
        &app,
        "PUT",
        "/api/posts/1",
        Some(json!({"is_published": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_published"], true);
    assert_eq!(toggled["current_version"], 2);

    let (_, listing) = common::request(&app, "GET", "/api/posts/1/versions", None).await;
    let versions = listing["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1]["title"], "Hello World");
}

#[tokio::test]
async fn resubmitting_identical_fields_is_a_no_op() {
    let app = common::test_app().await;
    common::create_post(&app, "Hello World", "body").await;

    let (status, updated) = common::request(
        &app,
        "PUT",
        "/api/posts/1",
        Some(json!({"title": "Hello World", "content": "body"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["current_version"], 1);

    let (_, listing) = common::request(&app, "GET", "/api/posts/1/versions", None).await;
    assert_eq!(listing["versions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn view_counter_is_not_a_tracked_field() {
    let app = common::test_app().await;
    common::create_post(&app, "Hello World", "body").await;

    let (status, fetched) = common::request(&app, "GET", "/api/posts/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["view_count"], 1);
    assert_eq!(fetched["current_version"], 1);

    let (_, listing) = common::request(&app, "GET", "/api/posts/1/versions", None).await;
    assert_eq!(listing["versions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_posts_filters_by_category_and_search() {
    let app = common::test_app().await;
    let (_, _) = common::request(
        &app,
        "POST",
        "/api/posts",
        Some(json!({"title": "Rust Tips", "content": "ownership", "category": "tech"})),
    )
    .await;
    common::create_post(&app, "Holiday Notes", "beaches").await;

    let (status, listing) =
        common::request(&app, "GET", "/api/posts/?category=tech", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["posts"][0]["title"], "Rust Tips");

    let (_, searched) = common::request(&app, "GET", "/api/posts/?search=beaches", None).await;
    assert_eq!(searched["total"], 1);
    assert_eq!(searched["posts"][0]["title"], "Holiday Notes");
}

#[tokio::test]
async fn delete_removes_the_post_and_its_history() {
    let app = common::test_app().await;
    common::create_post(&app, "Hello World", "body").await;
    common::request(&app, "PUT", "/api/posts/1", Some(json!({"content": "v2"}))).await;

    let (status, _) = common::request(&app, "DELETE", "/api/posts/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::request(&app, "GET", "/api/posts/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::request(&app, "GET", "/api/posts/1/versions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = common::test_app().await;
    let (status, body) = common::request(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
