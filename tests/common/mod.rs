use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

/// Router wired to a fresh in-memory database. A single connection keeps
/// every query on the same SQLite memory instance.
#[allow(dead_code)]
pub async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    inkpress::db::migrate(&pool).await.expect("migrations");

    let state = inkpress::AppState::from_env(pool).expect("app state");
    inkpress::app(state)
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, value)
}

#[allow(dead_code)]
pub async fn create_post(app: &Router, title: &str, content: &str) -> serde_json::Value {
    let (status, body) = request(
        app,
        "POST",
        "/api/posts",
        Some(serde_json::json!({"title": title, "content": content})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}
