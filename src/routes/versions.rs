use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::models::{PostResponse, RestoreRequest, VersionEntry, VersionListResponse};
use crate::routes::posts::{fetch_post, internal_error, load_history, persist_tracked_save};
use crate::state::AppState;

pub fn versions_routes() -> Router<AppState> {
    Router::new()
        .route("/{post_id}/versions", get(list_versions))
        .route("/{post_id}/versions/restore", post(restore_version))
}

/// All stored snapshots plus the implicit current entry, newest-first.
/// Display ordering only; storage stays oldest-first.
async fn list_versions(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let post = fetch_post(&state.pool, post_id).await?;
    let history = load_history(&state.pool, &post)
        .await
        .map_err(internal_error)?;
    let current_version = post.current_version;

    let mut versions = Vec::with_capacity(history.snapshots.len() + 1);
    versions.push(VersionEntry {
        version_number: post.current_version,
        title: post.title.clone(),
        content: post.content.clone(),
        description: post.description.clone(),
        image: post.image.clone(),
        category: post.category.clone(),
        tags: post.tags(),
        author_id: post.author_id,
        change_description: String::new(),
        created_at: post.updated_at.unwrap_or(post.created_at),
        is_current: true,
    });
    for snapshot in history.snapshots.into_iter().rev() {
        versions.push(VersionEntry::from_snapshot(snapshot));
    }

    Ok(Json(VersionListResponse {
        versions,
        current_version,
    }))
}

/// Rolls the post back to a stored snapshot. The save path records the
/// pre-restore state as a new snapshot first, so the rollback itself is
/// never destructive.
async fn restore_version(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(input): Json<RestoreRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let pool = &state.pool;
    let post = fetch_post(pool, post_id).await?;
    let previous = post.record_state();

    let mut history = load_history(pool, &post).await.map_err(internal_error)?;
    let (next, outcome) = history
        .restore(
            &previous,
            input.version_number,
            input.change_description.as_deref(),
        )
        .map_err(|error| {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"detail": error.to_string()})),
            )
        })?;

    let updated = persist_tracked_save(pool, &post, &next, &history, &outcome, None)
        .await
        .map_err(internal_error)?;

    Ok(Json(PostResponse::from(updated)))
}
