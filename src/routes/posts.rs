use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{
    CreatePost, Post, PostListResponse, PostQuery, PostResponse, PostVersion, UpdatePost, slugify,
};
use crate::state::AppState;
use crate::versioning::{SaveOutcome, TrackedFields, VersionHistory};

pub fn posts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{post_id}", get(get_post).put(update_post).delete(delete_post))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let pool = &state.pool;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // Build query based on filters
    let (posts, total): (Vec<Post>, i64) = if let Some(ref category) = query.category {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE category = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(category)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(internal_error)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE category = ?")
            .bind(category)
            .fetch_one(pool)
            .await
            .map_err(internal_error)?;

        (posts, count)
    } else if let Some(ref search) = query.search {
        let search_pattern = format!("%{}%", search);
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE title LIKE ? OR content LIKE ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(&search_pattern)
        .bind(&search_pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(internal_error)?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE title LIKE ? OR content LIKE ?")
                .bind(&search_pattern)
                .bind(&search_pattern)
                .fetch_one(pool)
                .await
                .map_err(internal_error)?;

        (posts, count)
    } else if let Some(ref tag) = query.tag {
        // Tags are stored as a JSON array of strings.
        let tag_pattern = format!("%\"{}\"%", tag);
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE tags_json LIKE ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(&tag_pattern)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(internal_error)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE tags_json LIKE ?")
            .bind(&tag_pattern)
            .fetch_one(pool)
            .await
            .map_err(internal_error)?;

        (posts, count)
    } else {
        let posts =
            sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC LIMIT ? OFFSET ?")
                .bind(per_page)
                .bind(offset)
                .fetch_all(pool)
                .await
                .map_err(internal_error)?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(pool)
            .await
            .map_err(internal_error)?;

        (posts, count)
    };

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        total,
        page,
        per_page,
    }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let post = fetch_post(&state.pool, post_id).await?;

    // View counter is not a tracked field: bumping it never touches the
    // version history.
    sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
        .bind(post_id)
        .execute(&state.pool)
        .await
        .map_err(internal_error)?;

    let mut response = PostResponse::from(post);
    response.view_count += 1;
    Ok(Json(response))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePost>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let pool = &state.pool;
    let title = input.title.trim();
    if title.is_empty() || input.content.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"detail": "Title and content are required"})),
        ));
    }

    let slug = unique_slug(pool, &slugify(title), None)
        .await
        .map_err(internal_error)?;
    let tags_json = tags_to_json(input.tags.as_deref().unwrap_or_default());
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (
            slug, title, content, description, image, category, tags_json,
            author_id, is_published, current_version, view_count, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, 0, ?)
        "#,
    )
    .bind(&slug)
    .bind(title)
    .bind(&input.content)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.category.as_deref().unwrap_or("other"))
    .bind(&tags_json)
    .bind(input.author_id)
    .bind(input.is_published.unwrap_or(false))
    .bind(now)
    .execute(pool)
    .await
    .map_err(internal_error)?;

    let post = fetch_post(pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(input): Json<UpdatePost>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let pool = &state.pool;
    let post = fetch_post(pool, post_id).await?;
    let previous = post.record_state();

    let next = TrackedFields {
        title: input.title.clone().unwrap_or_else(|| post.title.clone()),
        content: input.content.clone().unwrap_or_else(|| post.content.clone()),
        description: input.description.clone().or_else(|| post.description.clone()),
        image: input.image.clone().or_else(|| post.image.clone()),
        tags: input.tags.clone().unwrap_or_else(|| post.tags()),
        category: input.category.clone().unwrap_or_else(|| post.category.clone()),
    };

    let mut history = load_history(pool, &post).await.map_err(internal_error)?;
    let outcome = history.record_if_changed(&previous, &next, input.change_description.as_deref());
    let updated = persist_tracked_save(pool, &post, &next, &history, &outcome, input.is_published)
        .await
        .map_err(internal_error)?;

    Ok(Json(PostResponse::from(updated)))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let pool = &state.pool;
    let post = fetch_post(pool, post_id).await?;

    sqlx::query("DELETE FROM post_versions WHERE post_id = ?")
        .bind(post.id)
        .execute(pool)
        .await
        .map_err(internal_error)?;
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post.id)
        .execute(pool)
        .await
        .map_err(internal_error)?;

    Ok(Json(serde_json::json!({"message": "Post deleted successfully"})))
}

pub(crate) async fn fetch_post(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Post, (StatusCode, Json<serde_json::Value>)> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"detail": "Post not found"})),
            )
        })
}

/// Loads the stored snapshots oldest-first into the pure history type the
/// save path operates on.
pub(crate) async fn load_history(
    pool: &SqlitePool,
    post: &Post,
) -> Result<VersionHistory, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostVersion>(
        "SELECT * FROM post_versions WHERE post_id = ? ORDER BY version_number ASC",
    )
    .bind(post.id)
    .fetch_all(pool)
    .await?;

    Ok(VersionHistory::with(
        post.current_version,
        rows.into_iter().map(Into::into).collect(),
    ))
}

/// Applies a save outcome to storage: inserts the newly appended snapshot,
/// deletes evicted ones, and updates the live row. A no-op save only writes
/// when the publication flag actually flips.
pub(crate) async fn persist_tracked_save(
    pool: &SqlitePool,
    post: &Post,
    next: &TrackedFields,
    history: &VersionHistory,
    outcome: &SaveOutcome,
    is_published: Option<bool>,
) -> Result<Post, sqlx::Error> {
    let now = Utc::now();

    match outcome {
        SaveOutcome::Recorded { new_version, evicted } => {
            let slug = if next.title != post.title {
                unique_slug(pool, &slugify(&next.title), Some(post.id)).await?
            } else {
                post.slug.clone()
            };

            let mut tx = pool.begin().await?;

            if let Some(snapshot) = history.snapshots.last() {
                sqlx::query(
                    r#"
                    INSERT INTO post_versions (
                        post_id, version_number, title, content, description, image,
                        category, tags_json, author_id, change_description, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(post.id)
                .bind(snapshot.version_number)
                .bind(&snapshot.fields.title)
                .bind(&snapshot.fields.content)
                .bind(&snapshot.fields.description)
                .bind(&snapshot.fields.image)
                .bind(&snapshot.fields.category)
                .bind(tags_to_json(&snapshot.fields.tags))
                .bind(snapshot.author_id)
                .bind(&snapshot.change_description)
                .bind(snapshot.created_at)
                .execute(&mut *tx)
                .await?;
            }

            for version_number in evicted {
                sqlx::query("DELETE FROM post_versions WHERE post_id = ? AND version_number = ?")
                    .bind(post.id)
                    .bind(version_number)
                    .execute(&mut *tx)
                    .await?;
            }

            sqlx::query(
                r#"
                UPDATE posts SET
                    slug = ?,
                    title = ?,
                    content = ?,
                    description = ?,
                    image = ?,
                    category = ?,
                    tags_json = ?,
                    current_version = ?,
                    is_published = COALESCE(?, is_published),
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&slug)
            .bind(&next.title)
            .bind(&next.content)
            .bind(&next.description)
            .bind(&next.image)
            .bind(&next.category)
            .bind(tags_to_json(&next.tags))
            .bind(new_version)
            .bind(is_published)
            .bind(now)
            .bind(post.id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        SaveOutcome::Unchanged => {
            if let Some(published) = is_published {
                if published != post.is_published {
                    sqlx::query("UPDATE posts SET is_published = ?, updated_at = ? WHERE id = ?")
                        .bind(published)
                        .bind(now)
                        .bind(post.id)
                        .execute(pool)
                        .await?;
                }
            }
        }
    }

    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
        .bind(post.id)
        .fetch_one(pool)
        .await
}

/// Appends a short random suffix when the derived slug is already taken by
/// another post.
pub(crate) async fn unique_slug(
    pool: &SqlitePool,
    base: &str,
    exclude_id: Option<i64>,
) -> Result<String, sqlx::Error> {
    let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE slug = ? AND id != ?")
        .bind(base)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_optional(pool)
        .await?;

    if taken.is_none() {
        return Ok(base.to_string());
    }

    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    Ok(format!("{base}-{suffix}"))
}

pub(crate) fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn internal_error<E: ToString>(error: E) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"detail": error.to_string()})),
    )
}
