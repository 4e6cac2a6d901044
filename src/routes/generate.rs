use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::models::slugify;
use crate::originality::{OriginalityReport, score_originality};
use crate::state::AppState;
use crate::textgen::TextGenError;

pub const RELATED_IMAGE_COUNT: usize = 3;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub title: String,
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub content: String,
    pub featured_image: String,
    pub related_images: Vec<String>,
    pub originality: OriginalityReport,
}

pub fn generate_routes() -> Router<AppState> {
    Router::new().route("/generate", post(generate_content))
}

/// Drafts post content from a title and optional context, then applies the
/// originality gate: drafts that do not score as human-like are routed
/// through the rewrite pipeline before being returned.
async fn generate_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<GenerateRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"detail": "Title is required"})),
        ));
    }

    if !state.limiter.try_acquire(&client_key(&headers)) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({"detail": "Rate limit exceeded, try again later"})),
        ));
    }

    let completion = state.text.completion().map_err(text_service_error)?;
    let draft = completion
        .draft_post(title, input.context.as_deref())
        .await
        .map_err(text_service_error)?;

    let originality = score_originality(&draft);
    tracing::info!(
        composite = originality.composite,
        human_like = originality.human_like,
        "Scored generated draft"
    );

    let content = if originality.human_like {
        draft
    } else {
        state
            .text
            .rewrite(&draft)
            .await
            .map_err(text_service_error)?
    };

    let slug = slugify(title);
    Ok(Json(GenerateResponse {
        content,
        featured_image: featured_image_url(&slug),
        related_images: related_image_urls(&slug, RELATED_IMAGE_COUNT),
        originality,
    }))
}

fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

fn text_service_error(error: TextGenError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match error {
        TextGenError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(serde_json::json!({"detail": error.to_string()})))
}

fn featured_image_url(slug: &str) -> String {
    format!("https://source.unsplash.com/1200x630/?{slug}")
}

fn related_image_urls(slug: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|index| format!("https://source.unsplash.com/800x600/?{slug}&sig={index}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_uses_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.9");
    }

    #[test]
    fn client_key_falls_back_when_header_is_missing() {
        assert_eq!(client_key(&HeaderMap::new()), "anonymous");
    }

    #[test]
    fn image_urls_are_derived_from_the_slug() {
        assert_eq!(
            featured_image_url("hello-world"),
            "https://source.unsplash.com/1200x630/?hello-world"
        );
        let related = related_image_urls("hello-world", 3);
        assert_eq!(related.len(), 3);
        assert!(related[2].ends_with("sig=3"));
    }
}
