use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::versioning::{RecordState, TrackedFields};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub tags_json: String,
    pub author_id: Option<i64>,
    pub is_published: bool,
    pub current_version: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn tags(&self) -> Vec<String> {
        parse_tags_json(&self.tags_json)
    }

    pub fn tracked_fields(&self) -> TrackedFields {
        TrackedFields {
            title: self.title.clone(),
            content: self.content.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            tags: self.tags(),
            category: self.category.clone(),
        }
    }

    /// Live state as seen by the versioned save path. The snapshot timestamp
    /// is the time of the previous update, falling back to creation time.
    pub fn record_state(&self) -> RecordState {
        RecordState {
            fields: self.tracked_fields(),
            author_id: self.author_id,
            updated_at: self.updated_at.unwrap_or(self.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub author_id: Option<i64>,
    pub is_published: bool,
    pub current_version: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let tags = post.tags();
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            content: post.content,
            description: post.description,
            image: post.image,
            category: post.category,
            tags,
            author_id: post.author_id,
            is_published: post.is_published,
            current_version: post.current_version,
            view_count: post.view_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: i32,
    pub per_page: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct PostQuery {
    pub page: Option<i32>,
    pub per_page: Option<i32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub author_id: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
    pub change_description: Option<String>,
}

pub fn parse_tags_json(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

/// Derives a URL slug from a title: lowercased, non-alphanumeric characters
/// stripped, whitespace collapsed to single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for part in title.to_lowercase().split_whitespace() {
        let cleaned: String = part.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if cleaned.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&cleaned);
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Hello World 2"), "hello-world-2");
    }

    #[test]
    fn slugify_strips_non_alphanumerics_and_collapses_whitespace() {
        assert_eq!(slugify("  Rust & Axum:   a primer!  "), "rust-axum-a-primer");
        assert_eq!(slugify("C'est la vie"), "cest-la-vie");
    }

    #[test]
    fn slugify_never_yields_an_empty_slug() {
        assert_eq!(slugify("!!!"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }
}
