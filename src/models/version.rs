use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::versioning::{TrackedFields, VersionSnapshot};

use super::parse_tags_json;

/// Stored snapshot row. `created_at` is the timestamp of the update the
/// snapshot superseded, not the moment the row was written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostVersion {
    pub id: i64,
    pub post_id: i64,
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub tags_json: String,
    pub author_id: Option<i64>,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
}

impl From<PostVersion> for VersionSnapshot {
    fn from(row: PostVersion) -> Self {
        let tags = parse_tags_json(&row.tags_json);
        Self {
            version_number: row.version_number,
            fields: TrackedFields {
                title: row.title,
                content: row.content,
                description: row.description,
                image: row.image,
                tags,
                category: row.category,
            },
            author_id: row.author_id,
            change_description: row.change_description,
            created_at: row.created_at,
        }
    }
}

/// One entry of the version listing: either a stored snapshot or the
/// implicit "current" entry built from the live record.
#[derive(Debug, Serialize)]
pub struct VersionEntry {
    pub version_number: i64,
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub author_id: Option<i64>,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
    pub is_current: bool,
}

impl VersionEntry {
    pub fn from_snapshot(snapshot: VersionSnapshot) -> Self {
        Self {
            version_number: snapshot.version_number,
            title: snapshot.fields.title,
            content: snapshot.fields.content,
            description: snapshot.fields.description,
            image: snapshot.fields.image,
            category: snapshot.fields.category,
            tags: snapshot.fields.tags,
            author_id: snapshot.author_id,
            change_description: snapshot.change_description,
            created_at: snapshot.created_at,
            is_current: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionListResponse {
    pub versions: Vec<VersionEntry>,
    pub current_version: i64,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub version_number: i64,
    pub change_description: Option<String>,
}
