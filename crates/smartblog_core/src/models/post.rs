//! Post records and request payloads.

use crate::constants::EMPTY_DOCUMENT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blog post as returned by the persistence collaborator.
///
/// `content` is the serialized document tree, stored opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft with an empty document.
    ///
    /// # Arguments
    /// - `title`: Post title.
    ///
    /// # Returns
    /// A new [`Post`] with a fresh id.
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content: EMPTY_DOCUMENT.to_string(),
            status: PostStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, bumping `updated_at` when anything changed.
    ///
    /// # Returns
    /// `true` when at least one field was written.
    pub fn apply_update(&mut self, update: &UpdatePostRequest) -> bool {
        let mut changed = false;
        if let Some(content) = update.content.as_ref() {
            self.content = content.clone();
            changed = true;
        }
        if let Some(title) = update.title.as_ref() {
            self.title = title.clone();
            changed = true;
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Request payload for partially updating a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl UpdatePostRequest {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            title: None,
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            content: None,
            title: Some(title.into()),
        }
    }
}

/// Lightweight list row used by post listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub status: PostStatus,
    pub content_len: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Post> for PostSummary {
    fn from(value: &Post) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            status: value.status,
            content_len: value.content.len(),
            updated_at: value.updated_at,
        }
    }
}
