use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated post, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to persist a post; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub url: String,
    pub title: Option<String>,
    pub image: Option<String>,
    pub content: String,
}

impl NewPost {
    pub fn from_candidate(candidate: Candidate, content: String) -> Self {
        Self {
            url: candidate.url,
            title: candidate.title,
            image: candidate.image,
            content,
        }
    }
}

/// A blog entry found on the listing page, before dedup and generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: Option<String>,
    pub image: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
