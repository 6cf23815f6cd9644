use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::{comment::CommentResponse, media::MediaResponse};
use crate::utils::html::clean_text;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub caption: Option<String>,

    pub likes: i64,
    pub saves: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
    pub fn to_response(&self) -> PostResponse {
        PostResponse {
            id: self.id,
            user_id: self.user_id,
            caption: self.caption.clone(),
            likes: self.likes,
            saves: self.saves,
            created_at: self.created_at,
        }
    }
}

/// DTO for creating a new post.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 2200, message = "Caption must be at most 2200 characters"))]
    pub caption: Option<String>,
}

impl CreatePostRequest {
    /// Markup is stripped before the length limit is checked.
    pub fn sanitized(self) -> Self {
        Self {
            caption: self.caption.as_deref().map(clean_text),
        }
    }
}

/// DTO for displaying a post.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub caption: Option<String>,
    pub likes: i64,
    pub saves: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A post read back together with its attachments and comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostResponse,
    pub media: Vec<MediaResponse>,
    pub comments: Vec<CommentResponse>,
}
