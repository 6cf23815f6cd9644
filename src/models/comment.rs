use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::utils::html::clean_text;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
    pub fn to_response(&self) -> CommentResponse {
        CommentResponse {
            id: self.id,
            post_id: self.post_id,
            author_id: self.author_id,
            text: self.text.clone(),
            created_at: self.created_at,
        }
    }
}

/// DTO for creating or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub text: String,
}

impl CreateCommentRequest {
    pub fn sanitized(self) -> Self {
        Self {
            text: clean_text(&self.text),
        }
    }

    /// Markup-only input cleans down to nothing; that is not a comment.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if self.text.trim().is_empty() {
            return Err(AppError::validation("text", "Comment must not be empty"));
        }
        Ok(())
    }
}

/// DTO for displaying a comment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
