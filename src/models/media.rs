// src/models/media.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::validate::validate_url_or_path;

/// Represents the 'media' table. The binary itself lives in external storage;
/// only its location is kept here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,

    /// Open set; "image" and "video" are the recognised values.
    pub file_type: String,

    pub url: String,
}

impl Media {
    pub fn to_response(&self) -> MediaResponse {
        MediaResponse {
            id: self.id,
            file_type: self.file_type.clone(),
            url: self.url.clone(),
        }
    }
}

/// DTO for attaching media to a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMediaRequest {
    #[validate(length(min = 1, max = 20, message = "File type must be between 1 and 20 characters"))]
    pub file_type: String,

    #[validate(length(min = 1, max = 500), custom(function = validate_url_or_path))]
    pub url: String,
}

impl CreateMediaRequest {
    /// Trims both fields and lowercases the type, so the limits are checked
    /// against what gets stored.
    pub fn normalized(self) -> Self {
        Self {
            file_type: self.file_type.trim().to_lowercase(),
            url: self.url.trim().to_string(),
        }
    }
}

/// DTO for displaying an attachment. The owning post is implied by context.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaResponse {
    pub id: i64,
    pub file_type: String,
    pub url: String,
}
