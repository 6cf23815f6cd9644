use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'stories' table. Stories are ephemeral: `available` is
/// flipped off by `repo::stories::expire_stories` once the retention window
/// has passed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub user_id: i64,
    pub time_posted: chrono::DateTime<chrono::Utc>,
    pub available: bool,
    /// Visible only to the owner's close-friends list.
    pub close_friends: bool,
}

impl Story {
    pub fn to_response(&self) -> StoryResponse {
        StoryResponse {
            id: self.id,
            user_id: self.user_id,
            time_posted: self.time_posted,
            close_friends: self.close_friends,
        }
    }
}

/// DTO for creating a story.
#[derive(Debug, Default, Deserialize)]
pub struct CreateStoryRequest {
    #[serde(default)]
    pub close_friends: bool,
    /// Defaults to the creation time.
    pub time_posted: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for displaying a story. Expired stories are filtered out before they
/// reach this shape, so `available` is not part of it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoryResponse {
    pub id: i64,
    pub user_id: i64,
    pub time_posted: chrono::DateTime<chrono::Utc>,
    pub close_friends: bool,
}
