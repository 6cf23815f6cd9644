use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'followers' table: a directed edge meaning
/// "`user_from_id` follows `user_to_id`".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Follower {
    pub id: i64,
    pub user_from_id: i64,
    pub user_to_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One entry of a followers/following listing, joined with the other user.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct FollowEntry {
    pub user_id: i64,
    pub username: String,
    pub followed_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of reconciling one user's counter against the edge table.
#[derive(Debug, Clone, Copy, Serialize, FromRow, PartialEq, Eq)]
pub struct Recount {
    pub user_id: i64,
    pub previous: i64,
    pub actual: i64,
}

impl Recount {
    pub fn drifted(&self) -> bool {
        self.previous != self.actual
    }
}
