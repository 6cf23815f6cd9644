// src/repo/mod.rs

//! Create/read/update/delete operations over the social data model.
//!
//! Every operation takes the storage handle explicitly. Anything that writes
//! to more than one row family runs inside a single transaction.

pub mod comments;
pub mod followers;
pub mod media;
pub mod posts;
pub mod stories;
pub mod users;

use serde::Serialize;
use sqlx::sqlite::SqliteExecutor;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::AppError,
    models::{post::Post, user::User},
};

/// Rows removed by a cascading delete.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DeleteSummary {
    pub posts: u64,
    pub stories: u64,
    pub comments: u64,
    pub media: u64,
    pub follower_edges: u64,
}

/// Opens a transaction that holds SQLite's write lock from the start.
///
/// A deferred `BEGIN` takes the lock only at the first write, and a reader
/// that later tries to write fails with SQLITE_BUSY instead of waiting.
/// `BEGIN IMMEDIATE` makes concurrent writers queue on the busy timeout.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}

pub(crate) async fn find_user<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

pub(crate) async fn require_user<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<User, AppError> {
    find_user(executor, id)
        .await?
        .ok_or(AppError::not_found("user", id))
}

/// Disabled accounts cannot author anything; they are reported as missing.
pub(crate) async fn require_active_user<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<User, AppError> {
    match find_user(executor, id).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AppError::not_found("user", id)),
    }
}

pub(crate) async fn require_post<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Post, AppError> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::not_found("post", id))
}
