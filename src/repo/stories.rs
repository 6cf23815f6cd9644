use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::story::{CreateStoryRequest, Story},
    repo::{begin_write, require_active_user, require_user},
};

pub async fn create_story(
    pool: &SqlitePool,
    user_id: i64,
    payload: CreateStoryRequest,
) -> Result<Story, AppError> {
    let mut tx = begin_write(pool).await?;

    require_active_user(&mut *tx, user_id).await?;

    let story = sqlx::query_as::<_, Story>(
        r#"
        INSERT INTO stories (user_id, time_posted, available, close_friends)
        VALUES (?, ?, TRUE, ?)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(payload.time_posted.unwrap_or_else(Utc::now))
    .bind(payload.close_friends)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create story: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok(story)
}

pub async fn get_story(pool: &SqlitePool, id: i64) -> Result<Story, AppError> {
    sqlx::query_as::<_, Story>("SELECT * FROM stories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("story", id))
}

/// A user's stories, newest first. With `only_available`, expired ones are
/// left out.
pub async fn list_stories_by_user(
    pool: &SqlitePool,
    user_id: i64,
    only_available: bool,
) -> Result<Vec<Story>, AppError> {
    require_user(pool, user_id).await?;

    let stories = sqlx::query_as::<_, Story>(
        r#"
        SELECT * FROM stories
        WHERE user_id = ? AND (? = FALSE OR available = TRUE)
        ORDER BY time_posted DESC, id DESC
        "#,
    )
    .bind(user_id)
    .bind(only_available)
    .fetch_all(pool)
    .await?;

    Ok(stories)
}

pub async fn set_available(pool: &SqlitePool, id: i64, available: bool) -> Result<Story, AppError> {
    sqlx::query_as::<_, Story>("UPDATE stories SET available = ? WHERE id = ? RETURNING *")
        .bind(available)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("story", id))
}

/// Hides every story posted at or before `now - retention`. Meant to be
/// driven by an external scheduler; returns how many stories were hidden.
pub async fn expire_stories(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<u64, AppError> {
    let cutoff = now - retention;

    // Timestamps are stored as RFC 3339 UTC text, which orders lexicographically.
    let expired = sqlx::query("UPDATE stories SET available = FALSE WHERE available = TRUE AND time_posted <= ?")
        .bind(cutoff)
        .execute(pool)
        .await?
        .rows_affected();

    if expired > 0 {
        tracing::info!("Expired {} stories posted before {}", expired, cutoff);
    }
    Ok(expired)
}

pub async fn delete_story(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let affected = sqlx::query("DELETE FROM stories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::not_found("story", id));
    }
    Ok(())
}
