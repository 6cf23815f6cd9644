use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::comment::{Comment, CreateCommentRequest},
    repo::{begin_write, require_active_user, require_post, require_user},
};

/// Create a comment on `post_id` authored by `author_id`.
pub async fn create_comment(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    payload: CreateCommentRequest,
) -> Result<Comment, AppError> {
    let payload = payload.sanitized();
    payload.check()?;

    let mut tx = begin_write(pool).await?;

    require_post(&mut *tx, post_id).await?;
    require_active_user(&mut *tx, author_id).await?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, author_id, text, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(&payload.text)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok(comment)
}

pub async fn get_comment(pool: &SqlitePool, id: i64) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("comment", id))
}

/// All comments on a post, oldest first.
pub async fn list_comments_by_post(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, AppError> {
    require_post(pool, post_id).await?;

    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE post_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

/// Comments written by a user, newest first.
pub async fn list_comments_by_user(
    pool: &SqlitePool,
    author_id: i64,
) -> Result<Vec<Comment>, AppError> {
    require_user(pool, author_id).await?;

    let comments = sqlx::query_as::<_, Comment>(
        "SELECT * FROM comments WHERE author_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

pub async fn update_comment_text(
    pool: &SqlitePool,
    id: i64,
    payload: CreateCommentRequest,
) -> Result<Comment, AppError> {
    let payload = payload.sanitized();
    payload.check()?;

    sqlx::query_as::<_, Comment>("UPDATE comments SET text = ? WHERE id = ? RETURNING *")
        .bind(&payload.text)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("comment", id))
}

pub async fn delete_comment(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let affected = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::not_found("comment", id));
    }
    Ok(())
}
