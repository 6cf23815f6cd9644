use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, Post, PostDetail},
    repo::{DeleteSummary, begin_write, comments, media, require_active_user, require_post, require_user},
};

/// Create a new post owned by `user_id`.
/// The owner must exist and be active.
pub async fn create_post(
    pool: &SqlitePool,
    user_id: i64,
    payload: CreatePostRequest,
) -> Result<Post, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;

    let mut tx = begin_write(pool).await?;

    require_active_user(&mut *tx, user_id).await?;

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, caption, likes, saves, created_at)
        VALUES (?, ?, 0, 0, ?)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&payload.caption)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    tracing::info!("User {} created post {}", user_id, post.id);
    Ok(post)
}

pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    require_post(pool, id).await
}

/// Reads a post back with its media and comments.
pub async fn get_post_detail(pool: &SqlitePool, id: i64) -> Result<PostDetail, AppError> {
    let post = require_post(pool, id).await?;
    let media = media::list_media_by_post(pool, id).await?;
    let comments = comments::list_comments_by_post(pool, id).await?;

    Ok(PostDetail {
        post: post.to_response(),
        media: media.iter().map(|m| m.to_response()).collect(),
        comments: comments.iter().map(|c| c.to_response()).collect(),
    })
}

/// Posts owned by a user, newest first.
pub async fn list_posts_by_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Post>, AppError> {
    require_user(pool, user_id).await?;

    let posts = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn update_caption(
    pool: &SqlitePool,
    id: i64,
    payload: CreatePostRequest,
) -> Result<Post, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;

    sqlx::query_as::<_, Post>("UPDATE posts SET caption = ? WHERE id = ? RETURNING *")
        .bind(&payload.caption)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("post", id))
}

async fn bump(pool: &SqlitePool, id: i64, sql: &str) -> Result<Post, AppError> {
    sqlx::query_as::<_, Post>(sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("post", id))
}

pub async fn add_like(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    bump(pool, id, "UPDATE posts SET likes = likes + 1 WHERE id = ? RETURNING *").await
}

/// Counters never go below zero.
pub async fn remove_like(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    bump(pool, id, "UPDATE posts SET likes = MAX(likes - 1, 0) WHERE id = ? RETURNING *").await
}

pub async fn add_save(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    bump(pool, id, "UPDATE posts SET saves = saves + 1 WHERE id = ? RETURNING *").await
}

pub async fn remove_save(pool: &SqlitePool, id: i64) -> Result<Post, AppError> {
    bump(pool, id, "UPDATE posts SET saves = MAX(saves - 1, 0) WHERE id = ? RETURNING *").await
}

/// Deletes a post together with its media and comments.
pub async fn delete_post(pool: &SqlitePool, id: i64) -> Result<DeleteSummary, AppError> {
    let mut tx = begin_write(pool).await?;

    require_post(&mut *tx, id).await?;

    let comments = sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let media = sqlx::query("DELETE FROM media WHERE post_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::from(e)
        })?;

    tx.commit().await?;

    tracing::info!("Deleted post {}", id);
    Ok(DeleteSummary {
        posts: 1,
        comments,
        media,
        ..Default::default()
    })
}
