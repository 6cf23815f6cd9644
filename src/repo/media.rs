use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::media::{CreateMediaRequest, Media},
    repo::{begin_write, require_post},
    utils::validate::is_known_file_type,
};

/// Attach a media item to an existing post.
///
/// `file_type` is an open set: unrecognised values are stored lowercased and
/// logged, not rejected. A blank type is a validation error.
pub async fn create_media(
    pool: &SqlitePool,
    post_id: i64,
    payload: CreateMediaRequest,
) -> Result<Media, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    if !is_known_file_type(&payload.file_type) {
        tracing::warn!(
            "Post {} gets media of unrecognised type '{}'",
            post_id,
            payload.file_type
        );
    }

    let mut tx = begin_write(pool).await?;

    require_post(&mut *tx, post_id).await?;

    let media = sqlx::query_as::<_, Media>(
        "INSERT INTO media (post_id, file_type, url) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(post_id)
    .bind(&payload.file_type)
    .bind(&payload.url)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create media: {:?}", e);
        AppError::from(e)
    })?;

    tx.commit().await?;

    Ok(media)
}

pub async fn get_media(pool: &SqlitePool, id: i64) -> Result<Media, AppError> {
    sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("media", id))
}

/// Attachments of a post in insertion order.
pub async fn list_media_by_post(pool: &SqlitePool, post_id: i64) -> Result<Vec<Media>, AppError> {
    require_post(pool, post_id).await?;

    let media = sqlx::query_as::<_, Media>("SELECT * FROM media WHERE post_id = ? ORDER BY id ASC")
        .bind(post_id)
        .fetch_all(pool)
        .await?;

    Ok(media)
}

pub async fn delete_media(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let affected = sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::not_found("media", id));
    }
    Ok(())
}
