// src/repo/followers.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::follower::{FollowEntry, Follower, Recount},
    repo::{begin_write, require_active_user, require_user},
};

/// Records "`from_id` follows `to_id`".
///
/// The edge insert and the target's counter increment share one transaction,
/// so the counter cannot drift from concurrent follows.
pub async fn create_follower_edge(
    pool: &SqlitePool,
    from_id: i64,
    to_id: i64,
) -> Result<Follower, AppError> {
    if from_id == to_id {
        return Err(AppError::validation(
            "user_to_id",
            "Users cannot follow themselves",
        ));
    }

    let mut tx = begin_write(pool).await?;

    require_active_user(&mut *tx, from_id).await?;
    require_user(&mut *tx, to_id).await?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM followers WHERE user_from_id = ? AND user_to_id = ?")
            .bind(from_id)
            .bind(to_id)
            .fetch_optional(&mut *tx)
            .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "User {} already follows user {}",
            from_id, to_id
        )));
    }

    let edge = sqlx::query_as::<_, Follower>(
        r#"
        INSERT INTO followers (user_from_id, user_to_id, created_at)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(from_id)
    .bind(to_id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            // Concurrent request won the race
            return AppError::Conflict(format!(
                "User {} already follows user {}",
                from_id, to_id
            ));
        }
        tracing::error!("Failed to create follower edge: {:?}", e);
        AppError::from(e)
    })?;

    sqlx::query("UPDATE users SET followers = followers + 1 WHERE id = ?")
        .bind(to_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("User {} now follows user {}", from_id, to_id);
    Ok(edge)
}

/// Removes the edge if present. Returns whether anything was removed; the
/// target's counter is decremented in the same transaction.
pub async fn delete_follower_edge(
    pool: &SqlitePool,
    from_id: i64,
    to_id: i64,
) -> Result<bool, AppError> {
    let mut tx = begin_write(pool).await?;

    let removed = sqlx::query("DELETE FROM followers WHERE user_from_id = ? AND user_to_id = ?")
        .bind(from_id)
        .bind(to_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        return Ok(false);
    }

    sqlx::query("UPDATE users SET followers = MAX(followers - 1, 0) WHERE id = ?")
        .bind(to_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("User {} unfollowed user {}", from_id, to_id);
    Ok(true)
}

pub async fn is_following(pool: &SqlitePool, from_id: i64, to_id: i64) -> Result<bool, AppError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM followers WHERE user_from_id = ? AND user_to_id = ?")
            .bind(from_id)
            .bind(to_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Users following `user_id`, most recent first.
pub async fn list_followers(pool: &SqlitePool, user_id: i64) -> Result<Vec<FollowEntry>, AppError> {
    require_user(pool, user_id).await?;

    let entries = sqlx::query_as::<_, FollowEntry>(
        r#"
        SELECT u.id AS user_id, u.username, f.created_at AS followed_at
        FROM followers f
        JOIN users u ON u.id = f.user_from_id
        WHERE f.user_to_id = ?
        ORDER BY f.created_at DESC, f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Users that `user_id` follows, most recent first.
pub async fn list_following(pool: &SqlitePool, user_id: i64) -> Result<Vec<FollowEntry>, AppError> {
    require_user(pool, user_id).await?;

    let entries = sqlx::query_as::<_, FollowEntry>(
        r#"
        SELECT u.id AS user_id, u.username, f.created_at AS followed_at
        FROM followers f
        JOIN users u ON u.id = f.user_to_id
        WHERE f.user_from_id = ?
        ORDER BY f.created_at DESC, f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Resets one user's `followers` counter to the number of inbound edges.
pub async fn recount(pool: &SqlitePool, user_id: i64) -> Result<Recount, AppError> {
    let mut tx = begin_write(pool).await?;

    let user = require_user(&mut *tx, user_id).await?;

    let actual: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM followers WHERE user_to_id = ?")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let result = Recount {
        user_id,
        previous: user.followers,
        actual,
    };

    if result.drifted() {
        tracing::warn!(
            "Follower counter for user {} drifted: stored {}, actual {}",
            user_id,
            result.previous,
            result.actual
        );
        sqlx::query("UPDATE users SET followers = ? WHERE id = ?")
            .bind(actual)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(result)
}

/// Repairs every drifted counter. Returns the users that needed fixing.
pub async fn recount_all(pool: &SqlitePool) -> Result<Vec<Recount>, AppError> {
    let mut tx = begin_write(pool).await?;

    let drifted = sqlx::query_as::<_, Recount>(
        r#"
        SELECT user_id, previous, actual FROM (
            SELECT u.id AS user_id,
                   u.followers AS previous,
                   (SELECT COUNT(*) FROM followers f WHERE f.user_to_id = u.id) AS actual
            FROM users u
        )
        WHERE previous <> actual
        ORDER BY user_id
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    for row in &drifted {
        tracing::warn!(
            "Follower counter for user {} drifted: stored {}, actual {}",
            row.user_id,
            row.previous,
            row.actual
        );
        sqlx::query("UPDATE users SET followers = ? WHERE id = ?")
            .bind(row.actual)
            .bind(row.user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(drifted)
}
