// src/repo/users.rs

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteExecutor;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::user::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, User},
    repo::{DeleteSummary, begin_write, require_user},
    utils::hash::{hash_password, verify_password},
};

#[derive(Clone, Copy)]
enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    fn name(self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Username => "username",
        }
    }

    fn taken_error(self, value: &str) -> AppError {
        match self {
            UniqueField::Email => {
                AppError::validation("email", format!("Email '{}' is already registered", value))
            }
            UniqueField::Username => {
                AppError::validation("username", format!("Username '{}' already exists", value))
            }
        }
    }
}

/// Fails with a validation error if another user already holds `value`.
async fn ensure_available<'e>(
    executor: impl SqliteExecutor<'e>,
    field: UniqueField,
    value: &str,
    except_id: Option<i64>,
) -> Result<(), AppError> {
    let sql = match field {
        UniqueField::Email => "SELECT id FROM users WHERE email = ? AND id IS NOT ?",
        UniqueField::Username => "SELECT id FROM users WHERE username = ? AND id IS NOT ?",
    };

    let existing: Option<i64> = sqlx::query_scalar(sql)
        .bind(value)
        .bind(except_id)
        .fetch_optional(executor)
        .await?;

    match existing {
        Some(_) => Err(field.taken_error(value)),
        None => Ok(()),
    }
}

/// Maps a UNIQUE race that slipped past `ensure_available` to the same error.
fn unique_race(err: sqlx::Error, email: &str, username: &str) -> AppError {
    if is_unique_violation(&err) {
        let message = err.to_string();
        if message.contains(UniqueField::Email.name()) {
            return UniqueField::Email.taken_error(email);
        }
        return UniqueField::Username.taken_error(username);
    }
    tracing::error!("Failed to write user: {:?}", err);
    AppError::from(err)
}

/// Registers a new user.
///
/// Validates every field, rejects duplicate email/username, and hashes the
/// password with Argon2 before storing it.
pub async fn create_user(pool: &SqlitePool, payload: CreateUserRequest) -> Result<User, AppError> {
    let payload = payload.sanitized();
    payload.check()?;

    ensure_available(pool, UniqueField::Email, &payload.email, None).await?;
    ensure_available(pool, UniqueField::Username, &payload.username, None).await?;

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, username, password, name, profile_picture, bio, is_active, followers, created_at)
        VALUES (?, ?, ?, ?, ?, ?, TRUE, 0, ?)
        RETURNING *
        "#,
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&payload.name)
    .bind(&payload.profile_picture)
    .bind(&payload.bio)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| unique_race(e, &payload.email, &payload.username))?;

    tracing::info!("Created user {} ({})", user.id, user.username);
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    require_user(pool, id).await
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Applies the fields present in `payload`; absent fields are left as they are
/// and `Some(None)` clears a nullable one.
pub async fn update_user(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateUserRequest,
) -> Result<User, AppError> {
    let payload = payload.sanitized();
    payload.check()?;

    let mut tx = begin_write(pool).await?;

    let current = require_user(&mut *tx, id).await?;

    if let Some(email) = &payload.email {
        ensure_available(&mut *tx, UniqueField::Email, email, Some(id)).await?;
    }
    if let Some(username) = &payload.username {
        ensure_available(&mut *tx, UniqueField::Username, username, Some(id)).await?;
    }

    let email = payload.email.unwrap_or(current.email);
    let username = payload.username.unwrap_or(current.username);

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET email = ?,
            username = ?,
            name = CASE WHEN ? THEN ? ELSE name END,
            profile_picture = CASE WHEN ? THEN ? ELSE profile_picture END,
            bio = CASE WHEN ? THEN ? ELSE bio END
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&username)
    .bind(payload.name.is_some())
    .bind(payload.name.flatten())
    .bind(payload.profile_picture.is_some())
    .bind(payload.profile_picture.flatten())
    .bind(payload.bio.is_some())
    .bind(payload.bio.flatten())
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| unique_race(e, &email, &username))?;

    tx.commit().await?;

    Ok(user)
}

/// Enables or disables an account.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>("UPDATE users SET is_active = ? WHERE id = ? RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::not_found("user", id))?;

    tracing::info!("User {} active = {}", id, active);
    Ok(user)
}

/// Replaces the stored hash after checking the old password.
pub async fn change_password(
    pool: &SqlitePool,
    id: i64,
    payload: ChangePasswordRequest,
) -> Result<(), AppError> {
    payload.validate()?;

    let user = require_user(pool, id).await?;

    if !verify_password(&payload.old_password, &user.password)? {
        return Err(AppError::validation("old_password", "Incorrect password"));
    }

    let hashed_password = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Returns the user when `username` exists, is active, and `password` matches
/// the stored hash.
pub async fn verify_credentials(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = get_user_by_username(pool, username).await? else {
        return Ok(None);
    };

    if !user.is_active || !verify_password(password, &user.password)? {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Hard-deletes a user and everything they own, in one transaction.
///
/// Removes their posts (with the posts' media and comments), stories,
/// authored comments, and every follower edge touching them. Users they
/// followed get their follower counters decremented in the same transaction.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<DeleteSummary, AppError> {
    let mut tx = begin_write(pool).await?;

    require_user(&mut *tx, id).await?;

    sqlx::query(
        r#"
        UPDATE users
        SET followers = MAX(followers - 1, 0)
        WHERE id IN (SELECT user_to_id FROM followers WHERE user_from_id = ?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let comments = sqlx::query(
        "DELETE FROM comments WHERE author_id = ? OR post_id IN (SELECT id FROM posts WHERE user_id = ?)",
    )
    .bind(id)
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let media = sqlx::query("DELETE FROM media WHERE post_id IN (SELECT id FROM posts WHERE user_id = ?)")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let posts = sqlx::query("DELETE FROM posts WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let stories = sqlx::query("DELETE FROM stories WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let follower_edges = sqlx::query("DELETE FROM followers WHERE user_from_id = ? OR user_to_id = ?")
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::from(e)
        })?;

    tx.commit().await?;

    let summary = DeleteSummary {
        posts,
        stories,
        comments,
        media,
        follower_edges,
    };
    tracing::info!("Deleted user {} with {:?}", id, summary);
    Ok(summary)
}
