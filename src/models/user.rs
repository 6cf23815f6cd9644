// src/models/user.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;
use crate::utils::html::clean_text;
use crate::utils::validate::{validate_password, validate_url_or_path, validate_username};

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub email: String,

    /// Unique handle.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,

    /// Account enabled/disabled flag.
    pub is_active: bool,

    /// Denormalized count of inbound follower edges. Advisory; see
    /// `repo::followers::recount`.
    pub followers: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Transfer view without internal counters.
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
            profile_picture: self.profile_picture.clone(),
            bio: self.bio.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            followers: None,
        }
    }

    /// Transfer view including the follower counter.
    pub fn to_response_with_counters(&self) -> UserResponse {
        UserResponse {
            followers: Some(self.followers),
            ..self.to_response()
        }
    }
}

/// DTO for exposing a user to clients. Has no password field at all.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<i64>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        email(message = "Email must be a valid address."),
        length(max = 120, message = "Email must be at most 120 characters.")
    )]
    pub email: String,

    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(custom(function = validate_password))]
    pub password: String,

    #[validate(length(max = 120))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub profile_picture: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

impl CreateUserRequest {
    pub fn new(email: &str, username: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            name: None,
            profile_picture: None,
            bio: None,
        }
    }

    /// Strips markup from the free-text fields. Length limits apply to
    /// what this returns.
    pub fn sanitized(self) -> Self {
        Self {
            name: self.name.as_deref().map(clean_text),
            bio: self.bio.as_deref().map(clean_text),
            ..self
        }
    }

    /// Derived rules plus the checks on optional fields.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        check_picture(self.profile_picture.as_deref())
    }
}

/// DTO for profile edits.
///
/// For `name`, `profile_picture` and `bio` an absent field is left untouched,
/// `null` clears it and a string replaces it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Email must be a valid address."), length(max = 120))]
    pub email: Option<String>,

    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 120))]
    pub name: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500))]
    pub profile_picture: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500))]
    pub bio: Option<Option<String>>,
}

impl UpdateUserRequest {
    pub fn sanitized(self) -> Self {
        Self {
            name: self.name.map(|v| v.as_deref().map(clean_text)),
            bio: self.bio.map(|v| v.as_deref().map(clean_text)),
            ..self
        }
    }

    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let Some(username) = &self.username {
            validate_username(username).map_err(|e| field_error("username", e))?;
        }
        check_picture(self.profile_picture.as_ref().and_then(|p| p.as_deref()))
    }
}

/// Tells a JSON `null` apart from a missing key: with `#[serde(default)]` a
/// missing key stays `None`, while `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// DTO for a password change.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub old_password: String,
    #[validate(custom(function = validate_password))]
    pub new_password: String,
}

fn check_picture(picture: Option<&str>) -> Result<(), AppError> {
    match picture {
        Some(p) => validate_url_or_path(p).map_err(|e| field_error("profile_picture", e)),
        None => Ok(()),
    }
}

pub(crate) fn field_error(field: &str, err: validator::ValidationError) -> AppError {
    let message = match err.message {
        Some(msg) => msg.to_string(),
        None => err.code.to_string(),
    };
    AppError::validation(field, message)
}
