use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

// --- Core Entities (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table. `username` is unique and never
/// changes after registration; `password` and `email` are the only mutable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Stored and compared as plaintext. Never written into a response body.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    #[schema(ignore)]
    pub password: String,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Board
///
/// A post from the `boards` table. `user_id` is the owner and is fixed at creation.
/// `author` is the owner's username, joined in for the detail and list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Board {
    pub id: i64,
    pub title: String,
    pub content: String,
    // FK to users.id (Owner).
    pub user_id: i64,
    pub author: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Insert Payloads (Store Input) ---

/// A board that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewBoard {
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// A user that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
}

// --- Field Rules ---
// Shared by the form DTOs and the lifecycle operations in `posts`/`accounts`.

fn require(value: &str, rule: &'static str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationFailed(rule));
    }
    Ok(())
}

fn require_email(value: &str) -> AppResult<()> {
    require(value, "email must not be blank")?;
    if !value.contains('@') {
        return Err(AppError::ValidationFailed("email must contain '@'"));
    }
    Ok(())
}

/// Title and content of a board must both be non-blank.
pub(crate) fn validate_board_fields(title: &str, content: &str) -> AppResult<()> {
    require(title, "title must not be blank")?;
    require(content, "content must not be blank")
}

/// Registration fields: non-blank username and password, email with an `@`.
pub(crate) fn validate_registration(username: &str, password: &str, email: &str) -> AppResult<()> {
    require(username, "username must not be blank")?;
    validate_profile_fields(password, email)
}

/// The mutable profile fields: non-blank password, email with an `@`.
pub(crate) fn validate_profile_fields(password: &str, email: &str) -> AppResult<()> {
    require(password, "password must not be blank")?;
    require_email(email)
}

// --- Request Payloads (Form Bodies) ---

/// SaveBoardRequest
///
/// Form body for `POST /board/save`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SaveBoardRequest {
    pub title: String,
    pub content: String,
}

impl SaveBoardRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_board_fields(&self.title, &self.content)
    }
}

/// UpdateBoardRequest
///
/// Form body for `POST /board/{id}/update-form`. Both fields are replaced.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBoardRequest {
    pub title: String,
    pub content: String,
}

impl UpdateBoardRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_board_fields(&self.title, &self.content)
    }
}

/// JoinRequest
///
/// Form body for `POST /join`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct JoinRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl JoinRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_registration(&self.username, &self.password, &self.email)
    }
}

/// LoginRequest
///
/// Form body for `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> AppResult<()> {
        require(&self.username, "username must not be blank")?;
        require(&self.password, "password must not be blank")
    }
}

/// UpdateUserRequest
///
/// Form body for `POST /user/update`. The target is always the session user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    pub password: String,
    pub email: String,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_profile_fields(&self.password, &self.email)
    }
}

// --- View Payloads (Output) ---

/// Payload of the `index` view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BoardListPayload {
    pub board_list: Vec<Board>,
}

/// Payload of the `board/detail` and `board/update-form` views.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BoardPayload {
    pub board: Board,
}

/// Payload of the `user/update-form` view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserPayload {
    pub user: User,
}
