use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::view::Outcome;

/// Result alias used by the lifecycle and persistence layers.
pub type AppResult<T> = Result<T, AppError>;

/// ErrorKind
///
/// The logical error taxonomy handed to the boundary. Serialized as the
/// `error` field of every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    AuthenticationRequired,
    InvalidCredentials,
    Conflict,
    NotFound,
    Forbidden,
    ValidationFailed,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// AppError
///
/// Raised at the point of detection and propagated unchanged with `?` up to
/// the handler, where `IntoResponse` maps it onto a transport response.
#[derive(Debug, Error)]
pub enum AppError {
    /// No user could be resolved from the session.
    #[error("authentication required")]
    AuthenticationRequired,

    /// Login lookup did not resolve to exactly one user.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username is already registered.
    #[error("username already exists")]
    Conflict,

    #[error("entity not found")]
    NotFound,

    /// Authenticated, but not the owner of the targeted resource.
    #[error("not the owner of the resource")]
    Forbidden,

    /// A caller-supplied field broke a business rule. Carries the rule name.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AuthenticationRequired => ErrorKind::AuthenticationRequired,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::Conflict => ErrorKind::Conflict,
            AppError::NotFound => ErrorKind::NotFound,
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AppError::Database(_) => ErrorKind::Internal,
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            AppError::InvalidCredentials => tracing::warn!("invalid login attempt"),
            AppError::Forbidden => tracing::warn!("ownership check denied"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
    }
}

/// Unique-index violations surface as `Conflict` so a registration race that
/// slips past the lookup still reports the right kind.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique_violation {
            AppError::Conflict
        } else {
            AppError::Database(err)
        }
    }
}

/// ErrorBody
///
/// JSON body for every error response except `AuthenticationRequired`,
/// which becomes a `RequireLogin` redirect.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        if let AppError::AuthenticationRequired = self {
            return Outcome::RequireLogin.into_response();
        }

        let kind = self.kind();
        let detail = match self {
            AppError::ValidationFailed(rule) => Some(rule),
            _ => None,
        };

        (kind.status_code(), Json(ErrorBody { error: kind, detail })).into_response()
    }
}
