use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Account is not active")]
    AccountInactive,

    #[error("Invalid or expired reset token")]
    InvalidToken,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidToken => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::AccountInactive => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Messages safe to show to the caller. Storage failures collapse to a
    /// generic retry notice and are logged instead.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            AppError::Validation(messages) => messages.clone(),
            AppError::InvalidCredentials => vec![INVALID_CREDENTIALS.to_string()],
            AppError::Unauthorized => vec!["Unauthorized".to_string()],
            AppError::AccountInactive => vec!["Account is not active.".to_string()],
            AppError::InvalidToken => vec!["Invalid or expired reset token.".to_string()],
            AppError::NotFound(msg) | AppError::Conflict(msg) => vec![msg.clone()],
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                vec![GENERIC_FAILURE.to_string()]
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {e}");
                vec![GENERIC_FAILURE.to_string()]
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                vec![GENERIC_FAILURE.to_string()]
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.user_messages().join(" ");
        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
