use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::CreateUserError;

/// Everything a request handler can surface to the client.
///
/// Each variant maps to a fixed status and a `{"message": ...}` body; the
/// conversion happens once in `IntoResponse`, so handlers return
/// `Result<_, ApiError>` and use `?` freely.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is absent or empty.
    #[error("{0}")]
    Validation(String),
    /// Email or nickname already belongs to another account.
    #[error("{0}")]
    Conflict(&'static str),
    /// Unknown login or wrong password. A single variant for both cases, so
    /// the response never reveals whether the identifier exists.
    #[error("Wrong credentials")]
    WrongCredentials,
    /// Anything unexpected from the store or the signing layer. The source
    /// error goes to the log, the client gets a generic body.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::WrongCredentials => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CreateUserError> for ApiError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::EmailTaken => Self::Conflict("Email already in use"),
            CreateUserError::NicknameTaken => Self::Conflict("Nickname already in use"),
            CreateUserError::Other(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                error!(error = %e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "message": message }))).into_response()
    }
}
