use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};
use tubehub_auth::AuthError;
use tubehub_database::DatabaseError;
use utoipa::ToSchema;

use crate::services::media::MediaError;

const INTERNAL_MESSAGE: &str = "something went wrong";

/// Body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    pub message: String,
    pub success: bool,
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorEnvelope {
            status_code: self.status.as_u16(),
            data: None,
            message: self.message,
            success: false,
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        error!(error = ?error, "internal error");
        Self::internal_server_error()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let status = match &error {
            AuthError::MissingFields
            | AuthError::MissingIdentifier
            | AuthError::InvalidOldPassword => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidAccessToken
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenReused => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::UserExists | AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Misconfigured(_)
            | AuthError::Token(_)
            | AuthError::Database(_)
            | AuthError::PasswordHash(_) => {
                error!(error = ?error, "auth error");
                return Self::internal_server_error();
            }
        };

        debug!(%status, error = %error, "auth request rejected");
        Self::new(status, error.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(entity) => {
                debug!(%entity, "entity not found");
                Self::not_found("resource not found")
            }
            DatabaseError::Duplicate(entity) => Self::conflict(format!("{entity} already exists")),
            other => {
                error!(error = ?other, "database error");
                Self::internal_server_error()
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::Io(_) => {
                error!(error = ?error, "media storage error");
                Self::internal_server_error()
            }
            MediaError::TooLarge { .. } => Self::new(StatusCode::PAYLOAD_TOO_LARGE, error.to_string()),
            MediaError::UnsupportedType(_) | MediaError::Empty(_) => {
                Self::bad_request(error.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "rejected json body");
        Self::bad_request("invalid request body").with_errors(vec![rejection.body_text()])
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request("invalid multipart body").with_errors(vec![rejection.body_text()])
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        let status = error.status();
        debug!(%status, error = %error.body_text(), "failed to read multipart field");
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(status, "request body is too large");
        }
        Self::bad_request("invalid multipart body").with_errors(vec![error.body_text()])
    }
}
