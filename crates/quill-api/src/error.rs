//! API error handling
//!
//! Every failure leaves the server as `{ "error": <message>, "code": <CODE> }`
//! with the matching status.
//!
//! Author: hephaex@gmail.com

use crate::auth::AuthError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_core::QuillError;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable message
    pub error: String,
    /// Error code
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{resource} not found"))
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::Validation(msg) => ApiError::new("VALIDATION_ERROR", msg),
            AppError::Unauthorized(msg) => ApiError::new("UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => ApiError::new("FORBIDDEN", msg),
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::Conflict(msg) => ApiError::new("CONFLICT", msg),
            AppError::Internal(msg) => ApiError::new("INTERNAL_ERROR", msg),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "Unhandled error");
        AppError::Internal("Internal server error".to_string())
    }
}

impl From<QuillError> for AppError {
    fn from(err: QuillError) -> Self {
        match err {
            QuillError::NotFound(msg) => AppError::NotFound(msg),
            QuillError::Conflict(msg) => AppError::Conflict(msg),
            QuillError::ValidationError(msg) => AppError::Validation(msg),
            QuillError::ConfigError(msg) => {
                error!(error = %msg, "Configuration error");
                AppError::Internal("Internal server error".to_string())
            }
            QuillError::Other(err) => err.into(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::MissingPassword
            | AuthError::MissingIdentifier
            | AuthError::MissingRefreshToken => AppError::Validation(message),
            AuthError::InvalidCredentials
            | AuthError::RevokedRefreshToken
            | AuthError::ExpiredRefreshToken
            | AuthError::InvalidRefreshTokenType
            | AuthError::UserUnavailable
            | AuthError::Unauthenticated
            | AuthError::InvalidToken => AppError::Unauthorized(message),
            AuthError::InactiveAccount => AppError::Forbidden(message),
            AuthError::TokenIssue(e) => {
                error!(error = %e, "Token generation failed");
                AppError::Internal(message)
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::not_found("Post").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Post not found");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::MissingPassword, StatusCode::BAD_REQUEST),
            (AuthError::MissingRefreshToken, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::RevokedRefreshToken, StatusCode::UNAUTHORIZED),
            (AuthError::InactiveAccount, StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_token_issue_is_internal() {
        let jwt_err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidKeyFormat,
        );
        let err = AppError::from(AuthError::TokenIssue(JwtError::EncodingError(jwt_err)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "Failed to generate tokens");
    }

    #[test]
    fn test_store_error_mapping() {
        let conflict = AppError::from(QuillError::Conflict("Already following".to_string()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing = AppError::from(QuillError::not_found("Comment"));
        assert!(matches!(missing, AppError::NotFound(ref m) if m == "Comment not found"));
    }
}
