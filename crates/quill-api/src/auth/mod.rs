//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Token issuance and verification
//! - The authentication service (login, refresh, logout, current-user resolution)
//! - A request extractor that resolves the caller for protected handlers

pub mod extractor;
pub mod jwt;
pub mod service;

pub use extractor::CurrentUser;
pub use jwt::{issue_access_token, issue_refresh_token, verify_token, JwtConfig, JwtError, TokenType};
pub use service::{
    AuthService, LoginRequest, LoginResponse, RefreshTokenRequest, TokenPair, VerifyResponse,
};

use quill_core::QuillError;
use thiserror::Error;

/// Authentication failures
///
/// Each variant maps to exactly one HTTP status; the display text is the
/// message returned to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password is required")]
    MissingPassword,

    #[error("Username or email is required")]
    MissingIdentifier,

    #[error("Refresh token is required")]
    MissingRefreshToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is inactive")]
    InactiveAccount,

    #[error("Invalid or revoked refresh token")]
    RevokedRefreshToken,

    #[error("Refresh token expired")]
    ExpiredRefreshToken,

    #[error("Invalid refresh token type")]
    InvalidRefreshTokenType,

    #[error("User not found or inactive")]
    UserUnavailable,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Token is invalid or expired")]
    InvalidToken,

    #[error("Failed to generate tokens")]
    TokenIssue(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] QuillError),
}
