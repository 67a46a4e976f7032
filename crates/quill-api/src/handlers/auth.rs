//! Authentication API handlers
//!
//! Login, token refresh, logout, token verification and the caller's own
//! profile.
//!
//! Author: hephaex@gmail.com

use crate::auth::{
    CurrentUser, LoginRequest, LoginResponse, RefreshTokenRequest, TokenPair, VerifyResponse,
};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use quill_core::UserPublic;
use std::sync::Arc;

/// Log in with username or email and password
///
/// # Responses
///
/// * `200 OK` - The public user plus an access/refresh token pair
/// * `400 Bad Request` - Password or identifier missing
/// * `401 Unauthorized` - Unknown user or wrong password
/// * `403 Forbidden` - Account is inactive
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 403, description = "Account inactive", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.auth.login(request).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
///
/// The presented refresh token is single use: it is revoked as the new one
/// is stored.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 400, description = "Refresh token missing", body = crate::error::ApiError),
        (status = 401, description = "Refresh token invalid, expired or revoked", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let pair = state.auth.refresh(request.refresh_token.as_deref()).await?;
    Ok(Json(pair))
}

/// Revoke a single refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 204, description = "Logged out"),
        (status = 400, description = "Refresh token missing", body = crate::error::ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    state.auth.logout(request.refresh_token.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every refresh token of the caller
#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    tag = "auth",
    responses(
        (status = 204, description = "All sessions revoked"),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_all_handler(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.auth.logout_all(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a bearer access token
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Token is invalid or expired", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let response = state.auth.verify(authorization).await?;
    Ok(Json(response))
}

/// The authenticated caller's profile
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserPublic),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(user: CurrentUser) -> Json<UserPublic> {
    Json(user.to_public())
}
