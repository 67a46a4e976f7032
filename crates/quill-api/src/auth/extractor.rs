//! Request extractor for the authenticated caller
//!
//! The extractor goes through [`AuthService::resolve_current_user`], so every
//! protected handler authenticates the same way.
//!
//! [`AuthService::resolve_current_user`]: super::AuthService::resolve_current_user

use super::AuthError;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use quill_core::User;
use std::ops::Deref;
use std::sync::Arc;

fn authorization(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// The authenticated caller. Rejects with 401 when no valid access token
/// was presented.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .auth
            .resolve_current_user(authorization(parts))
            .await
            .map(CurrentUser)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
