//! Authentication service layer
//!
//! Login, refresh-token rotation, logout, logout-all, token verification and
//! current-user resolution. The service owns no state of its own: users and
//! refresh token records live in the injected store.

use super::jwt::{issue_access_token, issue_refresh_token, verify_token, JwtConfig, TokenType};
use super::AuthError;
use crate::audit::{audit_log, AuditEvent};
use chrono::{Duration, Utc};
use quill_core::password::verify_password;
use quill_core::store::Store;
use quill_core::{QuillError, RefreshToken, User, UserPublic};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// User login request
///
/// The identifier is matched against usernames first, then emails.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default, alias = "usernameOrEmail", alias = "username", alias = "email")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of refresh and logout requests
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserPublic,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub user: UserPublic,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_config: JwtConfig,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt_config: JwtConfig) -> Self {
        Self { store, jwt_config }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Login with username or email and password
    ///
    /// The password presence check runs before the identifier check, and the
    /// credential check runs before the active-account check.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let password = non_empty(request.password.as_deref()).ok_or(AuthError::MissingPassword)?;
        let identifier =
            non_empty(request.identifier.as_deref()).ok_or(AuthError::MissingIdentifier)?;

        let user = match self.store.find_user_by_username(identifier).await? {
            Some(user) => Some(user),
            None => self.store.find_user_by_email(identifier).await?,
        };

        let Some(user) = user else {
            self.log_login_failure(identifier, "user not found");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password) {
            self.log_login_failure(identifier, "password incorrect");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            self.log_login_failure(identifier, "account inactive");
            return Err(AuthError::InactiveAccount);
        }

        let pair = self.issue_pair(&user.id)?;
        self.store
            .insert_refresh_token(self.refresh_record(&pair.refresh_token, &user.id))
            .await?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id.clone(),
            username: user.username.clone(),
        });
        debug!(user_id = %user.id, role = %user.role, "Session opened");

        Ok(LoginResponse {
            user: user.to_public(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The presented token is single-use: the new record is persisted and the
    /// old one revoked in one store operation.
    pub async fn refresh(&self, token: Option<&str>) -> Result<TokenPair, AuthError> {
        let token = non_empty(token).ok_or(AuthError::MissingRefreshToken)?;

        let record = self
            .store
            .find_active_refresh_token(token)
            .await?
            .ok_or(AuthError::RevokedRefreshToken)?;

        if record.is_expired() {
            self.store.revoke_refresh_token(&record.id).await?;
            return Err(AuthError::ExpiredRefreshToken);
        }

        let verified = verify_token(&self.jwt_config, token)
            .filter(|v| v.token_type == TokenType::Refresh)
            .ok_or(AuthError::InvalidRefreshTokenType)?;

        let user = self
            .store
            .find_user(&verified.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::UserUnavailable)?;

        let pair = self.issue_pair(&user.id)?;
        let replacement = self.refresh_record(&pair.refresh_token, &user.id);

        match self.store.rotate_refresh_token(&record.id, replacement).await {
            Ok(_) => {}
            // Lost a race with a concurrent refresh of the same token
            Err(QuillError::NotFound(_)) => return Err(AuthError::RevokedRefreshToken),
            Err(e) => return Err(e.into()),
        }

        audit_log(&AuditEvent::TokenRefresh { user_id: user.id });
        Ok(pair)
    }

    /// Revoke the refresh token if it is known. Idempotent.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = non_empty(token).ok_or(AuthError::MissingRefreshToken)?;

        let record = self.store.find_refresh_token(token).await?;
        let mut revoked = 0;
        if let Some(record) = &record {
            if self.store.revoke_refresh_token(&record.id).await? {
                revoked = 1;
            }
        }

        audit_log(&AuditEvent::Logout {
            user_id: record.map(|r| r.user_id),
            logout_all_devices: false,
            revoked_tokens: revoked,
        });
        Ok(())
    }

    /// Revoke every live refresh token of the user
    pub async fn logout_all(&self, user: &User) -> Result<usize, AuthError> {
        let revoked = self.store.revoke_all_refresh_tokens(&user.id).await?;

        audit_log(&AuditEvent::Logout {
            user_id: Some(user.id.clone()),
            logout_all_devices: true,
            revoked_tokens: revoked,
        });
        Ok(revoked)
    }

    /// Confirm the bearer token belongs to a known user
    pub async fn verify(&self, authorization: Option<&str>) -> Result<VerifyResponse, AuthError> {
        let user = self
            .resolve_current_user(authorization)
            .await
            .ok_or(AuthError::InvalidToken)?;

        Ok(VerifyResponse {
            message: "Token is valid".to_string(),
            user: user.to_public(),
        })
    }

    /// Resolve the caller from an Authorization header value
    ///
    /// Returns `None` when the header is absent or malformed, the token does
    /// not verify, the token is not an access token, or the user is unknown.
    /// Never fails.
    pub async fn resolve_current_user(&self, authorization: Option<&str>) -> Option<User> {
        let token = bearer_token(authorization?)?;

        let Some(verified) = verify_token(&self.jwt_config, token) else {
            audit_log(&AuditEvent::InvalidToken {
                reason: "verification failed".to_string(),
            });
            return None;
        };

        if verified.token_type != TokenType::Access {
            audit_log(&AuditEvent::InvalidToken {
                reason: "refresh token used as access token".to_string(),
            });
            return None;
        }

        match self.store.find_user(&verified.user_id).await {
            Ok(user) => {
                if user.is_none() {
                    debug!(user_id = %verified.user_id, "Token subject no longer exists");
                }
                user
            }
            Err(e) => {
                warn!(error = %e, "User lookup failed during authentication");
                None
            }
        }
    }

    fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: issue_access_token(&self.jwt_config, user_id)?,
            refresh_token: issue_refresh_token(&self.jwt_config, user_id)?,
        })
    }

    fn refresh_record(&self, token: &str, user_id: &str) -> RefreshToken {
        let lifetime = Duration::seconds(self.jwt_config.refresh_expiration_secs as i64);
        RefreshToken::new(token.to_string(), user_id.to_string(), Utc::now() + lifetime)
    }

    fn log_login_failure(&self, identifier: &str, reason: &str) {
        audit_log(&AuditEvent::LoginFailure {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        });
    }
}
