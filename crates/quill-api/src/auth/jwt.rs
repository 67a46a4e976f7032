//! JWT token generation and validation
//!
//! Implements HS256-signed access and refresh tokens. Both kinds carry the
//! same claim set and differ only in `type` and lifetime.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quill_core::AuthConfig;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Kind of token, carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Intended audience
    pub aud: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - random per token, so two tokens issued in the same second differ
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

/// JWT token generation errors
///
/// Verification failures are never reported through this type; see
/// [`verify_token`].
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Access token lifetime in seconds (default: 900 = 15 minutes)
    pub access_expiration_secs: u64,
    /// Refresh token lifetime in seconds (default: 7 days)
    pub refresh_expiration_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_expiration_secs: config.access_ttl_secs,
            refresh_expiration_secs: config.refresh_ttl_days * 24 * 60 * 60,
        }
    }
}

/// Successfully verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: String,
    pub token_type: TokenType,
}

fn issue_token(
    config: &JwtConfig,
    user_id: &str,
    token_type: TokenType,
    lifetime_secs: u64,
) -> Result<String, JwtError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + lifetime_secs,
        token_type,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Issue a short-lived access token for the user
pub fn issue_access_token(config: &JwtConfig, user_id: &str) -> Result<String, JwtError> {
    issue_token(config, user_id, TokenType::Access, config.access_expiration_secs)
}

/// Issue a long-lived refresh token for the user
///
/// The caller is responsible for persisting a matching refresh token record.
pub fn issue_refresh_token(config: &JwtConfig, user_id: &str) -> Result<String, JwtError> {
    issue_token(config, user_id, TokenType::Refresh, config.refresh_expiration_secs)
}

/// Validate signature, issuer, audience and expiry
///
/// Returns `None` on any failure. The reason is logged at debug level only.
pub fn verify_token(config: &JwtConfig, token: &str) -> Option<VerifiedToken> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.leeway = 0;

    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Some(VerifiedToken {
            user_id: data.claims.sub,
            token_type: data.claims.token_type,
        }),
        Err(e) => {
            debug!(error = %e, "Token verification failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_claims(config: &JwtConfig, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    #[test]
    fn test_issue_and_verify() {
        let config = JwtConfig::default();

        let access = issue_access_token(&config, "user-1").unwrap();
        let verified = verify_token(&config, &access).unwrap();
        assert_eq!(verified.user_id, "user-1");
        assert_eq!(verified.token_type, TokenType::Access);

        let refresh = issue_refresh_token(&config, "user-1").unwrap();
        let verified = verify_token(&config, &refresh).unwrap();
        assert_eq!(verified.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_tokens_are_unique() {
        let config = JwtConfig::default();
        let a = issue_access_token(&config, "user-1").unwrap();
        let b = issue_access_token(&config, "user-1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_lifetimes() {
        let config = JwtConfig::default();
        assert_eq!(config.access_expiration_secs, 15 * 60);
        assert_eq!(config.refresh_expiration_secs, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::default();
        assert!(verify_token(&config, "invalid.token.here").is_none());
        assert!(verify_token(&config, "").is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig {
            secret: "secret1".to_string(),
            ..Default::default()
        };
        let config2 = JwtConfig {
            secret: "secret2".to_string(),
            ..Default::default()
        };

        let token = issue_access_token(&config1, "user-1").unwrap();
        assert!(verify_token(&config2, &token).is_none());
    }

    #[test]
    fn test_wrong_audience_and_issuer() {
        let config = JwtConfig::default();
        let other_audience = JwtConfig {
            audience: "someone-else".to_string(),
            ..Default::default()
        };
        let other_issuer = JwtConfig {
            issuer: "someone-else".to_string(),
            ..Default::default()
        };

        let token = issue_access_token(&config, "user-1").unwrap();
        assert!(verify_token(&other_audience, &token).is_none());
        assert!(verify_token(&other_issuer, &token).is_none());
    }

    #[test]
    fn test_expired_token() {
        let config = JwtConfig::default();
        let now = now();

        let claims = Claims {
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            sub: "user-1".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            token_type: TokenType::Access,
        };

        let token = encode_claims(&config, &claims);
        assert!(verify_token(&config, &token).is_none());
    }

    #[test]
    fn test_type_claim_serialization() {
        let claims = Claims {
            iss: "i".to_string(),
            aud: "a".to_string(),
            sub: "s".to_string(),
            jti: "j".to_string(),
            iat: 0,
            exp: 1,
            token_type: TokenType::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
    }
}
