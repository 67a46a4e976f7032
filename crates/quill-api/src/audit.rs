//! Security audit logging for authentication events
//!
//! Provides structured audit logging for authentication-related events
//! including logins, token refreshes, logouts and access control failures.
//!
//! All audit events are logged at INFO level with the "audit" target,
//! making them easy to filter and route to security monitoring systems.
//!
//! # Example
//!
//! ```ignore
//! use quill_api::audit::{AuditEvent, audit_log};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id.clone(),
//!     username: user.username.clone(),
//! });
//! ```
//!
//! Author: hephaex@gmail.com

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user login
    LoginSuccess { user_id: String, username: String },

    /// Failed login attempt
    LoginFailure { identifier: String, reason: String },

    /// Refresh token rotated into a new token pair
    TokenRefresh { user_id: String },

    /// Refresh token revoked. `user_id` is unknown when the presented token
    /// matched no record.
    Logout {
        user_id: Option<String>,
        logout_all_devices: bool,
        revoked_tokens: usize,
    },

    /// Caller tried to modify a resource it does not own
    AccessDenied {
        user_id: String,
        resource: String,
        action: String,
    },

    /// Invalid or expired token presented
    InvalidToken { reason: String },
}

/// Log a security audit event with structured fields
///
/// The event is also serialized to JSON and attached as the `event` field
/// for log aggregators.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess { user_id, username } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure { identifier, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identifier = %identifier,
                reason = %reason,
                "Login failed"
            );
        }
        AuditEvent::TokenRefresh { user_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                "Token refresh"
            );
        }
        AuditEvent::Logout {
            user_id,
            logout_all_devices,
            revoked_tokens,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = ?user_id,
                logout_all_devices = %logout_all_devices,
                revoked_tokens = %revoked_tokens,
                "User logout"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            action,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                resource = %resource,
                action = %action,
                "Access denied"
            );
        }
        AuditEvent::InvalidToken { reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                reason = %reason,
                "Invalid token"
            );
        }
    }
}
