//! API request handlers
//!
//! Author: hephaex@gmail.com

pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;
pub mod tags;
pub mod users;
pub mod views;

use crate::audit::{audit_log, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use quill_core::{PageParams, User};

/// Resolve page/limit query values against the configured bounds
pub(crate) fn page_params(state: &AppState, page: Option<u32>, limit: Option<u32>) -> PageParams {
    let bounds = &state.config.pagination;
    PageParams::with_bounds(page, limit, bounds.default_limit, bounds.max_limit)
}

/// Owner-or-admin check applied before every update and delete
pub(crate) fn ensure_can_modify(
    user: &User,
    owner_id: &str,
    resource: &str,
    action: &str,
) -> Result<(), AppError> {
    if user.can_modify(owner_id) {
        return Ok(());
    }

    audit_log(&AuditEvent::AccessDenied {
        user_id: user.id.clone(),
        resource: resource.to_string(),
        action: action.to_string(),
    });
    Err(AppError::forbidden())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::UserRole;

    #[test]
    fn test_ensure_can_modify() {
        let owner = User::new("owner", "owner@example.com", "pw", UserRole::User);
        let other = User::new("other", "other@example.com", "pw", UserRole::User);
        let admin = User::new("root", "root@example.com", "pw", UserRole::Admin);

        assert!(ensure_can_modify(&owner, &owner.id, "post:1", "update").is_ok());
        assert!(ensure_can_modify(&admin, &owner.id, "post:1", "delete").is_ok());
        assert!(matches!(
            ensure_can_modify(&other, &owner.id, "post:1", "update"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_page_params_use_configured_bounds() {
        let mut state = AppState::default();
        state.config.pagination.max_limit = 20;

        let params = page_params(&state, Some(0), Some(500));
        assert_eq!(params, PageParams { page: 1, limit: 20 });

        let params = page_params(&state, None, None);
        assert_eq!(params.limit, 10);
    }
}
