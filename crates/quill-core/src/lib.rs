//! Quill Core - Domain models, store and shared contracts
//!
//! This crate defines the pieces shared by the Quill API server:
//! - Blog domain models (users, posts, comments, tags, likes, follows)
//! - Refresh token records for the credential store
//! - The pagination and typed filter contract used by every list endpoint
//! - The injectable repository traits and their in-memory implementation
//! - Configuration management
//! - Deterministic fixture data

pub mod config;
pub mod models;
pub mod pagination;
pub mod password;
pub mod query;
pub mod seed;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, LoggingConfig, PaginationConfig, ServerConfig};
pub use models::{
    Comment, Follow, Like, LikeTarget, Post, PostStatus, RefreshToken, Tag, User, UserPublic,
    UserRole,
};
pub use pagination::{PageParams, Paginated, PaginationMeta};
pub use query::{
    CommentPredicate, CommentQuery, CommentSortField, PostPredicate, PostQuery, PostSortField,
    Sort, SortDirection, TagPredicate, UserPredicate, UserQuery,
};
pub use store::{MemoryStore, Store};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Quill operations
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QuillError>;

impl QuillError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{resource} not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = QuillError::not_found("Post");
        assert_eq!(err.to_string(), "Post not found");
    }

    #[test]
    fn test_conflict_message_is_verbatim() {
        let err = QuillError::Conflict("Already following".to_string());
        assert_eq!(err.to_string(), "Already following");
    }
}
