//! Domain models for the blogging platform
//!
//! This module defines the records held by the store:
//! - User: account information and credentials
//! - RefreshToken: persisted mirror of an issued refresh token
//! - Post, Comment, Tag: authored content
//! - Like, Follow: relations between users and content
//!
//! Relations are stored as ids, never as embedded records. Responses that
//! need the related records are assembled by the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Content written in place of a soft-deleted comment
pub const DELETED_COMMENT_CONTENT: &str = "[deleted]";

/// User role enum
///
/// - Admin: may modify any resource
/// - Moderator: reserved, same rights as User for resource mutations
/// - User: may modify only resources they authored
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Moderator,
    User,
}

impl UserRole {
    /// Convert role to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
            UserRole::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User account model
///
/// The password marker is never serialized; use [`User::to_public`] or
/// serialize the record directly, both omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create an active user with a generated id
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
            bio: None,
            avatar_url: None,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Ownership rule shared by every mutating endpoint: the author of a
    /// resource or an admin may modify it.
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.id == owner_id || self.is_admin()
    }

    /// Convert user to public representation (without the password marker)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            avatar_url: self.avatar_url.clone(),
            role: self.role,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Refresh token record
///
/// Mirrors an issued refresh token so it can be revoked before its natural
/// expiry. Looked up by exact token value only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_revoked: bool,
}

impl RefreshToken {
    pub fn new(token: String, user_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token,
            user_id,
            expires_at,
            created_at: Utc::now(),
            is_revoked: false,
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Publication state of a post
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl std::str::FromStr for PostStatus {
    type Err = crate::QuillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(crate::QuillError::ValidationError(format!(
                "Unknown post status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub status: PostStatus,
    pub author_id: String,
    pub tag_ids: Vec<String>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a post; the slug is derived from the title and the excerpt
    /// falls back to the head of the content.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        excerpt: Option<String>,
        status: PostStatus,
        author_id: impl Into<String>,
        tag_ids: Vec<String>,
    ) -> Self {
        let title = title.into();
        let content = content.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slugify(&title),
            excerpt: excerpt
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| default_excerpt(&content)),
            title,
            content,
            status,
            author_id: author_id.into(),
            tag_ids,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercase the title and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }
    slug
}

/// First 200 characters of the content followed by an ellipsis
pub fn default_excerpt(content: &str) -> String {
    let head: String = content.chars().take(200).collect();
    format!("{head}...")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub post_id: String,
    pub parent_comment_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        content: impl Into<String>,
        author_id: impl Into<String>,
        post_id: impl Into<String>,
        parent_comment_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author_id: author_id.into(),
            post_id: post_id.into(),
            parent_comment_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slugify(&name),
            name,
            description: None,
            color: color.into(),
            created_at: Utc::now(),
        }
    }
}

/// Kind of record a like points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    Post,
    Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub target_type: LikeTarget,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(user_id: impl Into<String>, target_type: LikeTarget, target_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            target_type,
            target_id: target_id.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub fn new(follower_id: impl Into<String>, following_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            follower_id: follower_id.into(),
            following_id: following_id.into(),
            created_at: Utc::now(),
        }
    }
}
