//! Repository layer
//!
//! One trait per entity, each exposing the find/create/update/delete/count
//! capabilities the API needs. [`Store`] bundles them so the server can hold a
//! single `Arc<dyn Store>` and pass it explicitly to the auth gateway and the
//! resource handlers.
//!
//! Operations that must be observed atomically (refresh rotation, bulk
//! revocation, cascading post deletion, like toggling, follow creation) are
//! single repository calls so an implementation can run each of them inside
//! one critical section.

mod memory;

pub use memory::MemoryStore;

use crate::models::{Comment, Follow, Like, LikeTarget, Post, RefreshToken, Tag, User};
use crate::pagination::{PageParams, Paginated};
use crate::query::{CommentQuery, PostQuery, TagPredicate, UserQuery};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; id, username and email must be unused
    async fn insert_user(&self, user: User) -> Result<User>;

    async fn find_user(&self, id: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Users matching the query, newest first
    async fn list_users(&self, query: &UserQuery, page: PageParams) -> Result<Paginated<User>>;

    async fn count_users(&self) -> Result<u64>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert_refresh_token(&self, record: RefreshToken) -> Result<RefreshToken>;

    /// Exact-match lookup regardless of revocation state
    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Exact-match lookup restricted to records that are not revoked
    async fn find_active_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Mark one record revoked. Returns false when the id is unknown.
    async fn revoke_refresh_token(&self, id: &str) -> Result<bool>;

    /// Persist `replacement` and revoke `old_id` as one step
    async fn rotate_refresh_token(&self, old_id: &str, replacement: RefreshToken)
        -> Result<RefreshToken>;

    /// Revoke every live record owned by the user; returns how many changed
    async fn revoke_all_refresh_tokens(&self, user_id: &str) -> Result<usize>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: Post) -> Result<Post>;

    async fn find_post(&self, id: &str) -> Result<Option<Post>>;

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    async fn list_posts(&self, query: &PostQuery, page: PageParams) -> Result<Paginated<Post>>;

    /// Replace the stored post with the same id
    async fn update_post(&self, post: Post) -> Result<Post>;

    /// Bump the view counter and return the updated post
    async fn increment_post_views(&self, id: &str) -> Result<Option<Post>>;

    /// Hard delete; also removes the post's comments and every like that
    /// targets the post or one of those comments
    async fn delete_post(&self, id: &str) -> Result<bool>;

    async fn count_posts(&self) -> Result<u64>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> Result<Comment>;

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn list_comments(&self, query: &CommentQuery, page: PageParams)
        -> Result<Paginated<Comment>>;

    async fn update_comment(&self, comment: Comment) -> Result<Comment>;

    /// Overwrite the content with the deleted sentinel and flag the record;
    /// the comment stays in the store
    async fn soft_delete_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn count_comments(&self, query: &CommentQuery) -> Result<u64>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn insert_tag(&self, tag: Tag) -> Result<Tag>;

    async fn find_tag(&self, id: &str) -> Result<Option<Tag>>;

    /// Resolve ids in order, skipping unknown ones
    async fn find_tags(&self, ids: &[String]) -> Result<Vec<Tag>>;

    /// All tags matching every predicate, sorted by name
    async fn list_tags(&self, predicates: &[TagPredicate]) -> Result<Vec<Tag>>;
}

/// Outcome of a like toggle
#[derive(Debug, Clone)]
pub enum LikeToggle {
    Liked(Like),
    Unliked,
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn insert_like(&self, like: Like) -> Result<Like>;

    /// Delete the like keyed by (user, target type, target id) if present,
    /// create it otherwise
    async fn toggle_like(&self, user_id: &str, target_type: LikeTarget, target_id: &str)
        -> Result<LikeToggle>;

    async fn count_likes(&self, target_type: LikeTarget, target_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Fails with a conflict when the pair already exists
    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> Result<Follow>;

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<bool>;
}

/// Every repository capability behind one object
pub trait Store:
    UserRepository
    + RefreshTokenRepository
    + PostRepository
    + CommentRepository
    + TagRepository
    + LikeRepository
    + FollowRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + RefreshTokenRepository
        + PostRepository
        + CommentRepository
        + TagRepository
        + LikeRepository
        + FollowRepository
{
}
