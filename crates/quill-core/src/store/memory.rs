//! In-memory store
//!
//! Every collection lives behind one `RwLock`, so multi-record operations
//! (rotation, bulk revocation, cascading deletes) run inside a single write
//! guard and are never observed half-applied. Collections are kept in
//! insertion order; list sorts are stable on top of that order.

use super::{
    CommentRepository, FollowRepository, LikeRepository, LikeToggle, PostRepository,
    RefreshTokenRepository, TagRepository, UserRepository,
};
use crate::models::{
    Comment, Follow, Like, LikeTarget, Post, RefreshToken, Tag, User, DELETED_COMMENT_CONTENT,
};
use crate::pagination::{PageParams, Paginated};
use crate::query::{CommentQuery, PostQuery, TagPredicate, UserQuery};
use crate::{QuillError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    tags: Vec<Tag>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
}

impl Tables {
    fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }
}

/// Process-local store backing every repository trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(QuillError::Conflict(format!("User id {} already exists", user.id)));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(QuillError::Conflict("Username already exists".to_string()));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(QuillError::Conflict("Email already exists".to_string()));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, query: &UserQuery, page: PageParams) -> Result<Paginated<User>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<User> = tables
            .users
            .iter()
            .filter(|u| query.matches(u))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.apply(matched))
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.tables.read().await.users.len() as u64)
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert_refresh_token(&self, record: RefreshToken) -> Result<RefreshToken> {
        self.tables.write().await.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables.refresh_tokens.iter().find(|r| r.token == token).cloned())
    }

    async fn find_active_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .iter()
            .find(|r| r.token == token && !r.is_revoked)
            .cloned())
    }

    async fn revoke_refresh_token(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.is_revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_refresh_token(
        &self,
        old_id: &str,
        replacement: RefreshToken,
    ) -> Result<RefreshToken> {
        let mut tables = self.tables.write().await;
        let old = tables
            .refresh_tokens
            .iter_mut()
            .find(|r| r.id == old_id && !r.is_revoked)
            .ok_or_else(|| QuillError::not_found("Refresh token"))?;
        old.is_revoked = true;
        tables.refresh_tokens.push(replacement.clone());
        debug!(old_id, new_id = %replacement.id, "Rotated refresh token");
        Ok(replacement)
    }

    async fn revoke_all_refresh_tokens(&self, user_id: &str) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let mut revoked = 0;
        for record in tables
            .refresh_tokens
            .iter_mut()
            .filter(|r| r.user_id == user_id && !r.is_revoked)
        {
            record.is_revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: Post) -> Result<Post> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.id == post.id) {
            return Err(QuillError::Conflict(format!("Post id {} already exists", post.id)));
        }
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: &str) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn list_posts(&self, query: &PostQuery, page: PageParams) -> Result<Paginated<Post>> {
        let tables = self.tables.read().await;
        let author = |id: &str| tables.user(id);
        let tag = |id: &str| tables.tag(id);
        let mut matched: Vec<Post> = tables
            .posts
            .iter()
            .filter(|p| query.matches(p, &author, &tag))
            .cloned()
            .collect();
        matched.sort_by(|a, b| query.compare(a, b));
        Ok(page.apply(matched))
    }

    async fn update_post(&self, post: Post) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| QuillError::not_found("Post"))?;
        *slot = post.clone();
        Ok(post)
    }

    async fn increment_post_views(&self, id: &str) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables.posts.iter_mut().find(|p| p.id == id).map(|post| {
            post.view_count += 1;
            post.clone()
        }))
    }

    async fn delete_post(&self, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }

        let comment_ids: HashSet<String> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == id)
            .map(|c| c.id.clone())
            .collect();
        tables.comments.retain(|c| c.post_id != id);
        tables.likes.retain(|l| match l.target_type {
            LikeTarget::Post => l.target_id != id,
            LikeTarget::Comment => !comment_ids.contains(&l.target_id),
        });

        debug!(post_id = id, comments = comment_ids.len(), "Deleted post with dependents");
        Ok(true)
    }

    async fn count_posts(&self) -> Result<u64> {
        Ok(self.tables.read().await.posts.len() as u64)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(QuillError::not_found("Post"));
        }
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(
        &self,
        query: &CommentQuery,
        page: PageParams,
    ) -> Result<Paginated<Comment>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| query.compare(a, b));
        Ok(page.apply(matched))
    }

    async fn update_comment(&self, comment: Comment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| QuillError::not_found("Comment"))?;
        *slot = comment.clone();
        Ok(comment)
    }

    async fn soft_delete_comment(&self, id: &str) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.iter_mut().find(|c| c.id == id).map(|comment| {
            comment.content = DELETED_COMMENT_CONTENT.to_string();
            comment.is_deleted = true;
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn count_comments(&self, query: &CommentQuery) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().filter(|c| query.matches(c)).count() as u64)
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn insert_tag(&self, tag: Tag) -> Result<Tag> {
        let mut tables = self.tables.write().await;
        if tables.tags.iter().any(|t| t.id == tag.id || t.slug == tag.slug) {
            return Err(QuillError::Conflict(format!("Tag {} already exists", tag.name)));
        }
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    async fn find_tag(&self, id: &str) -> Result<Option<Tag>> {
        Ok(self.tables.read().await.tag(id).cloned())
    }

    async fn find_tags(&self, ids: &[String]) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.tag(id)).cloned().collect())
    }

    async fn list_tags(&self, predicates: &[TagPredicate]) -> Result<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Tag> = tables
            .tags
            .iter()
            .filter(|t| predicates.iter().all(|p| p.matches(t)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn insert_like(&self, like: Like) -> Result<Like> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.likes.iter().any(|l| {
            l.user_id == like.user_id
                && l.target_type == like.target_type
                && l.target_id == like.target_id
        });
        if duplicate {
            return Err(QuillError::Conflict("Already liked".to_string()));
        }
        tables.likes.push(like.clone());
        Ok(like)
    }

    async fn toggle_like(
        &self,
        user_id: &str,
        target_type: LikeTarget,
        target_id: &str,
    ) -> Result<LikeToggle> {
        let mut tables = self.tables.write().await;
        let existing = tables.likes.iter().position(|l| {
            l.user_id == user_id && l.target_type == target_type && l.target_id == target_id
        });
        match existing {
            Some(index) => {
                tables.likes.remove(index);
                Ok(LikeToggle::Unliked)
            }
            None => {
                let like = Like::new(user_id, target_type, target_id);
                tables.likes.push(like.clone());
                Ok(LikeToggle::Liked(like))
            }
        }
    }

    async fn count_likes(&self, target_type: LikeTarget, target_id: &str) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|l| l.target_type == target_type && l.target_id == target_id)
            .count() as u64)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> Result<Follow> {
        let mut tables = self.tables.write().await;
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Err(QuillError::Conflict("Already following".to_string()));
        }
        let follow = Follow::new(follower_id, following_id);
        tables.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(tables.follows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostStatus, UserRole};
    use crate::query::{CommentPredicate, PostPredicate, UserPredicate};
    use chrono::Duration;
    use std::sync::Arc;

    async fn store_with_post() -> (MemoryStore, User, Post) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(User::new("writer", "writer@example.com", "pw", UserRole::User))
            .await
            .unwrap();
        let post = store
            .insert_post(Post::new(
                "Hello World",
                "body",
                None,
                PostStatus::Published,
                user.id.clone(),
                vec![],
            ))
            .await
            .unwrap();
        (store, user, post)
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let store = MemoryStore::new();
        store
            .insert_user(User::new("alice", "alice@example.com", "pw", UserRole::User))
            .await
            .unwrap();

        let same_name = User::new("alice", "other@example.com", "pw", UserRole::User);
        assert!(matches!(store.insert_user(same_name).await, Err(QuillError::Conflict(_))));

        let same_email = User::new("bob", "alice@example.com", "pw", UserRole::User);
        assert!(matches!(store.insert_user(same_email).await, Err(QuillError::Conflict(_))));

        assert_eq!(store.count_users().await.unwrap(), 1);
        assert!(store.find_user_by_email("alice@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_user_search() {
        let store = MemoryStore::new();
        for name in ["alice", "Alicia", "bob"] {
            store
                .insert_user(User::new(name, format!("{name}@example.com"), "pw", UserRole::User))
                .await
                .unwrap();
        }
        let query = UserQuery::default().with(UserPredicate::UsernameContains("ALI".to_string()));
        let page = store.list_users(&query, PageParams::default()).await.unwrap();
        assert_eq!(page.pagination.total_count, 2);
    }

    #[tokio::test]
    async fn test_rotation_revokes_old_record() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::days(7);
        let old = store
            .insert_refresh_token(RefreshToken::new("old".into(), "user-1".into(), expires))
            .await
            .unwrap();

        let replacement = RefreshToken::new("new".into(), "user-1".into(), expires);
        store.rotate_refresh_token(&old.id, replacement).await.unwrap();

        assert!(store.find_active_refresh_token("old").await.unwrap().is_none());
        assert!(store.find_refresh_token("old").await.unwrap().unwrap().is_revoked);
        assert!(store.find_active_refresh_token("new").await.unwrap().is_some());

        let again = RefreshToken::new("newer".into(), "user-1".into(), expires);
        assert!(store.rotate_refresh_token(&old.id, again).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_rotation_has_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let expires = Utc::now() + Duration::days(7);
        let old = store
            .insert_refresh_token(RefreshToken::new("old".into(), "user-1".into(), expires))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let old_id = old.id.clone();
            handles.push(tokio::spawn(async move {
                let replacement = RefreshToken::new(format!("new-{i}"), "user-1".into(), expires);
                store.rotate_refresh_token(&old_id, replacement).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_owner() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::days(7);
        for (token, user) in [("a", "user-1"), ("b", "user-1"), ("c", "user-2")] {
            store
                .insert_refresh_token(RefreshToken::new(token.into(), user.into(), expires))
                .await
                .unwrap();
        }

        assert_eq!(store.revoke_all_refresh_tokens("user-1").await.unwrap(), 2);
        assert_eq!(store.revoke_all_refresh_tokens("user-1").await.unwrap(), 0);
        assert!(store.find_active_refresh_token("c").await.unwrap().is_some());
        for token in ["a", "b"] {
            assert!(store.find_refresh_token(token).await.unwrap().unwrap().is_revoked);
        }
    }

    #[tokio::test]
    async fn test_post_listing_filters_and_paginates() {
        let (store, user, _) = store_with_post().await;
        for i in 0..4 {
            store
                .insert_post(Post::new(
                    format!("Draft {i}"),
                    "body",
                    None,
                    PostStatus::Draft,
                    user.id.clone(),
                    vec![],
                ))
                .await
                .unwrap();
        }

        let drafts = PostQuery::default().with(PostPredicate::Status(PostStatus::Draft));
        let page = store
            .list_posts(&drafts, PageParams::new(Some(2), Some(3)))
            .await
            .unwrap();
        assert_eq!(page.pagination.total_count, 4);
        assert_eq!(page.data.len(), 1);

        let by_author = PostQuery::default().with(PostPredicate::AuthorUsername("writer".into()));
        let page = store.list_posts(&by_author, PageParams::default()).await.unwrap();
        assert_eq!(page.pagination.total_count, 5);
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let (store, user, post) = store_with_post().await;
        let comment = store
            .insert_comment(Comment::new("hi", user.id.clone(), post.id.clone(), None))
            .await
            .unwrap();
        store.toggle_like(&user.id, LikeTarget::Post, &post.id).await.unwrap();
        store.toggle_like(&user.id, LikeTarget::Comment, &comment.id).await.unwrap();

        assert!(store.delete_post(&post.id).await.unwrap());
        assert!(store.find_post(&post.id).await.unwrap().is_none());
        assert!(store.find_comment(&comment.id).await.unwrap().is_none());
        assert_eq!(store.count_likes(LikeTarget::Post, &post.id).await.unwrap(), 0);
        assert_eq!(store.count_likes(LikeTarget::Comment, &comment.id).await.unwrap(), 0);

        assert!(!store.delete_post(&post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_comment_keeps_record() {
        let (store, user, post) = store_with_post().await;
        let comment = store
            .insert_comment(Comment::new("hi", user.id.clone(), post.id.clone(), None))
            .await
            .unwrap();

        let deleted = store.soft_delete_comment(&comment.id).await.unwrap().unwrap();
        assert!(deleted.is_deleted);
        assert_eq!(deleted.content, DELETED_COMMENT_CONTENT);

        let live = CommentQuery::default()
            .with(CommentPredicate::PostId(post.id.clone()))
            .with(CommentPredicate::NotDeleted);
        assert_eq!(store.count_comments(&live).await.unwrap(), 0);
        assert!(store.find_comment(&comment.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let store = MemoryStore::new();
        let orphan = Comment::new("hi", "user-1", "missing", None);
        assert!(matches!(store.insert_comment(orphan).await, Err(QuillError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_toggle() {
        let (store, user, post) = store_with_post().await;

        let first = store.toggle_like(&user.id, LikeTarget::Post, &post.id).await.unwrap();
        assert!(matches!(first, LikeToggle::Liked(_)));
        assert_eq!(store.count_likes(LikeTarget::Post, &post.id).await.unwrap(), 1);

        let second = store.toggle_like(&user.id, LikeTarget::Post, &post.id).await.unwrap();
        assert!(matches!(second, LikeToggle::Unliked));
        assert_eq!(store.count_likes(LikeTarget::Post, &post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_uniqueness() {
        let store = MemoryStore::new();
        store.insert_follow("user-1", "user-2").await.unwrap();

        let err = store.insert_follow("user-1", "user-2").await.unwrap_err();
        assert_eq!(err.to_string(), "Already following");

        assert!(store.delete_follow("user-1", "user-2").await.unwrap());
        assert!(!store.delete_follow("user-1", "user-2").await.unwrap());
        // the pair can be followed again once removed
        store.insert_follow("user-1", "user-2").await.unwrap();
    }

    #[tokio::test]
    async fn test_tags_sorted_by_name() {
        let store = MemoryStore::new();
        for name in ["React", "JavaScript", "Node.js"] {
            store.insert_tag(Tag::new(name, "#000000")).await.unwrap();
        }
        let names: Vec<String> = store
            .list_tags(&[])
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["JavaScript", "Node.js", "React"]);

        let found = store
            .list_tags(&[TagPredicate::NameContains("script".into())])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
