//! Response shapes with embedded relations
//!
//! The store keeps relations as ids. These views resolve them for responses:
//! posts carry their author and tags, comments carry their author, a post
//! summary and a parent summary, follows carry both users.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use quill_core::store::Store;
use quill_core::{Comment, Follow, Paginated, Post, PostStatus, Tag, UserPublic};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub status: PostStatus,
    pub author_id: String,
    pub author: Option<UserPublic>,
    pub tags: Vec<Tag>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentSummary {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author: Option<UserPublic>,
    pub post_id: String,
    pub post: Option<PostSummary>,
    pub parent_comment_id: Option<String>,
    pub parent_comment: Option<CommentSummary>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowView {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub follower: Option<UserPublic>,
    pub following: Option<UserPublic>,
    pub created_at: DateTime<Utc>,
}

async fn public_user(store: &dyn Store, id: &str) -> Result<Option<UserPublic>, AppError> {
    Ok(store.find_user(id).await?.map(|u| u.to_public()))
}

pub async fn post_view(store: &dyn Store, post: Post) -> Result<PostView, AppError> {
    let author = public_user(store, &post.author_id).await?;
    let tags = store.find_tags(&post.tag_ids).await?;

    Ok(PostView {
        id: post.id,
        title: post.title,
        content: post.content,
        excerpt: post.excerpt,
        slug: post.slug,
        status: post.status,
        author_id: post.author_id,
        author,
        tags,
        view_count: post.view_count,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

pub async fn post_page(
    store: &dyn Store,
    page: Paginated<Post>,
) -> Result<Paginated<PostView>, AppError> {
    let mut data = Vec::with_capacity(page.data.len());
    for post in page.data {
        data.push(post_view(store, post).await?);
    }
    Ok(Paginated {
        data,
        pagination: page.pagination,
    })
}

pub async fn comment_view(store: &dyn Store, comment: Comment) -> Result<CommentView, AppError> {
    let author = public_user(store, &comment.author_id).await?;
    let post = store.find_post(&comment.post_id).await?.map(|p| PostSummary {
        id: p.id,
        title: p.title,
        slug: p.slug,
    });
    let parent_comment = match &comment.parent_comment_id {
        Some(parent_id) => store.find_comment(parent_id).await?.map(|c| CommentSummary {
            id: c.id,
            content: c.content,
        }),
        None => None,
    };

    Ok(CommentView {
        id: comment.id,
        content: comment.content,
        author_id: comment.author_id,
        author,
        post_id: comment.post_id,
        post,
        parent_comment_id: comment.parent_comment_id,
        parent_comment,
        is_deleted: comment.is_deleted,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    })
}

pub async fn comment_page(
    store: &dyn Store,
    page: Paginated<Comment>,
) -> Result<Paginated<CommentView>, AppError> {
    let mut data = Vec::with_capacity(page.data.len());
    for comment in page.data {
        data.push(comment_view(store, comment).await?);
    }
    Ok(Paginated {
        data,
        pagination: page.pagination,
    })
}

pub async fn follow_view(store: &dyn Store, follow: Follow) -> Result<FollowView, AppError> {
    Ok(FollowView {
        follower: public_user(store, &follow.follower_id).await?,
        following: public_user(store, &follow.following_id).await?,
        id: follow.id,
        follower_id: follow.follower_id,
        following_id: follow.following_id,
        created_at: follow.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::seed::seed_fixtures;
    use quill_core::store::{CommentRepository, PostRepository};
    use quill_core::MemoryStore;

    #[tokio::test]
    async fn test_post_view_embeds_relations() {
        let store = MemoryStore::new();
        seed_fixtures(&store).await.unwrap();

        let post = store.find_post("post-1").await.unwrap().unwrap();
        let view = post_view(&store, post).await.unwrap();

        assert_eq!(view.author.unwrap().username, "testuser");
        let tag_names: Vec<&str> = view.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["JavaScript", "React"]);

        let json = serde_json::to_value(
            post_view(&store, store.find_post("post-1").await.unwrap().unwrap())
                .await
                .unwrap(),
        )
        .unwrap();
        assert!(json["author"].get("password").is_none());
        assert_eq!(json["viewCount"], 5);
    }

    #[tokio::test]
    async fn test_comment_view_embeds_parent_summary() {
        let store = MemoryStore::new();
        seed_fixtures(&store).await.unwrap();

        let reply = store.find_comment("comment-3").await.unwrap().unwrap();
        let view = comment_view(&store, reply).await.unwrap();

        let parent = view.parent_comment.unwrap();
        assert_eq!(parent.id, "comment-1");
        assert_eq!(parent.content, "This is a test comment");
        assert_eq!(view.post.unwrap().slug, "test-post-by-user");

        let top = store.find_comment("comment-1").await.unwrap().unwrap();
        let json = serde_json::to_value(comment_view(&store, top).await.unwrap()).unwrap();
        assert!(json["parentComment"].is_null());
        assert_eq!(json["author"]["username"], "testuser");
    }
}
