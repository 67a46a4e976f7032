//! Post handlers
//!
//! Listing with typed filters, lookup by id or slug (both count a view),
//! authoring, like toggling, the post's comment thread and its counters.
//!
//! Author: hephaex@gmail.com

use super::views::{comment_page, comment_view, post_page, post_view, CommentView, PostView};
use super::{ensure_can_modify, page_params};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery, DeferredJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use quill_core::models::slugify;
use quill_core::store::LikeToggle;
use quill_core::{
    Comment, CommentPredicate, CommentQuery, CommentSortField, Like, LikeTarget, Paginated, Post,
    PostPredicate, PostQuery, PostSortField, PostStatus, Sort, SortDirection,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Exact tag name
    pub tag: Option<String>,
    /// Exact author username
    pub author: Option<String>,
    /// `draft` or `published`; defaults to `published`
    pub status: Option<String>,
    /// Case-insensitive title substring
    pub search: Option<String>,
    /// `createdAt`, `updatedAt`, `title` or `viewCount`
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

impl PostListParams {
    fn to_query(&self) -> Result<PostQuery, AppError> {
        let status = match non_empty(&self.status) {
            Some(status) => status.parse::<PostStatus>()?,
            None => PostStatus::Published,
        };
        let direction = match non_empty(&self.order) {
            Some(order) => order.parse::<SortDirection>()?,
            None => SortDirection::Desc,
        };
        let field = non_empty(&self.sort)
            .map(PostSortField::parse)
            .unwrap_or_default();

        let mut query = PostQuery::default()
            .with(PostPredicate::Status(status))
            .sorted_by(Sort::new(field, direction));
        if let Some(tag) = non_empty(&self.tag) {
            query = query.with(PostPredicate::TagName(tag.to_string()));
        }
        if let Some(author) = non_empty(&self.author) {
            query = query.with(PostPredicate::AuthorUsername(author.to_string()));
        }
        if let Some(search) = non_empty(&self.search) {
            query = query.with(PostPredicate::TitleContains(search.to_string()));
        }
        Ok(query)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `true` to return top-level comments only
    pub parent_only: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub tag_ids: Option<Vec<String>>,
}

/// Partial update; only supplied non-empty fields are applied
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<PostStatus>,
    pub tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    pub parent_comment_id: Option<String>,
}

/// Result of a like toggle
#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<Like>,
}

impl From<LikeToggle> for LikeResponse {
    fn from(toggle: LikeToggle) -> Self {
        match toggle {
            LikeToggle::Liked(like) => Self {
                liked: true,
                like: Some(like),
            },
            LikeToggle::Unliked => Self {
                liked: false,
                like: None,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub post_id: String,
    pub likes: u64,
    pub comments: u64,
    pub views: u64,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// List posts
///
/// Only published posts are returned unless `status` is given. Default
/// order is newest first.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(PostListParams),
    responses(
        (status = 200, description = "Paginated posts"),
        (status = 400, description = "Invalid filter value", body = crate::error::ApiError),
    )
)]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PostListParams>,
) -> Result<Json<Paginated<PostView>>, AppError> {
    let query = params.to_query()?;
    let page = page_params(&state, params.page, params.limit);

    let posts = state.store.list_posts(&query, page).await?;
    Ok(Json(post_page(state.store.as_ref(), posts).await?))
}

/// Fetch a post by id and count the view
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = PostView),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    )
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, AppError> {
    let post = state
        .store
        .increment_post_views(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    Ok(Json(post_view(state.store.as_ref(), post).await?))
}

/// Fetch a post by slug and count the view
#[utoipa::path(
    get,
    path = "/api/posts/slug/{slug}",
    tag = "posts",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = PostView),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    )
)]
pub async fn get_post_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<PostView>, AppError> {
    let found = state
        .store
        .find_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let post = state
        .store
        .increment_post_views(&found.id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    Ok(Json(post_view(state.store.as_ref(), post).await?))
}

/// Create a post owned by the caller
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 400, description = "Title and content are required", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    let (Some(title), Some(content)) = (non_empty(&request.title), non_empty(&request.content))
    else {
        return Err(AppError::Validation(
            "Title and content are required".to_string(),
        ));
    };

    let tag_ids = known_tag_ids(&state, request.tag_ids.unwrap_or_default()).await?;
    let post = Post::new(
        title,
        content,
        request.excerpt,
        request.status.unwrap_or_default(),
        user.id.clone(),
        tag_ids,
    );

    let post = state.store.insert_post(post).await?;
    info!(post_id = %post.id, author_id = %user.id, "Post created");

    let view = post_view(state.store.as_ref(), post).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostView),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 403, description = "Not the author", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: DeferredJson,
) -> Result<Json<PostView>, AppError> {
    let mut post = state
        .store
        .find_post(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    ensure_can_modify(&user, &post.author_id, &format!("post:{id}"), "update")?;

    let request: UpdatePostRequest = body.decode()?;

    if let Some(title) = non_empty(&request.title) {
        post.slug = slugify(title);
        post.title = title.to_string();
    }
    if let Some(content) = non_empty(&request.content) {
        post.content = content.to_string();
    }
    if let Some(excerpt) = non_empty(&request.excerpt) {
        post.excerpt = excerpt.to_string();
    }
    if let Some(status) = request.status {
        post.status = status;
    }
    if let Some(tag_ids) = request.tag_ids {
        post.tag_ids = known_tag_ids(&state, tag_ids).await?;
    }
    post.updated_at = Utc::now();

    let post = state.store.update_post(post).await?;
    Ok(Json(post_view(state.store.as_ref(), post).await?))
}

/// Delete a post with its comments and likes
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 403, description = "Not the author", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post = state
        .store
        .find_post(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    ensure_can_modify(&user, &post.author_id, &format!("post:{id}"), "delete")?;

    if !state.store.delete_post(&id).await? {
        return Err(AppError::not_found("Post"));
    }

    info!(post_id = %id, user_id = %user.id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's like on a post
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let toggle = state.store.toggle_like(&user.id, LikeTarget::Post, &id).await?;
    Ok(Json(toggle.into()))
}

/// Non-deleted comments on a post, oldest first
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "posts",
    params(("id" = String, Path, description = "Post id"), CommentListParams),
    responses((status = 200, description = "Paginated comments"))
)]
pub async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<CommentListParams>,
) -> Result<Json<Paginated<CommentView>>, AppError> {
    let mut query = CommentQuery::default()
        .with(CommentPredicate::PostId(id))
        .with(CommentPredicate::NotDeleted)
        .sorted_by(Sort::new(CommentSortField::CreatedAt, SortDirection::Asc));
    if params.parent_only.as_deref() == Some("true") {
        query = query.with(CommentPredicate::TopLevel);
    }

    let page = page_params(&state, params.page, params.limit);
    let comments = state.store.list_comments(&query, page).await?;
    Ok(Json(comment_page(state.store.as_ref(), comments).await?))
}

/// Comment on a post
///
/// An unknown `parentCommentId` is dropped and the comment is created at the
/// top level.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentView),
        (status = 400, description = "Content is required", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    if state.store.find_post(&id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }
    let Some(content) = non_empty(&request.content) else {
        return Err(AppError::Validation("Content is required".to_string()));
    };

    let parent_comment_id = match non_empty(&request.parent_comment_id) {
        Some(parent_id) => state.store.find_comment(parent_id).await?.map(|c| c.id),
        None => None,
    };

    let comment = Comment::new(content, user.id.clone(), id, parent_comment_id);
    let comment = state.store.insert_comment(comment).await?;
    info!(comment_id = %comment.id, post_id = %comment.post_id, "Comment created");

    let view = comment_view(state.store.as_ref(), comment).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/stats",
    tag = "posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post counters", body = PostStats),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    )
)]
pub async fn post_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostStats>, AppError> {
    let post = state
        .store
        .find_post(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    let likes = state.store.count_likes(LikeTarget::Post, &id).await?;
    let comments = state
        .store
        .count_comments(
            &CommentQuery::default()
                .with(CommentPredicate::PostId(id.clone()))
                .with(CommentPredicate::NotDeleted),
        )
        .await?;

    Ok(Json(PostStats {
        post_id: id,
        likes,
        comments,
        views: post.view_count,
    }))
}

/// Keep only ids naming existing tags, preserving order
async fn known_tag_ids(state: &AppState, ids: Vec<String>) -> Result<Vec<String>, AppError> {
    let tags = state.store.find_tags(&ids).await?;
    Ok(tags.into_iter().map(|t| t.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_default_to_published_newest_first() {
        let query = PostListParams::default().to_query().unwrap();
        assert_eq!(
            query.predicates,
            vec![PostPredicate::Status(PostStatus::Published)]
        );
        assert_eq!(
            query.sort,
            Sort::new(PostSortField::CreatedAt, SortDirection::Desc)
        );
    }

    #[test]
    fn test_list_params_build_typed_filters() {
        let params = PostListParams {
            tag: Some("React".to_string()),
            author: Some("testuser".to_string()),
            status: Some("draft".to_string()),
            search: Some("post".to_string()),
            sort: Some("viewCount".to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        };
        let query = params.to_query().unwrap();

        assert!(query.predicates.contains(&PostPredicate::Status(PostStatus::Draft)));
        assert!(query.predicates.contains(&PostPredicate::TagName("React".to_string())));
        assert!(query
            .predicates
            .contains(&PostPredicate::AuthorUsername("testuser".to_string())));
        assert!(query
            .predicates
            .contains(&PostPredicate::TitleContains("post".to_string())));
        assert_eq!(query.sort, Sort::new(PostSortField::ViewCount, SortDirection::Asc));
    }

    #[test]
    fn test_list_params_reject_unknown_status() {
        let params = PostListParams {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.to_query(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_like_response_shape() {
        let unliked = serde_json::to_value(LikeResponse::from(LikeToggle::Unliked)).unwrap();
        assert_eq!(unliked, serde_json::json!({ "liked": false }));

        let like = Like::new("user-1", LikeTarget::Post, "post-1");
        let liked = serde_json::to_value(LikeResponse::from(LikeToggle::Liked(like))).unwrap();
        assert_eq!(liked["liked"], true);
        assert_eq!(liked["like"]["targetType"], "post");
    }
}
