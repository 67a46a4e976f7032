//! Comment handlers
//!
//! Deleting a comment is a soft delete: the record stays addressable with its
//! content replaced by the deleted sentinel.

use super::ensure_can_modify;
use super::posts::LikeResponse;
use super::views::{comment_view, CommentView};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::DeferredJson;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use quill_core::LikeTarget;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

/// Fetch a comment, soft-deleted ones included
#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment", body = CommentView),
        (status = 404, description = "Comment not found", body = crate::error::ApiError),
    )
)]
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommentView>, AppError> {
    let comment = state
        .store
        .find_comment(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;
    Ok(Json(comment_view(state.store.as_ref(), comment).await?))
}

#[utoipa::path(
    patch,
    path = "/api/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentView),
        (status = 400, description = "Content is required", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 403, description = "Not the author", body = crate::error::ApiError),
        (status = 404, description = "Comment not found or deleted", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: DeferredJson,
) -> Result<Json<CommentView>, AppError> {
    let mut comment = state
        .store
        .find_comment(&id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| AppError::not_found("Comment"))?;
    ensure_can_modify(&user, &comment.author_id, &format!("comment:{id}"), "update")?;

    let request: UpdateCommentRequest = body.decode()?;
    let content = request
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Content is required".to_string()))?;

    comment.content = content;
    comment.updated_at = Utc::now();
    let comment = state.store.update_comment(comment).await?;
    Ok(Json(comment_view(state.store.as_ref(), comment).await?))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 403, description = "Not the author", body = crate::error::ApiError),
        (status = 404, description = "Comment not found", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let comment = state
        .store
        .find_comment(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;
    ensure_can_modify(&user, &comment.author_id, &format!("comment:{id}"), "delete")?;

    state
        .store
        .soft_delete_comment(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    info!(comment_id = %id, user_id = %user.id, "Comment deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Toggle the caller's like on a comment
#[utoipa::path(
    post,
    path = "/api/comments/{id}/like",
    tag = "comments",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn like_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    let toggle = state
        .store
        .toggle_like(&user.id, LikeTarget::Comment, &id)
        .await?;
    Ok(Json(toggle.into()))
}
