//! User directory and follow handlers

use super::views::{comment_page, follow_view, post_page, CommentView, FollowView, PostView};
use super::page_params;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use quill_core::{
    CommentPredicate, CommentQuery, Paginated, PostPredicate, PostQuery, PostStatus, UserPredicate,
    UserPublic, UserQuery,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive username substring
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserPostsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `draft` or `published`; all statuses when omitted
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageOnlyParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// List users, newest first
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(UserListParams),
    responses((status = 200, description = "Paginated users"))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<UserListParams>,
) -> Result<Json<Paginated<UserPublic>>, AppError> {
    let mut query = UserQuery::default();
    if let Some(search) = params.search.filter(|s| !s.is_empty()) {
        query = query.with(UserPredicate::UsernameContains(search));
    }

    let page = page_params(&state, params.page, params.limit);
    let users = state.store.list_users(&query, page).await?;
    Ok(Json(users.map(|u| u.to_public())))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserPublic),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserPublic>, AppError> {
    let user = state
        .store
        .find_user(&id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(user.to_public()))
}

/// Posts written by a user, any status unless filtered
#[utoipa::path(
    get,
    path = "/api/users/{id}/posts",
    tag = "users",
    params(("id" = String, Path, description = "User id"), UserPostsParams),
    responses((status = 200, description = "Paginated posts"))
)]
pub async fn list_user_posts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<UserPostsParams>,
) -> Result<Json<Paginated<PostView>>, AppError> {
    let mut query = PostQuery::default().with(PostPredicate::AuthorId(id));
    if let Some(status) = params.status.filter(|s| !s.is_empty()) {
        query = query.with(PostPredicate::Status(status.parse::<PostStatus>()?));
    }

    let page = page_params(&state, params.page, params.limit);
    let posts = state.store.list_posts(&query, page).await?;
    Ok(Json(post_page(state.store.as_ref(), posts).await?))
}

/// Non-deleted comments written by a user, newest first
#[utoipa::path(
    get,
    path = "/api/users/{id}/comments",
    tag = "users",
    params(("id" = String, Path, description = "User id"), PageOnlyParams),
    responses((status = 200, description = "Paginated comments"))
)]
pub async fn list_user_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<PageOnlyParams>,
) -> Result<Json<Paginated<CommentView>>, AppError> {
    let query = CommentQuery::default()
        .with(CommentPredicate::AuthorId(id))
        .with(CommentPredicate::NotDeleted);

    let page = page_params(&state, params.page, params.limit);
    let comments = state.store.list_comments(&query, page).await?;
    Ok(Json(comment_page(state.store.as_ref(), comments).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    tag = "users",
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 201, description = "Now following", body = FollowView),
        (status = 400, description = "Cannot follow yourself", body = crate::error::ApiError),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
        (status = 409, description = "Already following", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn follow_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<FollowView>), AppError> {
    if user.id == id {
        return Err(AppError::Validation("Cannot follow yourself".to_string()));
    }
    if state.store.find_user(&id).await?.is_none() {
        return Err(AppError::not_found("User"));
    }

    let follow = state.store.insert_follow(&user.id, &id).await?;
    info!(follower = %user.id, following = %id, "User followed");

    let view = follow_view(state.store.as_ref(), follow).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/follow",
    tag = "users",
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 401, description = "Not authenticated", body = crate::error::ApiError),
        (status = 404, description = "Not following this user", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_follow(&user.id, &id).await? {
        return Err(AppError::NotFound("Not following this user".to_string()));
    }

    info!(follower = %user.id, following = %id, "User unfollowed");
    Ok(StatusCode::NO_CONTENT)
}
