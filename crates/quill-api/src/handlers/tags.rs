//! Tag handlers

use super::page_params;
use super::users::PageOnlyParams;
use super::views::{post_page, PostView};
use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use quill_core::{Paginated, PostPredicate, PostQuery, PostStatus, Tag, TagPredicate};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TagListParams {
    /// Case-insensitive name substring
    pub search: Option<String>,
}

/// All tags sorted by name
#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    params(TagListParams),
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<TagListParams>,
) -> Result<Json<Vec<Tag>>, AppError> {
    let predicates: Vec<TagPredicate> = params
        .search
        .filter(|s| !s.is_empty())
        .map(TagPredicate::NameContains)
        .into_iter()
        .collect();

    Ok(Json(state.store.list_tags(&predicates).await?))
}

/// Published posts carrying the tag
#[utoipa::path(
    get,
    path = "/api/tags/{slug}/posts",
    tag = "tags",
    params(("slug" = String, Path, description = "Tag slug"), PageOnlyParams),
    responses((status = 200, description = "Paginated posts"))
)]
pub async fn list_tag_posts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    ApiQuery(params): ApiQuery<PageOnlyParams>,
) -> Result<Json<Paginated<PostView>>, AppError> {
    let query = PostQuery::default()
        .with(PostPredicate::TagSlug(slug))
        .with(PostPredicate::Status(PostStatus::Published));

    let page = page_params(&state, params.page, params.limit);
    let posts = state.store.list_posts(&query, page).await?;
    Ok(Json(post_page(state.store.as_ref(), posts).await?))
}
