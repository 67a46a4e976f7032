//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::{auth, comments, posts, tags, users};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes mounted under `/api`
///
/// Protected handlers take a `CurrentUser` argument, so authentication is
/// decided per handler rather than by a router layer.
pub fn api_routes() -> Router<Arc<AppState>> {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/logout-all", post(auth::logout_all_handler))
        .route("/auth/verify", get(auth::verify_handler))
        .route("/me", get(auth::me_handler));

    let user_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/posts", get(users::list_user_posts))
        .route("/users/:id/comments", get(users::list_user_comments))
        .route(
            "/users/:id/follow",
            post(users::follow_user).delete(users::unfollow_user),
        );

    let post_routes = Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/slug/:slug", get(posts::get_post_by_slug))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", post(posts::like_post))
        .route(
            "/posts/:id/comments",
            get(posts::list_post_comments).post(posts::create_comment),
        )
        .route("/posts/:id/stats", get(posts::post_stats));

    let comment_routes = Router::new()
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/comments/:id/like", post(comments::like_comment));

    let tag_routes = Router::new()
        .route("/tags", get(tags::list_tags))
        .route("/tags/:slug/posts", get(tags::list_tag_posts));

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(post_routes)
        .merge(comment_routes)
        .merge(tag_routes)
}
