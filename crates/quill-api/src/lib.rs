//! Quill API - simulated blogging platform server
//!
//! Serves users, posts, comments, tags, likes and follows over HTTP from an
//! in-memory store, with JWT access tokens and rotating refresh tokens.
//!
//! Author: hephaex@gmail.com

pub mod audit;
pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{http::HeaderValue, middleware as axum_middleware, routing::get, Router};
use handlers::health;
use quill_core::seed::seed_fixtures;
use quill_core::{AppConfig, MemoryStore, QuillError, ServerConfig, Store};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
        handlers::auth::login_handler,
        handlers::auth::refresh_handler,
        handlers::auth::logout_handler,
        handlers::auth::logout_all_handler,
        handlers::auth::verify_handler,
        handlers::auth::me_handler,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::list_user_posts,
        handlers::users::list_user_comments,
        handlers::users::follow_user,
        handlers::users::unfollow_user,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::get_post_by_slug,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::posts::like_post,
        handlers::posts::list_post_comments,
        handlers::posts::create_comment,
        handlers::posts::post_stats,
        handlers::comments::get_comment,
        handlers::comments::update_comment,
        handlers::comments::delete_comment,
        handlers::comments::like_comment,
        handlers::tags::list_tags,
        handlers::tags::list_tag_posts,
    ),
    components(schemas(
        error::ApiError,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::RefreshTokenRequest,
        auth::TokenPair,
        auth::VerifyResponse,
        quill_core::UserPublic,
        quill_core::UserRole,
        quill_core::PostStatus,
        quill_core::Tag,
        quill_core::Like,
        quill_core::LikeTarget,
        quill_core::PaginationMeta,
        handlers::views::PostView,
        handlers::views::PostSummary,
        handlers::views::CommentView,
        handlers::views::CommentSummary,
        handlers::views::FollowView,
        handlers::posts::CreatePostRequest,
        handlers::posts::UpdatePostRequest,
        handlers::posts::CreateCommentRequest,
        handlers::posts::LikeResponse,
        handlers::posts::PostStats,
        handlers::comments::UpdateCommentRequest,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::MetricsResponse,
        handlers::health::EndpointSummary,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness, readiness and metrics"),
        (name = "auth", description = "Login, token refresh and logout"),
        (name = "users", description = "User directory and follows"),
        (name = "posts", description = "Posts, likes and post comments"),
        (name = "comments", description = "Comment editing and likes"),
        (name = "tags", description = "Tags and tagged posts"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the application state over a fresh in-memory store, seeding the
/// fixture dataset when enabled
pub async fn create_app_state(config: AppConfig) -> Result<Arc<AppState>, QuillError> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(config, store));
    if state.config.seed.enabled {
        seed_fixtures(state.store.as_ref()).await?;
    }
    state.set_ready(true);
    Ok(state)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if server.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the full router: probes, the `/api` tree, API docs and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api", routes::api_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::metrics_middleware,
        ))
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ));

    if state.config.server.cors_enabled {
        router = router.layer(cors_layer(&state.config.server));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_api_path() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/auth/login",
            "/api/auth/logout-all",
            "/api/posts/{id}",
            "/api/posts/slug/{slug}",
            "/api/comments/{id}/like",
            "/api/tags/{slug}/posts",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn test_create_app_state_seeds_when_enabled() {
        let state = create_app_state(AppConfig::default()).await.unwrap();
        assert!(state.is_ready());
        assert_eq!(state.store.count_users().await.unwrap(), 3);

        let mut config = AppConfig::default();
        config.seed.enabled = false;
        let empty = create_app_state(config).await.unwrap();
        assert_eq!(empty.store.count_users().await.unwrap(), 0);
    }
}
