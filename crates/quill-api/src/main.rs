//! Quill API Server
//!
//! Simulated blogging-platform API backed by an in-memory store.
//!
//! Author: hephaex@gmail.com

use quill_api::{create_app_state, create_router};
use quill_core::config::{AppConfig, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise the configured level drives the filter
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directives()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("QUILL_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.logging);

    let addr = config.bind_addr();
    let state = create_app_state(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Quill API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
