//! Quill Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for local development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Token signing and lifetime settings
    pub auth: AuthConfig,

    /// List endpoint defaults
    pub pagination: PaginationConfig,

    /// Fixture seeding
    pub seed: SeedConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overwrite every field whose variable `lookup` resolves
    ///
    /// Shared by [`AppConfig::from_env`] and [`AppConfig::with_env_override`]
    /// so both paths honour the same keys.
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Some(enabled) = lookup("CORS_ENABLED") {
            self.server.cors_enabled = parse_var("CORS_ENABLED", enabled)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Auth
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }
        if let Some(audience) = lookup("JWT_AUDIENCE") {
            self.auth.audience = audience;
        }
        if let Some(secs) = lookup("JWT_ACCESS_EXPIRATION_SECS") {
            self.auth.access_ttl_secs = parse_var("JWT_ACCESS_EXPIRATION_SECS", secs)?;
        }
        if let Some(days) = lookup("JWT_REFRESH_EXPIRATION_DAYS") {
            self.auth.refresh_ttl_days = parse_var("JWT_REFRESH_EXPIRATION_DAYS", days)?;
        }

        // Pagination
        if let Some(limit) = lookup("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = parse_var("PAGINATION_DEFAULT_LIMIT", limit)?;
        }
        if let Some(limit) = lookup("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = parse_var("PAGINATION_MAX_LIMIT", limit)?;
        }

        // Seed
        if let Some(enabled) = lookup("SEED_FIXTURES") {
            self.seed.enabled = parse_var("SEED_FIXTURES", enabled)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            let normalized = level.to_ascii_lowercase();
            if !LOG_LEVELS.contains(&normalized.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_LEVEL".to_string(),
                    value: level,
                });
            }
            self.logging.level = normalized;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Allowed origins for CORS (empty allows any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_enabled: true,
            cors_origins: vec![],
        }
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign access and refresh tokens
    pub jwt_secret: String,

    /// `iss` claim written and required on every token
    pub issuer: String,

    /// `aud` claim written and required on every token
    pub audience: String,

    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in days
    pub refresh_ttl_days: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "quill-development-secret-change-me".to_string(),
            issuer: "quill-api".to_string(),
            audience: "quill-client".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_days: 7,
        }
    }
}

/// Pagination defaults shared by list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Fixture seeding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Install the fixture users, posts and comments at startup
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    ///
    /// The configured level applies to the server crates and request
    /// tracing; audit events stay visible at `info` regardless.
    pub fn filter_directives(&self) -> String {
        let level = &self.level;
        format!("quill_api={level},quill_core={level},tower_http={level},audit=info")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::QuillError {
    fn from(err: ConfigError) -> Self {
        crate::QuillError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.refresh_ttl_days, 7);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(config.seed.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [auth]
            issuer = "custom-issuer"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.issuer, "custom-issuer");
        assert_eq!(config.auth.audience, "quill-client");
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = parse_var::<u16>("API_PORT", "not-a-port".to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("API_PORT"));
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [auth]
            issuer = "file-issuer"
            refresh_ttl_days = 30

            [pagination]
            max_limit = 20

            [seed]
            enabled = true

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        config
            .apply_env(lookup_from(&[
                ("JWT_ISSUER", "env-issuer"),
                ("PAGINATION_MAX_LIMIT", "50"),
                ("SEED_FIXTURES", "false"),
                ("LOG_LEVEL", "DEBUG"),
                ("LOG_FORMAT", "json"),
            ]))
            .unwrap();

        assert_eq!(config.auth.issuer, "env-issuer");
        assert_eq!(config.pagination.max_limit, 50);
        assert!(!config.seed.enabled);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);

        // keys absent from the environment keep the file values
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.auth.refresh_ttl_days, 30);
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup_from(&[("SEED_FIXTURES", "sometimes")]))
            .unwrap_err();
        assert!(err.to_string().contains("SEED_FIXTURES"));

        let err = config
            .apply_env(lookup_from(&[("LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "LOG_LEVEL"));
    }

    #[test]
    fn test_filter_directives_follow_level() {
        let logging = LoggingConfig {
            level: "warn".to_string(),
            json_format: false,
        };
        assert_eq!(
            logging.filter_directives(),
            "quill_api=warn,quill_core=warn,tower_http=warn,audit=info"
        );
    }

    #[test]
    fn test_bind_addr() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }
}
