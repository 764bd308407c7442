//! Layered server configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. an optional TOML file (`hms-server.toml` unless overridden)
//! 3. `HMS__*` environment variables, `__` separating sections,
//!    e.g. `HMS__DATABASE__BACKEND=postgres`

use config::{Config, Environment, File};
use database_layer::{Backend, DatabaseConfig};
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only accepted when `environment` is `development`
pub const DEVELOPMENT_JWT_SECRET: &str = "hms-development-secret-do-not-use-in-production";

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `development` enables pretty logs and the development JWT secret
    pub environment: String,
    pub server: ServerSettings,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub logging: LoggerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerSettings::default(),
            database: DatabaseConfig::default(),
            auth: AuthSettings::default(),
            logging: LoggerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; empty allows none
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub issuer: String,
    pub token_ttl_secs: i64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    pub ownership_lookup_timeout_ms: u64,
    /// Admin account created at startup when no account has its email
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            issuer: "hms-engine".to_string(),
            token_ttl_secs: 8 * 60 * 60,
            secure_cookies: false,
            ownership_lookup_timeout_ms: 2_000,
            bootstrap_admin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AppConfig {
    /// Load from `path` (missing file is fine) and the environment
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("HMS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        if !self.is_development() && self.auth.jwt_secret == DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret must be set outside development".to_string(),
            ));
        }

        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }

        if self.database.backend == Backend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Invalid(
                "database.url is required for the postgres backend".to_string(),
            ));
        }

        Ok(())
    }
}
