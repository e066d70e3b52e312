//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Receipt storage configuration (optional; uploads disabled without it).
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// JWT configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    /// Refresh token expiration in days.
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
}

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_days() -> i64 {
    7
}

/// Receipt storage configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider kind: `s3`, `azblob`, or `fs`.
    pub provider: String,
    /// Bucket or container name (s3/azblob).
    #[serde(default)]
    pub bucket: String,
    /// Endpoint URL (s3).
    #[serde(default)]
    pub endpoint: String,
    /// Access key id (s3) or account name (azblob).
    #[serde(default)]
    pub access_key: String,
    /// Secret access key (s3) or account key (azblob).
    #[serde(default)]
    pub secret_key: String,
    /// Region (s3).
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory (fs provider).
    #[serde(default = "default_fs_root")]
    pub root: String,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_fs_root() -> String {
    "./data/receipts".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Files under `config/` are layered by `RUN_MODE`, then overridden by
    /// `TALA__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
