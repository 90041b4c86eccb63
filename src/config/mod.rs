//! Configuration management
//!
//! This module handles loading and parsing configuration for the Taskboard server.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. The auth section
//! has no defaults: the signing secret and the admin credentials must be
//! provided, otherwise `Config::validate` refuses to start the server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the board's frontend)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/taskboard.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Authentication configuration
///
/// Read once at startup and never mutated afterwards.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session tokens
    #[serde(default)]
    pub secret: Option<String>,
    /// Admin username accepted by the login endpoint
    #[serde(default)]
    pub username: Option<String>,
    /// Admin password accepted by the login endpoint
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Borrowed view of a complete auth configuration
#[derive(Clone, Copy)]
pub struct AuthSettings<'a> {
    pub secret: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

impl AuthConfig {
    /// Return the auth settings, or an error naming the first missing value.
    ///
    /// Empty and whitespace-only values count as missing.
    pub fn settings(&self) -> Result<AuthSettings<'_>, ConfigError> {
        Ok(AuthSettings {
            secret: self.secret()?,
            username: required(&self.username, "username")?,
            password: required(&self.password, "password")?,
        })
    }

    /// Just the signing secret, for tools that issue tokens without serving logins
    pub fn secret(&self) -> Result<&str, ConfigError> {
        required(&self.secret, "secret")
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::ValidationError(format!("auth.{} is not configured", name)))
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - TASKBOARD_SERVER_HOST
    /// - TASKBOARD_SERVER_PORT
    /// - TASKBOARD_SERVER_CORS_ORIGIN
    /// - TASKBOARD_DATABASE_DRIVER
    /// - TASKBOARD_DATABASE_URL
    /// - TASKBOARD_AUTH_SECRET
    /// - TASKBOARD_AUTH_USERNAME
    /// - TASKBOARD_AUTH_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Check that everything the server needs at startup is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.settings()?;
        if self.server.cors_origin.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.cors_origin must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("TASKBOARD_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("TASKBOARD_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("TASKBOARD_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("TASKBOARD_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("TASKBOARD_DATABASE_URL") {
            self.database.url = url;
        }

        // Auth configuration
        if let Ok(secret) = std::env::var("TASKBOARD_AUTH_SECRET") {
            self.auth.secret = Some(secret);
        }
        if let Ok(username) = std::env::var("TASKBOARD_AUTH_USERNAME") {
            self.auth.username = Some(username);
        }
        if let Ok(password) = std::env::var("TASKBOARD_AUTH_PASSWORD") {
            self.auth.password = Some(password);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
// Both `tests` and `property_tests` modules use this to prevent race conditions.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "TASKBOARD_SERVER_HOST",
    "TASKBOARD_SERVER_PORT",
    "TASKBOARD_SERVER_CORS_ORIGIN",
    "TASKBOARD_DATABASE_DRIVER",
    "TASKBOARD_DATABASE_URL",
    "TASKBOARD_AUTH_SECRET",
    "TASKBOARD_AUTH_USERNAME",
    "TASKBOARD_AUTH_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
