//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config hiretrack.toml`)
//! 3. Environment variables (`HIRETRACK_CORS_ORIGINS`, `HIRETRACK_RATE_LIMIT`,
//!    `HIRETRACK_ADMIN_TOKEN`)
//! 4. CLI flags for host, port, database and backend
//!
//! ## File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/hiretrack/hiretrack.db"
//! backend = "redb"          # or "memory"
//!
//! [security]
//! cors_origins = "https://hr.example.com"
//! rate_limit = 100          # requests per second, 0 disables
//! admin_token = "change-me" # bootstrap ADMIN bearer token
//! ```

use crate::api::ApiSettings;
use clap::ValueEnum;
use hiretrack_core::{HireError, Store};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_CORS_ORIGINS: &str = "HIRETRACK_CORS_ORIGINS";
pub const ENV_RATE_LIMIT: &str = "HIRETRACK_RATE_LIMIT";
pub const ENV_ADMIN_TOKEN: &str = "HIRETRACK_ADMIN_TOKEN";

/// Default rate limit: 100 requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// SECTIONS
// =============================================================================

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb database file (durable).
    #[default]
    Redb,
    /// redb in-memory backend (lost on exit).
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub backend: Backend,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("hiretrack.db"),
            backend: Backend::Redb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Comma-separated origins, or `*` for any. `None` means localhost only.
    pub cors_origins: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Bearer token that authenticates as an ADMIN without a user record.
    pub admin_token: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            admin_token: None,
        }
    }
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, HireError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, HireError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HireError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, HireError> {
        toml::from_str(text)
            .map_err(|e| HireError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are ignored; an unparsable rate limit is logged and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origins) = lookup(ENV_CORS_ORIGINS).filter(|v| !v.trim().is_empty()) {
            self.security.cors_origins = Some(origins);
        }
        if let Some(raw) = lookup(ENV_RATE_LIMIT) {
            match raw.trim().parse::<u32>() {
                Ok(rps) => self.security.rate_limit = rps,
                Err(e) => {
                    tracing::warn!(value = %raw, error = %e, "Ignoring invalid {}", ENV_RATE_LIMIT);
                }
            }
        }
        if let Some(token) = lookup(ENV_ADMIN_TOKEN).filter(|v| !v.is_empty()) {
            self.security.admin_token = Some(token);
        }
    }

    /// Open the configured store.
    pub fn open_store(&self) -> Result<Store, HireError> {
        match self.database.backend {
            Backend::Redb => Store::open(&self.database.path),
            Backend::Memory => Store::in_memory(),
        }
    }

    /// The subset of settings the HTTP layer needs.
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            cors_origins: self.security.cors_origins.clone(),
            rate_limit: self.security.rate_limit,
            admin_token: self.security.admin_token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
