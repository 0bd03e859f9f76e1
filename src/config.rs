use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MemoryConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// `file:<path>` for a local SQLite file, `libsql://…` (or http/https) for Turso.
    /// Unset means the in-memory fallback store.
    pub database_url: Option<String>,
    /// Required for the networked scheme.
    pub auth_token: Option<String>,
    /// Abort startup instead of degrading to the in-memory store.
    pub require_durable: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 3100,
        }
    }
}

/// Returns `~/.cursor10x/`
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cursor10x")
}

/// Returns the default config file path: `~/.cursor10x/config.toml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

impl MemoryConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoryConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (TURSO_DATABASE_URL, TURSO_AUTH_TOKEN, LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Some(val) = non_empty_env("TURSO_DATABASE_URL") {
            self.storage.database_url = Some(val);
        }
        if let Some(val) = non_empty_env("TURSO_AUTH_TOKEN") {
            self.storage.auth_token = Some(val);
        }
        if let Some(val) = non_empty_env("LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// The database URL cut to a loggable prefix; tokens never reach the log.
    pub fn redacted_database_url(&self) -> String {
        match self.storage.database_url.as_deref() {
            Some(url) if url.chars().count() > 15 => {
                format!("{}...", url.chars().take(15).collect::<String>())
            }
            Some(url) => url.to_string(),
            None => "not set".into(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MemoryConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.server.port, 3100);
        assert!(config.storage.database_url.is_none());
        assert!(!config.storage.require_durable);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
database_url = "file:/tmp/memory.db"
require_durable = true
"#;
        let config: MemoryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.database_url.as_deref(), Some("file:/tmp/memory.db"));
        assert!(config.storage.require_durable);
        // defaults still apply for unset fields
        assert_eq!(config.server.transport, "stdio");
        assert!(config.storage.auth_token.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MemoryConfig::default();
        std::env::set_var("TURSO_DATABASE_URL", "libsql://example.turso.io");
        std::env::set_var("TURSO_AUTH_TOKEN", "secret");
        std::env::set_var("LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(
            config.storage.database_url.as_deref(),
            Some("libsql://example.turso.io")
        );
        assert_eq!(config.storage.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("TURSO_DATABASE_URL");
        std::env::remove_var("TURSO_AUTH_TOKEN");
        std::env::remove_var("LOG_LEVEL");
    }

    #[test]
    fn redacts_long_urls() {
        let mut config = MemoryConfig::default();
        assert_eq!(config.redacted_database_url(), "not set");
        config.storage.database_url = Some("libsql://my-database-name.turso.io".into());
        assert_eq!(config.redacted_database_url(), "libsql://my-dat...");
    }
}
