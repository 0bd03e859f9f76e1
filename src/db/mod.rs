//! Storage backend selection.
//!
//! [`select_backend`] runs once at startup: it tries the durable backend named by
//! the connection descriptor (local SQLite file or networked libSQL), verifies it
//! with a probe, schema creation and a write/read self-test, and otherwise settles
//! on the in-process fallback store. The chosen store is returned as an object and
//! injected everywhere; there is no reconnect loop.

pub mod executor;
pub mod local;
pub mod remote;
pub mod schema;
pub mod statement;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::StorageConfig;
use crate::memory::fallback::FallbackStore;
use crate::memory::sql::SqlStore;
use crate::memory::store::MemoryStore;
use executor::SqlExecutor;
use local::LocalExecutor;
use remote::RemoteExecutor;
use statement::StatementAdapter;

/// Problems with the connection descriptor itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("database URL is not set")]
    MissingUrl,
    #[error("unsupported database URL scheme {scheme:?}: must start with file:, libsql://, https:// or http://")]
    UnsupportedScheme { scheme: String },
    #[error("auth token is required for remote database")]
    MissingAuthToken,
}

/// Where a connection descriptor points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// `file:` URL, resolved to an absolute path.
    LocalFile(PathBuf),
    /// Networked libSQL endpoint.
    Remote(String),
}

impl DatabaseTarget {
    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Classify a connection descriptor. Relative `file:` paths resolve against the
/// current directory.
pub fn parse_database_url(url: &str) -> Result<DatabaseTarget, ConfigError> {
    let url = url.trim();

    if let Some(rest) = url.strip_prefix("file:") {
        let raw = rest.strip_prefix("//").unwrap_or(rest);
        let path = PathBuf::from(raw);
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };
        return Ok(DatabaseTarget::LocalFile(path));
    }

    if ["libsql://", "https://", "http://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
    {
        return Ok(DatabaseTarget::Remote(url.to_string()));
    }

    let scheme = match url.split_once("://") {
        Some((scheme, _)) => format!("{scheme}://"),
        None => url.split(':').next().unwrap_or_default().to_string(),
    };
    Err(ConfigError::UnsupportedScheme { scheme })
}

/// Connect to and verify the durable backend. Every failure is returned to the
/// caller, which decides whether to degrade.
pub async fn connect_durable(config: &StorageConfig) -> Result<SqlStore> {
    let url = config
        .database_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or(ConfigError::MissingUrl)?;
    let target = parse_database_url(url)?;

    let executor: Arc<dyn SqlExecutor> = match &target {
        DatabaseTarget::LocalFile(path) => {
            tracing::info!(path = %path.display(), "using local SQLite database");
            Arc::new(LocalExecutor::open(path)?)
        }
        DatabaseTarget::Remote(url) => {
            let token = config
                .auth_token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or(ConfigError::MissingAuthToken)?;
            tracing::info!("using remote Turso database");
            Arc::new(RemoteExecutor::connect(url, token).await?)
        }
    };

    let adapter = StatementAdapter::new(executor);
    schema::probe(&adapter)
        .await
        .context("database connection test failed")?;
    schema::init_schema(&adapter)
        .await
        .context("failed to initialize schema")?;
    schema::write_self_test(&adapter)
        .await
        .context("failed to write to database")?;

    tracing::info!(backend = adapter.kind(), "database connection verified");
    Ok(SqlStore::new(adapter))
}

/// Pick the store for the lifetime of the process.
///
/// Any failure of the durable path selects the fallback store, unless
/// `require_durable` is set, in which case the failure is returned.
pub async fn select_backend(config: &StorageConfig) -> Result<Arc<dyn MemoryStore>> {
    match connect_durable(config).await {
        Ok(store) => Ok(Arc::new(store)),
        Err(e) if config.require_durable => {
            Err(e.context("durable database required but unavailable"))
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "database initialization failed");
            tracing::warn!("falling back to in-memory storage; data will not survive this process");
            Ok(Arc::new(FallbackStore::new()))
        }
    }
}
