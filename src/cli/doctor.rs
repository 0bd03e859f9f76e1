//! CLI `doctor` command: show configuration, pick a backend and print a health report.

use anyhow::{Context, Result};

use crate::config::{default_config_path, MemoryConfig};
use crate::db;
use crate::memory::stats::check_health;
use crate::memory::store::BackendMode;
use crate::memory::types::now_millis;

/// Run backend selection and a health check, then print a report.
pub async fn doctor(config: &MemoryConfig) -> Result<()> {
    println!("cursor10x Health Report");
    println!("=======================");
    println!();
    println!("Config file:       {}", default_config_path().display());
    println!("Database URL:      {}", config.redacted_database_url());
    println!(
        "Auth token:        {}",
        if config.storage.auth_token.is_some() {
            "provided"
        } else {
            "not set"
        }
    );
    println!("Require durable:   {}", config.storage.require_durable);
    println!();

    if let Some(url) = config.storage.database_url.as_deref() {
        match db::parse_database_url(url) {
            Ok(db::DatabaseTarget::LocalFile(path)) => {
                println!("Target:            local SQLite file {}", path.display());
            }
            Ok(db::DatabaseTarget::Remote(_)) => println!("Target:            remote libSQL"),
            Err(e) => println!("Target:            INVALID ({e})"),
        }
    }

    let store = db::select_backend(&config.storage)
        .await
        .context("failed to select storage backend")?;
    let health = check_health(store.as_ref(), now_millis())
        .await
        .context("failed to run health check")?;

    println!("Backend:           {}", health.mode);
    println!("Messages:          {}", health.message_count);
    println!("Active files:      {}", health.active_files_count);
    println!("Working dir:       {}", health.current_directory);

    if store.mode() == BackendMode::Fallback {
        println!();
        println!("WARNING: running on the in-memory store; nothing will be persisted.");
        println!("Set TURSO_DATABASE_URL (file:<path> or libsql://…) to enable durable storage.");
    }

    Ok(())
}
