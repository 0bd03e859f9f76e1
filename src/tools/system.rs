//! Tools that only read: banner, health, context and stats.

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::memory::banner::generate_banner;
use crate::memory::context::get_comprehensive_context;
use crate::memory::stats::{check_health, memory_stats};
use crate::memory::store::MemoryStore;

/// Shared by every tool that takes no arguments.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

pub async fn banner<Tz: TimeZone>(store: &dyn MemoryStore, now: &DateTime<Tz>) -> Result<Value> {
    Ok(serde_json::to_value(generate_banner(store, now).await?)?)
}

pub async fn health(store: &dyn MemoryStore, now: i64) -> Result<Value> {
    Ok(serde_json::to_value(check_health(store, now).await?)?)
}

pub async fn comprehensive_context(store: &dyn MemoryStore, now: i64) -> Result<Value> {
    let context = get_comprehensive_context(store, now).await?;
    Ok(json!({ "status": "ok", "context": context }))
}

pub async fn stats(store: &dyn MemoryStore) -> Result<Value> {
    let stats = memory_stats(store).await?;
    Ok(json!({ "status": "ok", "stats": stats }))
}
