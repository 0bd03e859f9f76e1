#![allow(dead_code)]

use std::sync::Arc;

use cursor10x::config::StorageConfig;
use cursor10x::db;
use cursor10x::memory::fallback::FallbackStore;
use cursor10x::memory::store::MemoryStore;
use rmcp::model::JsonObject;
use serde_json::Value;
use tempfile::TempDir;

/// Storage settings pointing at `url`.
pub fn storage(url: Option<&str>, token: Option<&str>, require_durable: bool) -> StorageConfig {
    StorageConfig {
        database_url: url.map(str::to_string),
        auth_token: token.map(str::to_string),
        require_durable,
    }
}

/// `file:` URL for a database inside `tmp`.
pub fn file_url(tmp: &TempDir, name: &str) -> String {
    format!("file:{}", tmp.path().join(name).display())
}

/// A durable store on a fresh SQLite file, selected the same way the server does.
pub async fn durable_store(tmp: &TempDir) -> Arc<dyn MemoryStore> {
    let url = file_url(tmp, "memory.db");
    db::select_backend(&storage(Some(&url), None, true))
        .await
        .unwrap()
}

pub fn fallback_store() -> Arc<dyn MemoryStore> {
    Arc::new(FallbackStore::new())
}

/// Tool arguments from a `json!` object literal.
pub fn args(value: Value) -> Option<JsonObject> {
    match value {
        Value::Object(map) => Some(map),
        other => panic!("tool arguments must be an object, got {other}"),
    }
}

/// Drop every `id` key, recursively.
pub fn strip_ids(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("id");
            for v in map.values_mut() {
                strip_ids(v);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_ids),
        _ => {}
    }
}
