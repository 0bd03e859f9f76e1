use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::memory::repository;
use crate::memory::store::MemoryStore;
use crate::memory::types::{Importance, Role};

use super::DEFAULT_LIMIT;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMessageParams {
    #[schemars(description = "Content of the message")]
    pub content: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to low.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata for the message")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TrackActiveFileParams {
    #[schemars(description = "Path to the file being tracked")]
    pub filename: String,

    #[schemars(description = "Action performed on the file (open, edit, close, etc.)")]
    pub action: String,

    #[schemars(description = "Optional JSON metadata about the file")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetRecentMessagesParams {
    #[schemars(description = "Maximum number of messages to return. Defaults to 10.")]
    pub limit: Option<usize>,

    #[schemars(description = "Only return messages with this importance")]
    pub importance: Option<Importance>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetActiveFilesParams {
    #[schemars(description = "Maximum number of files to return. Defaults to 10.")]
    pub limit: Option<usize>,
}

pub async fn store_message(
    store: &dyn MemoryStore,
    role: Role,
    params: StoreMessageParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::store_message(
        store,
        role,
        &params.content,
        params.importance.unwrap_or(Importance::Low),
        params.metadata,
        now,
    )
    .await?;
    Ok(json!({ "status": "ok", "timestamp": stored.timestamp }))
}

pub async fn track_active_file(
    store: &dyn MemoryStore,
    params: TrackActiveFileParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::track_active_file(
        store,
        &params.filename,
        &params.action,
        params.metadata,
        now,
    )
    .await?;
    Ok(json!({
        "status": "ok",
        "filename": params.filename,
        "action": params.action,
        "timestamp": stored.timestamp,
    }))
}

pub async fn get_recent_messages(
    store: &dyn MemoryStore,
    params: GetRecentMessagesParams,
) -> Result<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let messages = repository::recent_messages(store, limit, params.importance).await?;
    Ok(json!({ "status": "ok", "messages": messages }))
}

pub async fn get_active_files(
    store: &dyn MemoryStore,
    params: GetActiveFilesParams,
) -> Result<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let files = repository::active_files(store, limit).await?;
    Ok(json!({ "status": "ok", "files": files }))
}
