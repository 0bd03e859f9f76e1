use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::memory::repository;
use crate::memory::store::MemoryStore;
use crate::memory::types::Importance;

use super::DEFAULT_LIMIT;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecordEpisodeParams {
    #[schemars(description = "Who performed the action (user, assistant, system)")]
    pub actor: String,

    #[schemars(description = "Type of action performed")]
    pub action: String,

    #[schemars(description = "Details of the action")]
    pub content: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to low.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional context tag for grouping episodes")]
    pub context: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetRecentEpisodesParams {
    #[schemars(description = "Maximum number of episodes to return. Defaults to 10.")]
    pub limit: Option<usize>,

    #[schemars(description = "Only return episodes with this context tag")]
    pub context: Option<String>,
}

pub async fn record_episode(
    store: &dyn MemoryStore,
    params: RecordEpisodeParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::record_episode(
        store,
        &params.actor,
        &params.action,
        &params.content,
        params.importance.unwrap_or(Importance::Low),
        params.context,
        now,
    )
    .await?;
    Ok(json!({
        "status": "ok",
        "actor": params.actor,
        "action": params.action,
        "timestamp": stored.timestamp,
    }))
}

pub async fn get_recent_episodes(
    store: &dyn MemoryStore,
    params: GetRecentEpisodesParams,
) -> Result<Value> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let episodes = repository::recent_episodes(store, limit, params.context.as_deref()).await?;
    Ok(json!({ "status": "ok", "episodes": episodes }))
}
