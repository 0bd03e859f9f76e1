use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::memory::repository::{self, Stored};
use crate::memory::store::MemoryStore;
use crate::memory::types::Importance;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMilestoneParams {
    #[schemars(description = "Title of the milestone")]
    pub title: String,

    #[schemars(description = "What was achieved")]
    pub description: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to medium.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreDecisionParams {
    #[schemars(description = "Title of the decision")]
    pub title: String,

    #[schemars(description = "The decision itself")]
    pub content: String,

    #[schemars(description = "Why this decision was made")]
    pub reasoning: Option<String>,

    #[schemars(description = "Importance level (low, medium, high). Defaults to medium.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreRequirementParams {
    #[schemars(description = "Title of the requirement")]
    pub title: String,

    #[schemars(description = "What is required")]
    pub content: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to medium.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata")]
    pub metadata: Option<Value>,
}

fn titled(title: &str, stored: Stored) -> Value {
    json!({ "status": "ok", "title": title, "timestamp": stored.timestamp })
}

pub async fn store_milestone(
    store: &dyn MemoryStore,
    params: StoreMilestoneParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::store_milestone(
        store,
        &params.title,
        &params.description,
        params.importance.unwrap_or(Importance::Medium),
        params.metadata,
        now,
    )
    .await?;
    Ok(titled(&params.title, stored))
}

pub async fn store_decision(
    store: &dyn MemoryStore,
    params: StoreDecisionParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::store_decision(
        store,
        &params.title,
        &params.content,
        params.reasoning,
        params.importance.unwrap_or(Importance::Medium),
        params.metadata,
        now,
    )
    .await?;
    Ok(titled(&params.title, stored))
}

pub async fn store_requirement(
    store: &dyn MemoryStore,
    params: StoreRequirementParams,
    now: i64,
) -> Result<Value> {
    let stored = repository::store_requirement(
        store,
        &params.title,
        &params.content,
        params.importance.unwrap_or(Importance::Medium),
        params.metadata,
        now,
    )
    .await?;
    Ok(titled(&params.title, stored))
}
