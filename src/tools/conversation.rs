use anyhow::Result;
use chrono::{DateTime, TimeZone};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::conversation;
use crate::memory::store::MemoryStore;
use crate::memory::types::Importance;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InitConversationParams {
    #[schemars(description = "Content of the user's opening message")]
    pub content: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to low.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata for the message")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EndConversationParams {
    #[schemars(description = "Content of the assistant's final message")]
    pub content: String,

    #[schemars(description = "Title of the milestone to record")]
    pub milestone_title: String,

    #[schemars(description = "Description of what was accomplished")]
    pub milestone_description: String,

    #[schemars(description = "Importance level (low, medium, high). Defaults to medium.")]
    pub importance: Option<Importance>,

    #[schemars(description = "Optional JSON metadata")]
    pub metadata: Option<Value>,
}

pub async fn init_conversation<Tz: TimeZone>(
    store: &dyn MemoryStore,
    params: InitConversationParams,
    now: &DateTime<Tz>,
) -> Result<Value> {
    let out = conversation::init_conversation(
        store,
        &params.content,
        params.importance.unwrap_or(Importance::Low),
        params.metadata,
        now,
    )
    .await?;
    Ok(serde_json::to_value(out)?)
}

pub async fn end_conversation(
    store: &dyn MemoryStore,
    params: EndConversationParams,
    now: i64,
) -> Result<Value> {
    let out = conversation::end_conversation(
        store,
        &params.content,
        &params.milestone_title,
        &params.milestone_description,
        params.importance.unwrap_or(Importance::Medium),
        params.metadata,
        now,
    )
    .await?;
    Ok(serde_json::to_value(out)?)
}
