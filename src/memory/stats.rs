use anyhow::Result;
use serde::Serialize;

use super::store::MemoryStore;
use super::types::to_iso;

/// Response from getMemoryStats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub message_count: u64,
    pub active_file_count: u64,
    pub milestone_count: u64,
    pub decision_count: u64,
    pub requirement_count: u64,
    pub episode_count: u64,
    /// Oldest message `created_at` as ISO-8601, `null` on an empty store.
    pub oldest_memory: Option<String>,
    pub newest_memory: Option<String>,
}

/// Response from checkHealth.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub mode: &'static str,
    pub message_count: u64,
    pub active_files_count: u64,
    pub current_directory: String,
    pub timestamp: String,
}

/// Per-collection counts plus the message time range.
pub async fn memory_stats(store: &dyn MemoryStore) -> Result<StatsResponse> {
    let counts = store.counts().await?;
    let (oldest, newest) = store.message_time_range().await?;

    Ok(StatsResponse {
        message_count: counts.messages,
        active_file_count: counts.active_files,
        milestone_count: counts.milestones,
        decision_count: counts.decisions,
        requirement_count: counts.requirements,
        episode_count: counts.episodes,
        oldest_memory: oldest.map(to_iso),
        newest_memory: newest.map(to_iso),
    })
}

/// Probe the backend, then report mode and the two headline counts.
pub async fn check_health(store: &dyn MemoryStore, now: i64) -> Result<HealthResponse> {
    store.ping().await?;
    let counts = store.counts().await?;
    let current_directory = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    Ok(HealthResponse {
        status: "ok",
        mode: store.mode().as_str(),
        message_count: counts.messages,
        active_files_count: counts.active_files,
        current_directory,
        timestamp: to_iso(now),
    })
}
