//! The storage interface every repository operation runs against.
//!
//! Two implementations exist: [`SqlStore`](super::sql::SqlStore) over a durable
//! SQL backend and [`FallbackStore`](super::fallback::FallbackStore) in process
//! memory. Both must give the same answers for the same sequence of calls:
//! equality filters, newest-first ordering (ties broken by newest insertion) and
//! truncation to `limit`.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use super::types::{
    ActiveFile, Decision, Episode, Importance, Message, Milestone, NewActiveFile, NewDecision,
    NewEpisode, NewMessage, NewMilestone, NewRequirement, Requirement,
};

/// Which store was selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Durable,
    Fallback,
}

impl BackendMode {
    /// Name reported to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "turso",
            Self::Fallback => "in-memory",
        }
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionCounts {
    pub messages: u64,
    pub active_files: u64,
    pub milestones: u64,
    pub decisions: u64,
    pub requirements: u64,
    pub episodes: u64,
}

impl CollectionCounts {
    pub fn total(&self) -> u64 {
        self.messages
            + self.active_files
            + self.milestones
            + self.decisions
            + self.requirements
            + self.episodes
    }
}

/// `importance` filters take a set: empty means "any".
#[async_trait]
pub trait MemoryStore: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Round-trip check; always succeeds for the fallback store.
    async fn ping(&self) -> Result<()>;

    async fn insert_message(&self, message: NewMessage) -> Result<i64>;
    async fn recent_messages(&self, limit: usize, importance: &[Importance])
        -> Result<Vec<Message>>;

    /// Insert or overwrite the row for `file.filename`.
    async fn upsert_active_file(&self, file: NewActiveFile) -> Result<i64>;
    async fn recent_active_files(&self, limit: usize) -> Result<Vec<ActiveFile>>;

    async fn insert_milestone(&self, milestone: NewMilestone) -> Result<i64>;
    async fn recent_milestones(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Milestone>>;

    async fn insert_decision(&self, decision: NewDecision) -> Result<i64>;
    async fn recent_decisions(&self, limit: usize, importance: &[Importance])
        -> Result<Vec<Decision>>;

    async fn insert_requirement(&self, requirement: NewRequirement) -> Result<i64>;
    async fn recent_requirements(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Requirement>>;

    async fn insert_episode(&self, episode: NewEpisode) -> Result<i64>;
    async fn recent_episodes(&self, limit: usize, context: Option<&str>) -> Result<Vec<Episode>>;

    async fn counts(&self) -> Result<CollectionCounts>;

    /// Oldest and newest message `created_at`.
    async fn message_time_range(&self) -> Result<(Option<i64>, Option<i64>)>;

    /// Newest `timestamp` across episodes.
    async fn latest_episode_timestamp(&self) -> Result<Option<i64>>;
}
