//! In-process store used when no durable backend is reachable.
//!
//! Contents live only as long as the process. Each collection has its own
//! auto-increment id counter starting at 1.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::store::{BackendMode, CollectionCounts, MemoryStore};
use super::types::{
    ActiveFile, Decision, Episode, Importance, Message, Milestone, NewActiveFile, NewDecision,
    NewEpisode, NewMessage, NewMilestone, NewRequirement, Requirement,
};

struct Collection<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> Collection<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
struct Collections {
    messages: Collection<Message>,
    active_files: Collection<ActiveFile>,
    milestones: Collection<Milestone>,
    decisions: Collection<Decision>,
    requirements: Collection<Requirement>,
    episodes: Collection<Episode>,
}

#[derive(Default)]
pub struct FallbackStore {
    inner: Mutex<Collections>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

fn matches_importance(value: Importance, filter: &[Importance]) -> bool {
    filter.is_empty() || filter.contains(&value)
}

/// Filter, order newest-first (`(time, id)` descending) and truncate.
fn newest<T: Clone>(
    rows: &[T],
    limit: usize,
    keep: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> (i64, i64),
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|r| keep(r)).cloned().collect();
    out.sort_by_key(|r| std::cmp::Reverse(key(r)));
    out.truncate(limit);
    out
}

#[async_trait]
impl MemoryStore for FallbackStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Fallback
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<i64> {
        let mut c = self.lock()?;
        let id = c.messages.allocate_id();
        c.messages.rows.push(Message {
            id,
            role: message.role,
            content: message.content,
            created_at: message.timestamp,
            importance: message.importance,
            metadata: message.metadata,
        });
        Ok(id)
    }

    async fn recent_messages(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Message>> {
        let c = self.lock()?;
        Ok(newest(
            &c.messages.rows,
            limit,
            |m| matches_importance(m.importance, importance),
            |m| (m.created_at, m.id),
        ))
    }

    async fn upsert_active_file(&self, file: NewActiveFile) -> Result<i64> {
        let mut c = self.lock()?;
        if let Some(existing) = c
            .active_files
            .rows
            .iter_mut()
            .find(|f| f.filename == file.filename)
        {
            existing.action = Some(file.action);
            existing.last_accessed = file.timestamp;
            existing.metadata = file.metadata;
            return Ok(existing.id);
        }

        let id = c.active_files.allocate_id();
        c.active_files.rows.push(ActiveFile {
            id,
            filename: file.filename,
            action: Some(file.action),
            last_accessed: file.timestamp,
            metadata: file.metadata,
        });
        Ok(id)
    }

    async fn recent_active_files(&self, limit: usize) -> Result<Vec<ActiveFile>> {
        let c = self.lock()?;
        Ok(newest(
            &c.active_files.rows,
            limit,
            |_| true,
            |f| (f.last_accessed, f.id),
        ))
    }

    async fn insert_milestone(&self, milestone: NewMilestone) -> Result<i64> {
        let mut c = self.lock()?;
        let id = c.milestones.allocate_id();
        c.milestones.rows.push(Milestone {
            id,
            title: milestone.title,
            description: milestone.description,
            importance: milestone.importance,
            created_at: milestone.timestamp,
            metadata: milestone.metadata,
        });
        Ok(id)
    }

    async fn recent_milestones(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Milestone>> {
        let c = self.lock()?;
        Ok(newest(
            &c.milestones.rows,
            limit,
            |m| matches_importance(m.importance, importance),
            |m| (m.created_at, m.id),
        ))
    }

    async fn insert_decision(&self, decision: NewDecision) -> Result<i64> {
        let mut c = self.lock()?;
        let id = c.decisions.allocate_id();
        c.decisions.rows.push(Decision {
            id,
            title: decision.title,
            content: decision.content,
            reasoning: decision.reasoning,
            importance: decision.importance,
            created_at: decision.timestamp,
            metadata: decision.metadata,
        });
        Ok(id)
    }

    async fn recent_decisions(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Decision>> {
        let c = self.lock()?;
        Ok(newest(
            &c.decisions.rows,
            limit,
            |d| matches_importance(d.importance, importance),
            |d| (d.created_at, d.id),
        ))
    }

    async fn insert_requirement(&self, requirement: NewRequirement) -> Result<i64> {
        let mut c = self.lock()?;
        let id = c.requirements.allocate_id();
        c.requirements.rows.push(Requirement {
            id,
            title: requirement.title,
            content: requirement.content,
            importance: requirement.importance,
            created_at: requirement.timestamp,
            metadata: requirement.metadata,
        });
        Ok(id)
    }

    async fn recent_requirements(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Requirement>> {
        let c = self.lock()?;
        Ok(newest(
            &c.requirements.rows,
            limit,
            |r| matches_importance(r.importance, importance),
            |r| (r.created_at, r.id),
        ))
    }

    async fn insert_episode(&self, episode: NewEpisode) -> Result<i64> {
        let mut c = self.lock()?;
        let id = c.episodes.allocate_id();
        c.episodes.rows.push(Episode {
            id,
            actor: episode.actor,
            action: episode.action,
            content: episode.content,
            timestamp: episode.timestamp,
            importance: episode.importance,
            context: episode.context,
        });
        Ok(id)
    }

    async fn recent_episodes(&self, limit: usize, context: Option<&str>) -> Result<Vec<Episode>> {
        let c = self.lock()?;
        Ok(newest(
            &c.episodes.rows,
            limit,
            |e| context.map_or(true, |ctx| e.context.as_deref() == Some(ctx)),
            |e| (e.timestamp, e.id),
        ))
    }

    async fn counts(&self) -> Result<CollectionCounts> {
        let c = self.lock()?;
        Ok(CollectionCounts {
            messages: c.messages.rows.len() as u64,
            active_files: c.active_files.rows.len() as u64,
            milestones: c.milestones.rows.len() as u64,
            decisions: c.decisions.rows.len() as u64,
            requirements: c.requirements.rows.len() as u64,
            episodes: c.episodes.rows.len() as u64,
        })
    }

    async fn message_time_range(&self) -> Result<(Option<i64>, Option<i64>)> {
        let c = self.lock()?;
        let times = c.messages.rows.iter().map(|m| m.created_at);
        Ok((times.clone().min(), times.max()))
    }

    async fn latest_episode_timestamp(&self) -> Result<Option<i64>> {
        let c = self.lock()?;
        Ok(c.episodes.rows.iter().map(|e| e.timestamp).max())
    }
}
