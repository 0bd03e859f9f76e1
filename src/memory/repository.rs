//! Write and read paths for the six collections.
//!
//! Every function takes the injected [`MemoryStore`] and a caller-supplied `now`
//! (epoch ms). Writes that leave an audit trail insert the primary row first and
//! the episode second, as two independent statements: if the episode insert fails
//! the primary row stays.

use anyhow::{bail, Result};
use serde::Serialize;

use super::store::MemoryStore;
use super::types::{
    ActiveFile, Decision, Episode, Importance, Message, Milestone, NewActiveFile, NewDecision,
    NewEpisode, NewMessage, NewMilestone, NewRequirement, Requirement, Role,
};

pub const FILE_TRACKING_CONTEXT: &str = "file-tracking";
pub const MILESTONE_CONTEXT: &str = "milestone-tracking";
pub const DECISION_CONTEXT: &str = "decision-tracking";
pub const REQUIREMENT_CONTEXT: &str = "requirement-tracking";

/// Result of a plain write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stored {
    pub id: i64,
    pub timestamp: i64,
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} is required");
    }
    Ok(())
}

pub async fn store_message(
    store: &dyn MemoryStore,
    role: Role,
    content: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    require("content", content)?;
    let id = store
        .insert_message(NewMessage {
            role,
            content: content.to_string(),
            importance,
            metadata,
            timestamp: now,
        })
        .await?;
    tracing::info!(%role, %importance, "stored message");
    Ok(Stored { id, timestamp: now })
}

/// Upsert the file row, then log the action as a `file-tracking` episode.
pub async fn track_active_file(
    store: &dyn MemoryStore,
    filename: &str,
    action: &str,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    require("filename", filename)?;
    require("action", action)?;

    let id = store
        .upsert_active_file(NewActiveFile {
            filename: filename.to_string(),
            action: action.to_string(),
            metadata,
            timestamp: now,
        })
        .await?;

    store
        .insert_episode(NewEpisode {
            actor: "user".into(),
            action: action.to_string(),
            content: filename.to_string(),
            importance: Importance::Low,
            context: Some(FILE_TRACKING_CONTEXT.into()),
            timestamp: now,
        })
        .await?;

    tracing::info!(filename, action, "tracked file");
    Ok(Stored { id, timestamp: now })
}

/// Episode logged by the system alongside a long-term record.
async fn system_episode(
    store: &dyn MemoryStore,
    action: &str,
    title: &str,
    importance: Importance,
    context: &str,
    now: i64,
) -> Result<i64> {
    store
        .insert_episode(NewEpisode {
            actor: "system".into(),
            action: action.into(),
            content: title.into(),
            importance,
            context: Some(context.into()),
            timestamp: now,
        })
        .await
}

/// Insert a milestone without the `milestone_created` episode.
pub async fn insert_milestone(
    store: &dyn MemoryStore,
    title: &str,
    description: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    require("title", title)?;
    let id = store
        .insert_milestone(NewMilestone {
            title: title.to_string(),
            description: description.to_string(),
            importance,
            metadata,
            timestamp: now,
        })
        .await?;
    Ok(Stored { id, timestamp: now })
}

pub async fn store_milestone(
    store: &dyn MemoryStore,
    title: &str,
    description: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    let stored = insert_milestone(store, title, description, importance, metadata, now).await?;
    system_episode(store, "milestone_created", title, importance, MILESTONE_CONTEXT, now).await?;
    tracing::info!(title, %importance, "stored milestone");
    Ok(stored)
}

pub async fn store_decision(
    store: &dyn MemoryStore,
    title: &str,
    content: &str,
    reasoning: Option<String>,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    require("title", title)?;
    require("content", content)?;

    let id = store
        .insert_decision(NewDecision {
            title: title.to_string(),
            content: content.to_string(),
            reasoning,
            importance,
            metadata,
            timestamp: now,
        })
        .await?;
    system_episode(store, "decision_made", title, importance, DECISION_CONTEXT, now).await?;

    tracing::info!(title, %importance, "stored decision");
    Ok(Stored { id, timestamp: now })
}

pub async fn store_requirement(
    store: &dyn MemoryStore,
    title: &str,
    content: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<Stored> {
    require("title", title)?;
    require("content", content)?;

    let id = store
        .insert_requirement(NewRequirement {
            title: title.to_string(),
            content: content.to_string(),
            importance,
            metadata,
            timestamp: now,
        })
        .await?;
    system_episode(
        store,
        "requirement_added",
        title,
        importance,
        REQUIREMENT_CONTEXT,
        now,
    )
    .await?;

    tracing::info!(title, %importance, "stored requirement");
    Ok(Stored { id, timestamp: now })
}

pub async fn record_episode(
    store: &dyn MemoryStore,
    actor: &str,
    action: &str,
    content: &str,
    importance: Importance,
    context: Option<String>,
    now: i64,
) -> Result<Stored> {
    require("actor", actor)?;
    require("action", action)?;
    require("content", content)?;

    let id = store
        .insert_episode(NewEpisode {
            actor: actor.to_string(),
            action: action.to_string(),
            content: content.to_string(),
            importance,
            context,
            timestamp: now,
        })
        .await?;
    tracing::info!(actor, action, %importance, "recorded episode");
    Ok(Stored { id, timestamp: now })
}

pub async fn recent_messages(
    store: &dyn MemoryStore,
    limit: usize,
    importance: Option<Importance>,
) -> Result<Vec<Message>> {
    let filter: Vec<Importance> = importance.into_iter().collect();
    store.recent_messages(limit, &filter).await
}

pub async fn active_files(store: &dyn MemoryStore, limit: usize) -> Result<Vec<ActiveFile>> {
    store.recent_active_files(limit).await
}

pub async fn recent_milestones(
    store: &dyn MemoryStore,
    limit: usize,
    importance: &[Importance],
) -> Result<Vec<Milestone>> {
    store.recent_milestones(limit, importance).await
}

pub async fn recent_decisions(
    store: &dyn MemoryStore,
    limit: usize,
    importance: &[Importance],
) -> Result<Vec<Decision>> {
    store.recent_decisions(limit, importance).await
}

pub async fn recent_requirements(
    store: &dyn MemoryStore,
    limit: usize,
    importance: &[Importance],
) -> Result<Vec<Requirement>> {
    store.recent_requirements(limit, importance).await
}

pub async fn recent_episodes(
    store: &dyn MemoryStore,
    limit: usize,
    context: Option<&str>,
) -> Result<Vec<Episode>> {
    store.recent_episodes(limit, context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fallback::FallbackStore;
    use crate::memory::store::{BackendMode, CollectionCounts};
    use async_trait::async_trait;

    /// Delegates to a fallback store but refuses every episode insert.
    struct EpisodeWriteFails {
        inner: FallbackStore,
    }

    #[async_trait]
    impl MemoryStore for EpisodeWriteFails {
        fn mode(&self) -> BackendMode {
            self.inner.mode()
        }
        async fn ping(&self) -> Result<()> {
            self.inner.ping().await
        }
        async fn insert_message(&self, message: NewMessage) -> Result<i64> {
            self.inner.insert_message(message).await
        }
        async fn recent_messages(&self, limit: usize, importance: &[Importance]) -> Result<Vec<Message>> {
            self.inner.recent_messages(limit, importance).await
        }
        async fn upsert_active_file(&self, file: NewActiveFile) -> Result<i64> {
            self.inner.upsert_active_file(file).await
        }
        async fn recent_active_files(&self, limit: usize) -> Result<Vec<ActiveFile>> {
            self.inner.recent_active_files(limit).await
        }
        async fn insert_milestone(&self, milestone: NewMilestone) -> Result<i64> {
            self.inner.insert_milestone(milestone).await
        }
        async fn recent_milestones(&self, limit: usize, importance: &[Importance]) -> Result<Vec<Milestone>> {
            self.inner.recent_milestones(limit, importance).await
        }
        async fn insert_decision(&self, decision: NewDecision) -> Result<i64> {
            self.inner.insert_decision(decision).await
        }
        async fn recent_decisions(&self, limit: usize, importance: &[Importance]) -> Result<Vec<Decision>> {
            self.inner.recent_decisions(limit, importance).await
        }
        async fn insert_requirement(&self, requirement: NewRequirement) -> Result<i64> {
            self.inner.insert_requirement(requirement).await
        }
        async fn recent_requirements(&self, limit: usize, importance: &[Importance]) -> Result<Vec<Requirement>> {
            self.inner.recent_requirements(limit, importance).await
        }
        async fn insert_episode(&self, _episode: NewEpisode) -> Result<i64> {
            bail!("episodes table is unavailable")
        }
        async fn recent_episodes(&self, limit: usize, context: Option<&str>) -> Result<Vec<Episode>> {
            self.inner.recent_episodes(limit, context).await
        }
        async fn counts(&self) -> Result<CollectionCounts> {
            self.inner.counts().await
        }
        async fn message_time_range(&self) -> Result<(Option<i64>, Option<i64>)> {
            self.inner.message_time_range().await
        }
        async fn latest_episode_timestamp(&self) -> Result<Option<i64>> {
            self.inner.latest_episode_timestamp().await
        }
    }

    fn failing_episodes() -> EpisodeWriteFails {
        EpisodeWriteFails {
            inner: FallbackStore::new(),
        }
    }

    #[tokio::test]
    async fn failed_episode_leaves_the_primary_row() {
        let store = failing_episodes();

        let err = store_milestone(&store, "m", "d", Importance::High, None, 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("episodes table is unavailable"));

        assert!(store_decision(&store, "d", "c", None, Importance::Medium, None, 2)
            .await
            .is_err());
        assert!(store_requirement(&store, "r", "c", Importance::Low, None, 3)
            .await
            .is_err());
        assert!(track_active_file(&store, "/a/b.js", "open", None, 4)
            .await
            .is_err());

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.milestones, 1);
        assert_eq!(counts.decisions, 1);
        assert_eq!(counts.requirements, 1);
        assert_eq!(counts.active_files, 1);
        assert_eq!(counts.episodes, 0);
    }

    #[tokio::test]
    async fn plain_writes_do_not_touch_episodes() {
        let store = failing_episodes();
        store_message(&store, Role::User, "hi", Importance::Low, None, 1)
            .await
            .unwrap();
        insert_milestone(&store, "m", "d", Importance::Medium, None, 2)
            .await
            .unwrap();
        assert_eq!(store.counts().await.unwrap().total(), 2);
    }

    #[tokio::test]
    async fn tracking_a_file_logs_an_episode() {
        let store = FallbackStore::new();
        track_active_file(&store, "/a/b.js", "open", None, 100)
            .await
            .unwrap();

        let episodes = recent_episodes(&store, 10, Some(FILE_TRACKING_CONTEXT))
            .await
            .unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].actor, "user");
        assert_eq!(episodes[0].action, "open");
        assert_eq!(episodes[0].content, "/a/b.js");
        assert_eq!(episodes[0].importance, Importance::Low);
    }

    #[tokio::test]
    async fn milestone_pairs_with_one_episode() {
        let store = FallbackStore::new();
        store_milestone(&store, "v1 shipped", "done", Importance::High, None, 5)
            .await
            .unwrap();

        let episodes = recent_episodes(&store, 10, None).await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].action, "milestone_created");
        assert_eq!(episodes[0].content, "v1 shipped");
        assert_eq!(episodes[0].actor, "system");
        assert_eq!(episodes[0].importance, Importance::High);
        assert_eq!(episodes[0].context.as_deref(), Some(MILESTONE_CONTEXT));
    }

    #[tokio::test]
    async fn decision_and_requirement_episodes() {
        let store = FallbackStore::new();
        store_decision(&store, "use X", "why not", None, Importance::Medium, None, 1)
            .await
            .unwrap();
        store_requirement(&store, "fast", "under 10ms", Importance::Low, None, 2)
            .await
            .unwrap();

        let episodes = recent_episodes(&store, 10, None).await.unwrap();
        let actions: Vec<&str> = episodes.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["requirement_added", "decision_made"]);
    }

    #[tokio::test]
    async fn plain_milestone_insert_has_no_episode() {
        let store = FallbackStore::new();
        insert_milestone(&store, "quiet", "", Importance::Medium, None, 1)
            .await
            .unwrap();
        assert!(recent_episodes(&store, 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_required_fields_are_rejected() {
        let store = FallbackStore::new();
        let err = store_message(&store, Role::User, "  ", Importance::Low, None, 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("content is required"));

        assert!(track_active_file(&store, "", "open", None, 1).await.is_err());
        assert!(record_episode(&store, "me", "", "x", Importance::Low, None, 1)
            .await
            .is_err());
        assert_eq!(store.counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn message_importance_filter() {
        let store = FallbackStore::new();
        store_message(&store, Role::User, "a", Importance::Low, None, 1)
            .await
            .unwrap();
        store_message(&store, Role::User, "b", Importance::High, None, 2)
            .await
            .unwrap();

        assert_eq!(recent_messages(&store, 10, None).await.unwrap().len(), 2);
        let high = recent_messages(&store, 10, Some(Importance::High))
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].content, "b");
    }
}
