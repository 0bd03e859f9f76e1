//! Comprehensive context: one bounded, newest-first snapshot of every collection.
//!
//! Six independent reads with fixed limits. Decisions and requirements keep only
//! medium and high importance; everything else is unfiltered. Each call re-reads
//! the store.

use anyhow::Result;
use serde::Serialize;

use super::store::MemoryStore;
use super::types::{
    to_iso, ActiveFile, Decision, Episode, Importance, Message, Milestone, Requirement,
};

pub const RECENT_MESSAGES_LIMIT: usize = 5;
pub const ACTIVE_FILES_LIMIT: usize = 5;
pub const MILESTONES_LIMIT: usize = 3;
pub const DECISIONS_LIMIT: usize = 3;
pub const REQUIREMENTS_LIMIT: usize = 3;
pub const EPISODES_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortTerm {
    pub recent_messages: Vec<Message>,
    pub active_files: Vec<ActiveFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LongTerm {
    pub milestones: Vec<Milestone>,
    pub decisions: Vec<Decision>,
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episodic {
    pub recent_episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub healthy: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveContext {
    pub short_term: ShortTerm,
    pub long_term: LongTerm,
    pub episodic: Episodic,
    pub system: SystemStatus,
}

pub async fn get_comprehensive_context(
    store: &dyn MemoryStore,
    now: i64,
) -> Result<ComprehensiveContext> {
    let recent_messages = store.recent_messages(RECENT_MESSAGES_LIMIT, &[]).await?;
    let active_files = store.recent_active_files(ACTIVE_FILES_LIMIT).await?;
    let milestones = store.recent_milestones(MILESTONES_LIMIT, &[]).await?;
    let decisions = store
        .recent_decisions(DECISIONS_LIMIT, &Importance::SIGNIFICANT)
        .await?;
    let requirements = store
        .recent_requirements(REQUIREMENTS_LIMIT, &Importance::SIGNIFICANT)
        .await?;
    let recent_episodes = store.recent_episodes(EPISODES_LIMIT, None).await?;

    tracing::debug!(
        messages = recent_messages.len(),
        files = active_files.len(),
        milestones = milestones.len(),
        decisions = decisions.len(),
        requirements = requirements.len(),
        episodes = recent_episodes.len(),
        "assembled context"
    );

    Ok(ComprehensiveContext {
        short_term: ShortTerm {
            recent_messages,
            active_files,
        },
        long_term: LongTerm {
            milestones,
            decisions,
            requirements,
        },
        episodic: Episodic { recent_episodes },
        system: SystemStatus {
            healthy: true,
            timestamp: to_iso(now),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fallback::FallbackStore;
    use crate::memory::repository;
    use crate::memory::types::Role;

    #[tokio::test]
    async fn empty_store_gives_empty_sections() {
        let store = FallbackStore::new();
        let ctx = get_comprehensive_context(&store, 0).await.unwrap();
        let json = serde_json::to_value(&ctx).unwrap();

        assert_eq!(json["shortTerm"]["recentMessages"], serde_json::json!([]));
        assert_eq!(json["shortTerm"]["activeFiles"], serde_json::json!([]));
        assert_eq!(json["longTerm"]["decisions"], serde_json::json!([]));
        assert_eq!(json["episodic"]["recentEpisodes"], serde_json::json!([]));
        assert_eq!(json["system"]["healthy"], true);
    }

    #[tokio::test]
    async fn limits_are_applied() {
        let store = FallbackStore::new();
        for i in 0..8 {
            repository::store_message(&store, Role::User, &format!("m{i}"), Importance::Low, None, i)
                .await
                .unwrap();
            repository::store_milestone(&store, &format!("ms{i}"), "", Importance::Low, None, i)
                .await
                .unwrap();
        }

        let ctx = get_comprehensive_context(&store, 100).await.unwrap();
        assert_eq!(ctx.short_term.recent_messages.len(), RECENT_MESSAGES_LIMIT);
        assert_eq!(ctx.short_term.recent_messages[0].content, "m7");
        assert_eq!(ctx.long_term.milestones.len(), MILESTONES_LIMIT);
        assert_eq!(ctx.episodic.recent_episodes.len(), EPISODES_LIMIT);
    }

    #[tokio::test]
    async fn low_importance_decisions_are_excluded() {
        let store = FallbackStore::new();
        repository::store_decision(&store, "use X", "...", None, Importance::Low, None, 1)
            .await
            .unwrap();
        let ctx = get_comprehensive_context(&store, 2).await.unwrap();
        assert!(ctx.long_term.decisions.is_empty());

        repository::store_decision(&store, "use Y", "...", None, Importance::High, None, 3)
            .await
            .unwrap();
        repository::store_decision(&store, "use Z", "...", None, Importance::Medium, None, 4)
            .await
            .unwrap();
        let ctx = get_comprehensive_context(&store, 5).await.unwrap();
        let titles: Vec<&str> = ctx.long_term.decisions.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["use Z", "use Y"]);
    }

    #[tokio::test]
    async fn milestones_keep_low_importance() {
        let store = FallbackStore::new();
        repository::store_milestone(&store, "tiny", "", Importance::Low, None, 1)
            .await
            .unwrap();
        let ctx = get_comprehensive_context(&store, 2).await.unwrap();
        assert_eq!(ctx.long_term.milestones.len(), 1);
    }
}
