//! Conversation start/end composites.
//!
//! Both are an ordered list of independent steps against the store. There is no
//! transaction: a failing step stops the sequence and earlier steps stay written.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::Serialize;

use super::banner::{generate_banner, Banner};
use super::context::{get_comprehensive_context, ComprehensiveContext};
use super::repository;
use super::store::MemoryStore;
use super::types::{Importance, Role};

pub const COMPLETION_ACTION: &str = "completion";
pub const CONVERSATION_CONTEXT: &str = "conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    UserMessage,
    Banner,
    Context,
}

impl InitStep {
    pub const ORDER: [InitStep; 3] = [Self::UserMessage, Self::Banner, Self::Context];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserMessage => "user message",
            Self::Banner => "banner",
            Self::Context => "context",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndStep {
    AssistantMessage,
    Milestone,
    Episode,
}

impl EndStep {
    pub const ORDER: [EndStep; 3] = [Self::AssistantMessage, Self::Milestone, Self::Episode];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssistantMessage => "assistant message",
            Self::Milestone => "milestone",
            Self::Episode => "episode",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitDisplay {
    pub banner: Banner,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitInternal {
    pub context: ComprehensiveContext,
    pub message_stored: bool,
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct InitConversation {
    pub status: &'static str,
    pub display: InitDisplay,
    pub internal: InitInternal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub stored: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneOutcome {
    pub title: String,
    pub stored: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeOutcome {
    pub action: &'static str,
    pub stored: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndResults {
    pub assistant_message: StepOutcome,
    pub milestone: MilestoneOutcome,
    pub episode: EpisodeOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndConversation {
    pub status: &'static str,
    pub results: EndResults,
}

/// Store the opening user message, then build the banner and full context.
pub async fn init_conversation<Tz: TimeZone>(
    store: &dyn MemoryStore,
    content: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: &DateTime<Tz>,
) -> Result<InitConversation> {
    let ts = now.timestamp_millis();
    let mut metadata = metadata;
    let mut banner = None;
    let mut context = None;

    for step in InitStep::ORDER {
        let done: Result<()> = match step {
            InitStep::UserMessage => repository::store_message(
                store,
                Role::User,
                content,
                importance,
                metadata.take(),
                ts,
            )
            .await
            .map(|_| ()),
            InitStep::Banner => generate_banner(store, now).await.map(|b| banner = Some(b)),
            InitStep::Context => get_comprehensive_context(store, ts)
                .await
                .map(|c| context = Some(c)),
        };
        done.with_context(|| format!("initConversation failed at {} step", step.as_str()))?;
    }

    let (Some(banner), Some(context)) = (banner, context) else {
        anyhow::bail!("initConversation finished without banner or context");
    };
    tracing::info!(mode = banner.mode, "conversation initialized");

    Ok(InitConversation {
        status: "ok",
        display: InitDisplay { banner },
        internal: InitInternal {
            context,
            message_stored: true,
            timestamp: ts,
        },
    })
}

/// Store the closing assistant message, a milestone and a completion episode,
/// all stamped with `now`.
pub async fn end_conversation(
    store: &dyn MemoryStore,
    content: &str,
    milestone_title: &str,
    milestone_description: &str,
    importance: Importance,
    metadata: Option<serde_json::Value>,
    now: i64,
) -> Result<EndConversation> {
    for step in EndStep::ORDER {
        let written = match step {
            EndStep::AssistantMessage => {
                repository::store_message(
                    store,
                    Role::Assistant,
                    content,
                    importance,
                    metadata.clone(),
                    now,
                )
                .await
            }
            EndStep::Milestone => {
                repository::insert_milestone(
                    store,
                    milestone_title,
                    milestone_description,
                    importance,
                    metadata.clone(),
                    now,
                )
                .await
            }
            EndStep::Episode => {
                repository::record_episode(
                    store,
                    "assistant",
                    COMPLETION_ACTION,
                    &format!("Completed: {milestone_title}"),
                    importance,
                    Some(CONVERSATION_CONTEXT.into()),
                    now,
                )
                .await
            }
        };
        written.with_context(|| format!("endConversation failed at {} step", step.as_str()))?;
    }

    tracing::info!(title = milestone_title, "conversation ended");
    Ok(EndConversation {
        status: "ok",
        results: EndResults {
            assistant_message: StepOutcome {
                stored: true,
                timestamp: now,
            },
            milestone: MilestoneOutcome {
                title: milestone_title.to_string(),
                stored: true,
                timestamp: now,
            },
            episode: EpisodeOutcome {
                action: COMPLETION_ACTION,
                stored: true,
                timestamp: now,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::fallback::FallbackStore;
    use chrono::Utc;

    #[tokio::test]
    async fn init_stores_message_then_reads_it_back() {
        let store = FallbackStore::new();
        let now = Utc::now();
        let out = init_conversation(&store, "hello there", Importance::Low, None, &now)
            .await
            .unwrap();

        assert!(out.internal.message_stored);
        assert_eq!(out.internal.timestamp, now.timestamp_millis());
        assert_eq!(out.display.banner.memory_count, 1);
        assert_eq!(out.display.banner.last_accessed, "0 minutes ago");
        let recent = &out.internal.context.short_term.recent_messages;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].role, Role::User);
        assert_eq!(recent[0].content, "hello there");
    }

    #[tokio::test]
    async fn init_rejects_empty_content_before_writing() {
        let store = FallbackStore::new();
        let err = init_conversation(&store, "", Importance::Low, None, &Utc::now())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("user message step"));
        assert_eq!(store.counts().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn end_writes_three_rows_with_one_timestamp() {
        let store = FallbackStore::new();
        let out = end_conversation(&store, "bye", "Auth done", "login flow", Importance::Medium, None, 42)
            .await
            .unwrap();

        assert!(out.results.assistant_message.stored);
        assert!(out.results.milestone.stored);
        assert!(out.results.episode.stored);
        assert_eq!(out.results.assistant_message.timestamp, 42);
        assert_eq!(out.results.milestone.timestamp, 42);
        assert_eq!(out.results.episode.timestamp, 42);

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.messages, 1);
        assert_eq!(counts.milestones, 1);
        assert_eq!(counts.episodes, 1);

        let episodes = store.recent_episodes(10, None).await.unwrap();
        assert_eq!(episodes[0].actor, "assistant");
        assert_eq!(episodes[0].action, "completion");
        assert_eq!(episodes[0].content, "Completed: Auth done");
        assert_eq!(episodes[0].context.as_deref(), Some("conversation"));
    }

    #[tokio::test]
    async fn end_stops_at_first_failed_step() {
        let store = FallbackStore::new();
        let err = end_conversation(&store, "bye", "", "desc", Importance::Medium, None, 1)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("milestone step"));

        // the assistant message was already written
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.messages, 1);
        assert_eq!(counts.milestones, 0);
        assert_eq!(counts.episodes, 0);
    }
}
