//! Collection repositories over a durable SQL backend.
//!
//! Every statement goes through the [`StatementAdapter`], so the same SQL runs
//! against a local SQLite file or a remote libSQL database. Metadata is stored as
//! JSON text and parsed back on read.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::store::{BackendMode, CollectionCounts, MemoryStore};
use super::types::{
    ActiveFile, Decision, Episode, Importance, Message, Milestone, NewActiveFile, NewDecision,
    NewEpisode, NewMessage, NewMilestone, NewRequirement, Requirement, Role,
};
use crate::db::executor::{Row, SqlValue};
use crate::db::statement::StatementAdapter;

pub struct SqlStore {
    adapter: StatementAdapter,
}

impl SqlStore {
    pub fn new(adapter: StatementAdapter) -> Self {
        Self { adapter }
    }

    /// Run an INSERT (or upsert) and read the affected row's id back from the
    /// same statement.
    async fn insert(&self, sql: &str, values: Vec<SqlValue>) -> Result<i64> {
        let rows = self.select(&format!("{sql} RETURNING id"), values).await?;
        rows.first()
            .ok_or_else(|| anyhow!("insert did not return a row id"))?
            .i64("id")
    }

    async fn select(&self, sql: &str, values: Vec<SqlValue>) -> Result<Vec<Row>> {
        Ok(self.adapter.execute(sql, values).await?.rows)
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let rows = self
            .select(&format!("SELECT COUNT(*) as count FROM {table}"), Vec::new())
            .await?;
        let count = rows.first().map(|r| r.i64("count")).transpose()?.unwrap_or(0);
        Ok(count.max(0) as u64)
    }
}

fn metadata_text(metadata: Option<&serde_json::Value>) -> Result<SqlValue> {
    Ok(metadata
        .map(serde_json::to_string)
        .transpose()?
        .map(SqlValue::Text)
        .unwrap_or(SqlValue::Null))
}

fn parse_metadata(row: &Row) -> Option<serde_json::Value> {
    row.opt_text("metadata")
        .and_then(|s| serde_json::from_str(&s).ok())
}

/// Build `WHERE importance IN (?, ?)` (or nothing) plus its bound values.
fn importance_clause(importance: &[Importance]) -> (String, Vec<SqlValue>) {
    if importance.is_empty() {
        return (String::new(), Vec::new());
    }
    let placeholders = vec!["?"; importance.len()].join(", ");
    let values = importance
        .iter()
        .map(|i| SqlValue::from(i.as_str()))
        .collect();
    (format!("WHERE importance IN ({placeholders})"), values)
}

fn message_from_row(row: &Row) -> Result<Message> {
    let role = row.text("role")?;
    Ok(Message {
        id: row.i64("id")?,
        role: role.parse::<Role>().map_err(|e| anyhow!(e))?,
        content: row.text("content")?,
        created_at: row.i64("created_at")?,
        importance: Importance::from_stored(row.opt_text("importance").as_deref(), Importance::Low),
        metadata: parse_metadata(row),
    })
}

fn active_file_from_row(row: &Row) -> Result<ActiveFile> {
    Ok(ActiveFile {
        id: row.i64("id")?,
        filename: row.text("filename")?,
        action: row.opt_text("action"),
        last_accessed: row.opt_i64("last_accessed")?.unwrap_or(0),
        metadata: parse_metadata(row),
    })
}

fn milestone_from_row(row: &Row) -> Result<Milestone> {
    Ok(Milestone {
        id: row.i64("id")?,
        title: row.opt_text("title").unwrap_or_default(),
        description: row.opt_text("description").unwrap_or_default(),
        importance: Importance::from_stored(
            row.opt_text("importance").as_deref(),
            Importance::Medium,
        ),
        created_at: row.opt_i64("created_at")?.unwrap_or(0),
        metadata: parse_metadata(row),
    })
}

fn decision_from_row(row: &Row) -> Result<Decision> {
    Ok(Decision {
        id: row.i64("id")?,
        title: row.opt_text("title").unwrap_or_default(),
        content: row.opt_text("content").unwrap_or_default(),
        reasoning: row.opt_text("reasoning"),
        importance: Importance::from_stored(
            row.opt_text("importance").as_deref(),
            Importance::Medium,
        ),
        created_at: row.opt_i64("created_at")?.unwrap_or(0),
        metadata: parse_metadata(row),
    })
}

fn requirement_from_row(row: &Row) -> Result<Requirement> {
    Ok(Requirement {
        id: row.i64("id")?,
        title: row.opt_text("title").unwrap_or_default(),
        content: row.opt_text("content").unwrap_or_default(),
        importance: Importance::from_stored(
            row.opt_text("importance").as_deref(),
            Importance::Medium,
        ),
        created_at: row.opt_i64("created_at")?.unwrap_or(0),
        metadata: parse_metadata(row),
    })
}

fn episode_from_row(row: &Row) -> Result<Episode> {
    Ok(Episode {
        id: row.i64("id")?,
        actor: row.opt_text("actor").unwrap_or_default(),
        action: row.opt_text("action").unwrap_or_default(),
        content: row.opt_text("content").unwrap_or_default(),
        timestamp: row.opt_i64("timestamp")?.unwrap_or(0),
        importance: Importance::from_stored(row.opt_text("importance").as_deref(), Importance::Low),
        context: row.opt_text("context"),
    })
}

#[async_trait]
impl MemoryStore for SqlStore {
    fn mode(&self) -> BackendMode {
        BackendMode::Durable
    }

    async fn ping(&self) -> Result<()> {
        crate::db::schema::probe(&self.adapter).await
    }

    async fn insert_message(&self, message: NewMessage) -> Result<i64> {
        self.insert(
            "INSERT INTO messages (role, content, created_at, importance, metadata) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                message.role.as_str().into(),
                message.content.into(),
                message.timestamp.into(),
                message.importance.as_str().into(),
                metadata_text(message.metadata.as_ref())?,
            ],
        )
        .await
    }

    async fn recent_messages(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Message>> {
        let (filter, mut values) = importance_clause(importance);
        values.push(limit.into());
        let sql = format!(
            "SELECT id, role, content, created_at, importance, metadata FROM messages \
             {filter} ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        self.select(&sql, values)
            .await?
            .iter()
            .map(message_from_row)
            .collect()
    }

    async fn upsert_active_file(&self, file: NewActiveFile) -> Result<i64> {
        self.insert(
            "INSERT INTO active_files (filename, action, last_accessed, metadata) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(filename) DO UPDATE SET \
             action = excluded.action, \
             last_accessed = excluded.last_accessed, \
             metadata = excluded.metadata",
            vec![
                file.filename.into(),
                file.action.into(),
                file.timestamp.into(),
                metadata_text(file.metadata.as_ref())?,
            ],
        )
        .await
    }

    async fn recent_active_files(&self, limit: usize) -> Result<Vec<ActiveFile>> {
        self.select(
            "SELECT id, filename, action, last_accessed, metadata FROM active_files \
             ORDER BY last_accessed DESC, id DESC LIMIT ?",
            vec![limit.into()],
        )
        .await?
        .iter()
        .map(active_file_from_row)
        .collect()
    }

    async fn insert_milestone(&self, milestone: NewMilestone) -> Result<i64> {
        self.insert(
            "INSERT INTO milestones (title, description, importance, created_at, metadata) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                milestone.title.into(),
                milestone.description.into(),
                milestone.importance.as_str().into(),
                milestone.timestamp.into(),
                metadata_text(milestone.metadata.as_ref())?,
            ],
        )
        .await
    }

    async fn recent_milestones(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Milestone>> {
        let (filter, mut values) = importance_clause(importance);
        values.push(limit.into());
        let sql = format!(
            "SELECT id, title, description, importance, created_at, metadata FROM milestones \
             {filter} ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        self.select(&sql, values)
            .await?
            .iter()
            .map(milestone_from_row)
            .collect()
    }

    async fn insert_decision(&self, decision: NewDecision) -> Result<i64> {
        self.insert(
            "INSERT INTO decisions (title, content, reasoning, importance, created_at, metadata) \
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                decision.title.into(),
                decision.content.into(),
                decision.reasoning.into(),
                decision.importance.as_str().into(),
                decision.timestamp.into(),
                metadata_text(decision.metadata.as_ref())?,
            ],
        )
        .await
    }

    async fn recent_decisions(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Decision>> {
        let (filter, mut values) = importance_clause(importance);
        values.push(limit.into());
        let sql = format!(
            "SELECT id, title, content, reasoning, importance, created_at, metadata FROM decisions \
             {filter} ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        self.select(&sql, values)
            .await?
            .iter()
            .map(decision_from_row)
            .collect()
    }

    async fn insert_requirement(&self, requirement: NewRequirement) -> Result<i64> {
        self.insert(
            "INSERT INTO requirements (title, content, importance, created_at, metadata) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                requirement.title.into(),
                requirement.content.into(),
                requirement.importance.as_str().into(),
                requirement.timestamp.into(),
                metadata_text(requirement.metadata.as_ref())?,
            ],
        )
        .await
    }

    async fn recent_requirements(
        &self,
        limit: usize,
        importance: &[Importance],
    ) -> Result<Vec<Requirement>> {
        let (filter, mut values) = importance_clause(importance);
        values.push(limit.into());
        let sql = format!(
            "SELECT id, title, content, importance, created_at, metadata FROM requirements \
             {filter} ORDER BY created_at DESC, id DESC LIMIT ?"
        );
        self.select(&sql, values)
            .await?
            .iter()
            .map(requirement_from_row)
            .collect()
    }

    async fn insert_episode(&self, episode: NewEpisode) -> Result<i64> {
        self.insert(
            "INSERT INTO episodes (actor, action, content, timestamp, importance, context) \
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                episode.actor.into(),
                episode.action.into(),
                episode.content.into(),
                episode.timestamp.into(),
                episode.importance.as_str().into(),
                episode.context.into(),
            ],
        )
        .await
    }

    async fn recent_episodes(&self, limit: usize, context: Option<&str>) -> Result<Vec<Episode>> {
        let (filter, mut values) = match context {
            Some(c) => ("WHERE context = ?", vec![SqlValue::from(c)]),
            None => ("", Vec::new()),
        };
        values.push(limit.into());
        let sql = format!(
            "SELECT id, actor, action, content, timestamp, importance, context FROM episodes \
             {filter} ORDER BY timestamp DESC, id DESC LIMIT ?"
        );
        self.select(&sql, values)
            .await?
            .iter()
            .map(episode_from_row)
            .collect()
    }

    async fn counts(&self) -> Result<CollectionCounts> {
        Ok(CollectionCounts {
            messages: self.count("messages").await?,
            active_files: self.count("active_files").await?,
            milestones: self.count("milestones").await?,
            decisions: self.count("decisions").await?,
            requirements: self.count("requirements").await?,
            episodes: self.count("episodes").await?,
        })
    }

    async fn message_time_range(&self) -> Result<(Option<i64>, Option<i64>)> {
        let rows = self
            .select(
                "SELECT MIN(created_at) as oldest, MAX(created_at) as newest FROM messages",
                Vec::new(),
            )
            .await?;
        match rows.first() {
            Some(row) => Ok((row.opt_i64("oldest")?, row.opt_i64("newest")?)),
            None => Ok((None, None)),
        }
    }

    async fn latest_episode_timestamp(&self) -> Result<Option<i64>> {
        let rows = self
            .select("SELECT MAX(timestamp) as latest FROM episodes", Vec::new())
            .await?;
        match rows.first() {
            Some(row) => row.opt_i64("latest"),
            None => Ok(None),
        }
    }
}
