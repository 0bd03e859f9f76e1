//! SQL DDL for the six memory tables.
//!
//! Defines `messages`, `active_files`, `milestones`, `decisions`, `requirements`
//! and `episodes`, plus `test_connection` used by the startup write check. All DDL
//! uses `IF NOT EXISTS`; existing tables are never altered.

use anyhow::{anyhow, Result};

use super::executor::SqlValue;
use super::statement::{StatementAdapter, StatementError};

/// Names of the six memory tables, in creation order.
pub const TABLES: [&str; 6] = [
    "messages",
    "active_files",
    "milestones",
    "decisions",
    "requirements",
    "episodes",
];

/// All schema DDL statements, semicolon separated.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    metadata TEXT,
    importance TEXT DEFAULT 'low'
);

CREATE TABLE IF NOT EXISTS active_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT UNIQUE,
    action TEXT,
    last_accessed INTEGER,
    metadata TEXT
);

CREATE TABLE IF NOT EXISTS milestones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    description TEXT,
    importance TEXT DEFAULT 'medium',
    created_at INTEGER,
    metadata TEXT
);

CREATE TABLE IF NOT EXISTS decisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    content TEXT,
    reasoning TEXT,
    importance TEXT DEFAULT 'medium',
    created_at INTEGER,
    metadata TEXT
);

CREATE TABLE IF NOT EXISTS requirements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    content TEXT,
    importance TEXT DEFAULT 'medium',
    created_at INTEGER,
    metadata TEXT
);

CREATE TABLE IF NOT EXISTS episodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor TEXT,
    action TEXT,
    content TEXT,
    timestamp INTEGER,
    importance TEXT DEFAULT 'low',
    context TEXT
);

CREATE TABLE IF NOT EXISTS test_connection (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    created_at TEXT
);
"#;

/// Create every table that does not exist yet. Idempotent.
pub async fn init_schema(adapter: &StatementAdapter) -> Result<(), StatementError> {
    adapter.execute_batch(SCHEMA_SQL).await?;
    for table in TABLES {
        tracing::debug!(table, "table verified/created");
    }
    Ok(())
}

/// Round-trip probe: `SELECT 1`.
pub async fn probe(adapter: &StatementAdapter) -> Result<()> {
    let out = adapter.execute("SELECT 1 as test", Vec::new()).await?;
    let value = out
        .first()
        .ok_or_else(|| anyhow!("connection probe returned no rows"))?
        .i64("test")?;
    anyhow::ensure!(value == 1, "connection probe returned {value}");
    Ok(())
}

/// Write then read back one row of `test_connection`.
pub async fn write_self_test(adapter: &StatementAdapter) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    adapter
        .execute(
            "INSERT INTO test_connection (name, created_at) VALUES ('test', ?)",
            vec![SqlValue::from(now.clone())],
        )
        .await?;

    let out = adapter
        .execute(
            "SELECT id, name, created_at FROM test_connection ORDER BY id DESC LIMIT 1",
            Vec::new(),
        )
        .await?;
    let row = out
        .first()
        .ok_or_else(|| anyhow!("write test row was not readable"))?;
    anyhow::ensure!(
        row.opt_text("created_at").as_deref() == Some(now.as_str()),
        "write test read back a different row"
    );
    tracing::debug!(id = row.i64("id")?, "write test successful");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::local::LocalExecutor;
    use std::sync::Arc;

    fn adapter() -> StatementAdapter {
        StatementAdapter::new(Arc::new(LocalExecutor::open_in_memory().unwrap()))
    }

    async fn table_names(adapter: &StatementAdapter) -> Vec<String> {
        adapter
            .execute(
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                Vec::new(),
            )
            .await
            .unwrap()
            .rows
            .iter()
            .map(|r| r.text("name").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn schema_creates_all_tables() {
        let adapter = adapter();
        init_schema(&adapter).await.unwrap();

        let tables = table_names(&adapter).await;
        for table in TABLES {
            assert!(tables.contains(&table.to_string()), "{table} missing");
        }
        assert!(tables.contains(&"test_connection".to_string()));
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let adapter = adapter();
        init_schema(&adapter).await.unwrap();
        init_schema(&adapter).await.unwrap(); // second call should not error
    }

    #[tokio::test]
    async fn tolerates_preexisting_tables() {
        let adapter = adapter();
        adapter
            .execute(
                "CREATE TABLE messages (id INTEGER PRIMARY KEY AUTOINCREMENT, role TEXT NOT NULL, \
                 content TEXT NOT NULL, created_at INTEGER NOT NULL, metadata TEXT, importance TEXT DEFAULT 'low')",
                Vec::new(),
            )
            .await
            .unwrap();
        adapter
            .execute(
                "INSERT INTO messages (role, content, created_at) VALUES ('user', 'kept', 1)",
                Vec::new(),
            )
            .await
            .unwrap();

        init_schema(&adapter).await.unwrap();

        let out = adapter
            .execute("SELECT COUNT(*) as count FROM messages", Vec::new())
            .await
            .unwrap();
        assert_eq!(out.first().unwrap().i64("count").unwrap(), 1);
    }

    #[tokio::test]
    async fn probe_and_self_test_pass() {
        let adapter = adapter();
        probe(&adapter).await.unwrap();
        init_schema(&adapter).await.unwrap();
        write_self_test(&adapter).await.unwrap();
    }

    #[tokio::test]
    async fn self_test_fails_without_schema() {
        let adapter = adapter();
        let err = write_self_test(&adapter).await.unwrap_err();
        assert!(format!("{err:#}").contains("test_connection"));
    }
}
