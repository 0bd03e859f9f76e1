//! Local-file durable backend over `rusqlite`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::Connection;

use super::executor::{ExecOutcome, NamedParams, Row, SqlExecutor, SqlValue};

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<Value> for SqlValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Integer(i) => SqlValue::Integer(i),
            Value::Real(f) => SqlValue::Real(f),
            Value::Text(s) => SqlValue::Text(s),
            Value::Blob(b) => SqlValue::Blob(b),
        }
    }
}

/// SQLite file (or in-memory database) behind a mutex. Statements run on the
/// blocking pool so the async runtime never waits on disk I/O.
#[derive(Clone)]
pub struct LocalExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl LocalExecutor {
    /// Open (or create) the database file, creating its parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tracing::info!(dir = %parent.display(), "creating database directory");
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(5000))?;

        tracing::info!(path = %path.display(), "local SQLite database opened");
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (tests, diagnostics).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

fn run_blocking(conn: &Connection, sql: &str, params: &NamedParams) -> Result<ExecOutcome> {
    let mut stmt = conn.prepare(sql)?;
    let named: Vec<(&str, &dyn ToSql)> = params
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();

    if stmt.column_count() == 0 {
        let rows_affected = stmt.execute(named.as_slice())?;
        return Ok(ExecOutcome {
            rows_affected: rows_affected as u64,
            rows: Vec::new(),
        });
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = stmt.query(named.as_slice())?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let v: Value = row.get(i)?;
            values.push(SqlValue::from(v));
        }
        out.push(Row::new(columns.clone(), values));
    }

    Ok(ExecOutcome {
        rows_affected: 0,
        rows: out,
    })
}

#[async_trait]
impl SqlExecutor for LocalExecutor {
    async fn run(&self, sql: &str, params: NamedParams) -> Result<ExecOutcome> {
        let conn = Arc::clone(&self.conn);
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow!("db lock poisoned: {e}"))?;
            run_blocking(&conn, &sql, &params)
        })
        .await
        .map_err(|e| anyhow!("db task failed: {e}"))?
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}
