//! Networked durable backend: Turso / libSQL over HTTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Builder, Connection, Database};

use super::executor::{ExecOutcome, NamedParams, Row, SqlExecutor, SqlValue};
use super::statement::returns_rows;

impl From<SqlValue> for libsql::Value {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => libsql::Value::Null,
            SqlValue::Integer(i) => libsql::Value::Integer(i),
            SqlValue::Real(f) => libsql::Value::Real(f),
            SqlValue::Text(s) => libsql::Value::Text(s),
            SqlValue::Blob(b) => libsql::Value::Blob(b),
        }
    }
}

impl From<libsql::Value> for SqlValue {
    fn from(v: libsql::Value) -> Self {
        match v {
            libsql::Value::Null => SqlValue::Null,
            libsql::Value::Integer(i) => SqlValue::Integer(i),
            libsql::Value::Real(f) => SqlValue::Real(f),
            libsql::Value::Text(s) => SqlValue::Text(s),
            libsql::Value::Blob(b) => SqlValue::Blob(b),
        }
    }
}

/// One remote connection. Request/response ordering is FIFO per connection;
/// nothing here spans statements.
pub struct RemoteExecutor {
    // Keeps the client alive for the lifetime of the connection.
    _db: Database,
    conn: Connection,
}

impl RemoteExecutor {
    pub async fn connect(url: &str, auth_token: &str) -> Result<Self> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await
            .context("failed to create remote libSQL client")?;
        let conn = db.connect().context("failed to connect to remote libSQL database")?;
        Ok(Self { _db: db, conn })
    }
}

fn to_params(params: NamedParams) -> Params {
    if params.is_empty() {
        return Params::None;
    }
    Params::Named(
        params
            .into_iter()
            .map(|(name, value)| (name, libsql::Value::from(value)))
            .collect(),
    )
}

#[async_trait]
impl SqlExecutor for RemoteExecutor {
    async fn run(&self, sql: &str, params: NamedParams) -> Result<ExecOutcome> {
        let params = to_params(params);

        if !returns_rows(sql) {
            let rows_affected = self.conn.execute(sql, params).await?;
            return Ok(ExecOutcome {
                rows_affected,
                rows: Vec::new(),
            });
        }

        let mut rows = self.conn.query(sql, params).await?;
        let columns: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(SqlValue::from(row.get_value(i as i32)?));
            }
            out.push(Row::new(columns.clone(), values));
        }

        Ok(ExecOutcome {
            rows_affected: 0,
            rows: out,
        })
    }

    fn kind(&self) -> &'static str {
        "libsql"
    }
}
