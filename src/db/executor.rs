//! The execution contract shared by both durable backends.
//!
//! A [`SqlExecutor`] runs one statement with named parameters and hands back an
//! [`ExecOutcome`]. Everything above this layer (statement adapter, repositories)
//! is written once against the trait.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// A single SQL value, independent of the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for SqlValue {
    fn from(v: usize) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Named parameters in binding order, e.g. `[(":param1", …), (":param2", …)]`.
pub type NamedParams = Vec<(String, SqlValue)>;

/// One result row, columns kept in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn i64(&self, column: &str) -> Result<i64> {
        match self.get(column) {
            Some(SqlValue::Integer(v)) => Ok(*v),
            Some(SqlValue::Real(v)) => Ok(*v as i64),
            Some(SqlValue::Text(s)) => s
                .parse()
                .map_err(|_| anyhow!("column {column} is not an integer: {s:?}")),
            other => Err(anyhow!("column {column} is not an integer: {other:?}")),
        }
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>> {
        match self.get(column) {
            None | Some(SqlValue::Null) => Ok(None),
            Some(_) => self.i64(column).map(Some),
        }
    }

    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)
            .ok_or_else(|| anyhow!("column {column} is missing or null"))
    }

    /// Text column, `None` for SQL NULL.
    pub fn opt_text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Integer(v) => Some(v.to_string()),
            SqlValue::Real(v) => Some(v.to_string()),
            SqlValue::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            SqlValue::Null => None,
        }
    }
}

/// What a single statement produced.
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub rows: Vec<Row>,
}

impl ExecOutcome {
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// A live connection to a durable backend.
///
/// Implementations hold no state besides the connection and must tolerate
/// overlapping calls; no atomicity is promised across two `run` calls.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run one statement whose placeholders are already named (`:param1`, …).
    async fn run(&self, sql: &str, params: NamedParams) -> Result<ExecOutcome>;

    /// Short label for logs: `"sqlite"` or `"libsql"`.
    fn kind(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            vec!["id".into(), "title".into(), "reasoning".into(), "count".into()],
            vec![
                SqlValue::Integer(7),
                SqlValue::Text("use X".into()),
                SqlValue::Null,
                SqlValue::Text("12".into()),
            ],
        )
    }

    #[test]
    fn typed_getters() {
        let row = row();
        assert_eq!(row.i64("id").unwrap(), 7);
        assert_eq!(row.text("title").unwrap(), "use X");
        assert_eq!(row.opt_text("reasoning"), None);
        assert_eq!(row.i64("count").unwrap(), 12);
        assert!(row.text("reasoning").is_err());
        assert!(row.get("missing").is_none());
        assert_eq!(row.opt_i64("reasoning").unwrap(), None);
    }

    #[test]
    fn option_converts_to_null() {
        let v: SqlValue = Option::<String>::None.into();
        assert_eq!(v, SqlValue::Null);
        let v: SqlValue = Some("x").into();
        assert_eq!(v, SqlValue::Text("x".into()));
    }
}
