//! Statement adapter: one `execute(template, values)` contract over any executor.
//!
//! Templates use positional `?` placeholders. Before reaching the driver they are
//! rewritten to uniquely named placeholders (`:param1`, `:param2`, …) in
//! left-to-right order and the ordered values are rebound under those names.
//! Multi-statement bodies are split on `;` and run one fragment at a time.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use super::executor::{ExecOutcome, NamedParams, SqlExecutor, SqlValue};

/// A statement failed; the statement text travels with the error.
#[derive(Debug, Error)]
#[error("{message} (statement: {statement})")]
pub struct StatementError {
    pub statement: String,
    pub message: String,
}

/// Rewrite positional `?` placeholders to `:param1`, `:param2`, ….
///
/// `?` inside single-quoted, double-quoted or backtick-quoted text is left alone.
/// Returns the rewritten SQL and the number of placeholders found.
pub fn rewrite_placeholders(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 16);
    let mut count = 0;
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match quote {
            Some(q) => {
                // A doubled quote ('') toggles out and straight back in.
                if ch == q {
                    quote = None;
                }
                out.push(ch);
            }
            None => match ch {
                '\'' | '"' | '`' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '?' => {
                    count += 1;
                    out.push_str(&format!(":param{count}"));
                }
                _ => out.push(ch),
            },
        }
    }

    (out, count)
}

/// Rebind ordered values to the names produced by [`rewrite_placeholders`].
pub fn bind_named(values: Vec<SqlValue>) -> NamedParams {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!(":param{}", i + 1), v))
        .collect()
}

/// Split a semicolon-separated body into trimmed, non-empty statements.
pub fn split_statements(body: &str) -> Vec<&str> {
    body.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether a statement yields a result set (as opposed to a row count).
pub fn returns_rows(sql: &str) -> bool {
    let head = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    matches!(head.as_str(), "SELECT" | "WITH" | "PRAGMA" | "VALUES" | "EXPLAIN")
        || sql.to_ascii_uppercase().contains(" RETURNING ")
}

/// Uniform execution over a durable backend. Cheap to clone; no state besides
/// the shared executor.
#[derive(Clone)]
pub struct StatementAdapter {
    executor: Arc<dyn SqlExecutor>,
}

impl StatementAdapter {
    pub fn new(executor: Arc<dyn SqlExecutor>) -> Self {
        Self { executor }
    }

    pub fn kind(&self) -> &'static str {
        self.executor.kind()
    }

    /// Run one templated statement with ordered positional values.
    pub async fn execute(
        &self,
        template: &str,
        values: Vec<SqlValue>,
    ) -> Result<ExecOutcome, StatementError> {
        let (sql, placeholders) = rewrite_placeholders(template);
        if placeholders != values.len() {
            return Err(StatementError {
                statement: template.trim().to_string(),
                message: format!(
                    "expected {placeholders} parameters, got {}",
                    values.len()
                ),
            });
        }
        let params = bind_named(values);
        tracing::debug!(sql = %sql, params = ?params, "running statement");

        self.executor
            .run(&sql, params)
            .await
            .map_err(|e| {
                tracing::error!(statement = %template.trim(), error = %e, "statement failed");
                StatementError {
                    statement: template.trim().to_string(),
                    message: format!("{e:#}"),
                }
            })
    }

    /// Run every statement of a semicolon-separated body, in order, stopping at
    /// the first failure.
    pub async fn execute_batch(&self, body: &str) -> Result<(), StatementError> {
        for statement in split_statements(body) {
            self.execute(statement, Vec::new()).await?;
        }
        Ok(())
    }
}
