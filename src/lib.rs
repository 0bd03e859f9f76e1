//! Persistent conversation memory for coding assistants, served over MCP.
//!
//! cursor10x is an [MCP](https://modelcontextprotocol.io/) server that keeps six kinds of
//! memory across sessions:
//!
//! | Collection | Holds | Default importance |
//! |------------|-------|--------------------|
//! | **messages** | user and assistant messages | low |
//! | **active_files** | one row per file the user touches (upserted) | n/a |
//! | **milestones** | completed pieces of work | medium |
//! | **decisions** | design decisions with optional reasoning | medium |
//! | **requirements** | project requirements | medium |
//! | **episodes** | append-only audit log of actions | low |
//!
//! # Architecture
//!
//! - **Storage**: a durable SQL backend (local SQLite file or remote Turso/libSQL) chosen
//!   once at startup, with an in-process fallback store when it is unreachable
//! - **Context**: one bounded, newest-first snapshot across all collections
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP/SSE
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: Backend selection, SQL executors, statement adapter and schema
//! - [`memory`]: Stores, repositories, context aggregation, stats and banner
//! - [`tools`]: MCP tool surface and dispatcher

pub mod cli;
pub mod config;
pub mod db;
pub mod memory;
pub mod server;
pub mod tools;
