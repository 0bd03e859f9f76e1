//! Terminal subcommands that run outside the MCP server.

pub mod doctor;
pub mod stats;
