//! Memory engine: record types, the two stores, repositories and the read-side
//! views (context, stats, banner) built on them.

pub mod banner;
pub mod context;
pub mod conversation;
pub mod fallback;
pub mod repository;
pub mod sql;
pub mod stats;
pub mod store;
pub mod types;
