//! Record types for the six memory collections.
//!
//! Time fields are held as raw epoch milliseconds. They become ISO-8601 strings
//! only when a record is serialized, which is the read boundary for every tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Importance level shared by every collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    /// The set kept by long-term context views.
    pub const SIGNIFICANT: [Importance; 2] = [Importance::High, Importance::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse a stored value, falling back to `default` for values written by
    /// older clients (e.g. `"critical"`).
    pub fn from_stored(value: Option<&str>, default: Importance) -> Importance {
        match value {
            Some(v) => v.parse().unwrap_or_else(|_| {
                tracing::warn!(value = v, "unrecognized importance in stored row");
                default
            }),
            None => default,
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown importance: {s} (expected low, medium or high)")),
        }
    }
}

/// Current wall clock as epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render epoch milliseconds as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn to_iso(millis: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn iso_millis<S: Serializer>(millis: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_iso(*millis))
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: i64,
    pub importance: Importance,
    pub metadata: Option<serde_json::Value>,
}

/// A file the user is working on. One row per filename.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFile {
    pub id: i64,
    pub filename: String,
    pub action: Option<String>,
    #[serde(serialize_with = "iso_millis")]
    pub last_accessed: i64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub importance: Importance,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: i64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub reasoning: Option<String>,
    pub importance: Importance,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: i64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requirement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub importance: Importance,
    #[serde(serialize_with = "iso_millis")]
    pub created_at: i64,
    pub metadata: Option<serde_json::Value>,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub content: String,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: i64,
    pub importance: Importance,
    pub context: Option<String>,
}

// Insert payloads. `timestamp` is supplied by the caller so composite
// operations can share one instant.

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub importance: Importance,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewActiveFile {
    pub filename: String,
    pub action: String,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub title: String,
    pub description: String,
    pub importance: Importance,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewDecision {
    pub title: String,
    pub content: String,
    pub reasoning: Option<String>,
    pub importance: Importance,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewRequirement {
    pub title: String,
    pub content: String,
    pub importance: Importance,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub actor: String,
    pub action: String,
    pub content: String,
    pub importance: Importance,
    pub context: Option<String>,
    pub timestamp: i64,
}
