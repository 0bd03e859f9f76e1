//! MCP tool surface.
//!
//! [`dispatch`] maps a tool name and its raw JSON arguments onto the memory
//! engine and always produces a [`ToolResponse`]: failures, unknown tools and
//! missing arguments become error envelopes rather than protocol errors.
//! [`MemoryTools`] is the `rmcp` handler that lists the tools and forwards calls.

pub mod conversation;
pub mod episodic;
pub mod long_term;
pub mod short_term;
pub mod system;

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData as McpError, JsonObject,
    ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::memory::banner::BANNER_UNAVAILABLE;
use crate::memory::store::MemoryStore;
use crate::memory::types::Role;

use conversation::{EndConversationParams, InitConversationParams};
use episodic::{GetRecentEpisodesParams, RecordEpisodeParams};
use long_term::{StoreDecisionParams, StoreMilestoneParams, StoreRequirementParams};
use short_term::{
    GetActiveFilesParams, GetRecentMessagesParams, StoreMessageParams, TrackActiveFileParams,
};
use system::NoParams;

/// Default `limit` for list tools.
pub const DEFAULT_LIMIT: usize = 10;

const NO_ARGUMENTS: &str = "No arguments provided";

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GenerateBanner,
    CheckHealth,
    InitConversation,
    EndConversation,
    StoreUserMessage,
    StoreAssistantMessage,
    TrackActiveFile,
    GetRecentMessages,
    GetActiveFiles,
    StoreMilestone,
    StoreDecision,
    StoreRequirement,
    RecordEpisode,
    GetRecentEpisodes,
    GetComprehensiveContext,
    GetMemoryStats,
}

impl ToolName {
    pub const ALL: [ToolName; 16] = [
        Self::GenerateBanner,
        Self::CheckHealth,
        Self::InitConversation,
        Self::EndConversation,
        Self::StoreUserMessage,
        Self::StoreAssistantMessage,
        Self::TrackActiveFile,
        Self::GetRecentMessages,
        Self::GetActiveFiles,
        Self::StoreMilestone,
        Self::StoreDecision,
        Self::StoreRequirement,
        Self::RecordEpisode,
        Self::GetRecentEpisodes,
        Self::GetComprehensiveContext,
        Self::GetMemoryStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateBanner => "generateBanner",
            Self::CheckHealth => "checkHealth",
            Self::InitConversation => "initConversation",
            Self::EndConversation => "endConversation",
            Self::StoreUserMessage => "storeUserMessage",
            Self::StoreAssistantMessage => "storeAssistantMessage",
            Self::TrackActiveFile => "trackActiveFile",
            Self::GetRecentMessages => "getRecentMessages",
            Self::GetActiveFiles => "getActiveFiles",
            Self::StoreMilestone => "storeMilestone",
            Self::StoreDecision => "storeDecision",
            Self::StoreRequirement => "storeRequirement",
            Self::RecordEpisode => "recordEpisode",
            Self::GetRecentEpisodes => "getRecentEpisodes",
            Self::GetComprehensiveContext => "getComprehensiveContext",
            Self::GetMemoryStats => "getMemoryStats",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Self::GenerateBanner => {
                "Generates a banner containing memory system statistics and status"
            }
            Self::CheckHealth => "Checks the health of the memory system and its database",
            Self::InitConversation => {
                "Initializes a conversation by storing the user message, generating a banner, \
                 and retrieving context in one operation"
            }
            Self::EndConversation => {
                "Ends a conversation by storing the assistant message, recording a milestone, \
                 and logging an episode in one operation"
            }
            Self::StoreUserMessage => "Stores a user message in the short-term memory",
            Self::StoreAssistantMessage => "Stores an assistant message in the short-term memory",
            Self::TrackActiveFile => "Tracks an active file being accessed by the user",
            Self::GetRecentMessages => "Retrieves recent messages from the short-term memory",
            Self::GetActiveFiles => "Retrieves active files from the short-term memory",
            Self::StoreMilestone => "Stores a project milestone in the long-term memory",
            Self::StoreDecision => "Stores a project decision in the long-term memory",
            Self::StoreRequirement => "Stores a project requirement in the long-term memory",
            Self::RecordEpisode => "Records an episode (action) in the episodic memory",
            Self::GetRecentEpisodes => "Retrieves recent episodes from the episodic memory",
            Self::GetComprehensiveContext => {
                "Retrieves comprehensive context from all memory systems"
            }
            Self::GetMemoryStats => "Retrieves statistics about the memory system",
        }
    }

    /// Tools that run without an argument object.
    pub fn accepts_no_arguments(&self) -> bool {
        matches!(
            self,
            Self::GenerateBanner
                | Self::CheckHealth
                | Self::GetComprehensiveContext
                | Self::GetMemoryStats
                | Self::GetRecentMessages
                | Self::GetActiveFiles
                | Self::GetRecentEpisodes
        )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        match self {
            Self::GenerateBanner
            | Self::CheckHealth
            | Self::GetComprehensiveContext
            | Self::GetMemoryStats => schema_for::<NoParams>(),
            Self::InitConversation => schema_for::<InitConversationParams>(),
            Self::EndConversation => schema_for::<EndConversationParams>(),
            Self::StoreUserMessage | Self::StoreAssistantMessage => {
                schema_for::<StoreMessageParams>()
            }
            Self::TrackActiveFile => schema_for::<TrackActiveFileParams>(),
            Self::GetRecentMessages => schema_for::<GetRecentMessagesParams>(),
            Self::GetActiveFiles => schema_for::<GetActiveFilesParams>(),
            Self::StoreMilestone => schema_for::<StoreMilestoneParams>(),
            Self::StoreDecision => schema_for::<StoreDecisionParams>(),
            Self::StoreRequirement => schema_for::<StoreRequirementParams>(),
            Self::RecordEpisode => schema_for::<RecordEpisodeParams>(),
            Self::GetRecentEpisodes => schema_for::<GetRecentEpisodesParams>(),
        }
    }

    pub fn to_tool(&self) -> Tool {
        Tool::new(
            Cow::Borrowed(self.as_str()),
            Cow::Borrowed(self.description()),
            self.input_schema(),
        )
    }
}

fn schema_for<T: JsonSchema>() -> Arc<JsonObject> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// The JSON payload of one tool call plus its error flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn ok(payload: Value) -> Self {
        Self {
            payload,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            payload: json!({ "status": "error", "error": message.into() }),
            is_error: true,
        }
    }

    /// `{content: [{type: "text", text}], isError}`.
    pub fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.payload.to_string())];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

fn required_args<T: DeserializeOwned>(arguments: Option<JsonObject>) -> Result<T> {
    let args = arguments.ok_or_else(|| anyhow!(NO_ARGUMENTS))?;
    serde_json::from_value(Value::Object(args)).map_err(|e| anyhow!("invalid arguments: {e}"))
}

fn optional_args<T: DeserializeOwned + Default>(arguments: Option<JsonObject>) -> Result<T> {
    match arguments {
        Some(args) => serde_json::from_value(Value::Object(args))
            .map_err(|e| anyhow!("invalid arguments: {e}")),
        None => Ok(T::default()),
    }
}

/// Run one tool call against `store`, stamped with the current local time.
pub async fn dispatch(
    store: &dyn MemoryStore,
    name: &str,
    arguments: Option<JsonObject>,
) -> ToolResponse {
    dispatch_at(store, name, arguments, &Local::now()).await
}

/// [`dispatch`] with an explicit clock.
pub async fn dispatch_at<Tz: TimeZone>(
    store: &dyn MemoryStore,
    name: &str,
    arguments: Option<JsonObject>,
    now: &DateTime<Tz>,
) -> ToolResponse {
    let Some(tool) = ToolName::from_name(name) else {
        tracing::warn!(tool = name, "unknown tool");
        return ToolResponse::error(format!("Unknown tool: {name}"));
    };
    if arguments.is_none() && !tool.accepts_no_arguments() {
        return ToolResponse::error(NO_ARGUMENTS);
    }

    tracing::info!(tool = name, mode = %store.mode(), "tool called");
    let ts = now.timestamp_millis();

    let result = match tool {
        ToolName::GenerateBanner => system::banner(store, now).await,
        ToolName::CheckHealth => system::health(store, ts).await,
        ToolName::GetComprehensiveContext => system::comprehensive_context(store, ts).await,
        ToolName::GetMemoryStats => system::stats(store).await,
        ToolName::InitConversation => match required_args(arguments) {
            Ok(p) => conversation::init_conversation(store, p, now).await,
            Err(e) => Err(e),
        },
        ToolName::EndConversation => match required_args(arguments) {
            Ok(p) => conversation::end_conversation(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::StoreUserMessage => match required_args(arguments) {
            Ok(p) => short_term::store_message(store, Role::User, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::StoreAssistantMessage => match required_args(arguments) {
            Ok(p) => short_term::store_message(store, Role::Assistant, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::TrackActiveFile => match required_args(arguments) {
            Ok(p) => short_term::track_active_file(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::GetRecentMessages => match optional_args(arguments) {
            Ok(p) => short_term::get_recent_messages(store, p).await,
            Err(e) => Err(e),
        },
        ToolName::GetActiveFiles => match optional_args(arguments) {
            Ok(p) => short_term::get_active_files(store, p).await,
            Err(e) => Err(e),
        },
        ToolName::StoreMilestone => match required_args(arguments) {
            Ok(p) => long_term::store_milestone(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::StoreDecision => match required_args(arguments) {
            Ok(p) => long_term::store_decision(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::StoreRequirement => match required_args(arguments) {
            Ok(p) => long_term::store_requirement(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::RecordEpisode => match required_args(arguments) {
            Ok(p) => episodic::record_episode(store, p, ts).await,
            Err(e) => Err(e),
        },
        ToolName::GetRecentEpisodes => match optional_args(arguments) {
            Ok(p) => episodic::get_recent_episodes(store, p).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(payload) => ToolResponse::ok(payload),
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(tool = name, error = %message, "tool failed");
            let mut response = ToolResponse::error(message);
            match tool {
                ToolName::GenerateBanner => {
                    response.payload["formatted_banner"] = Value::from(BANNER_UNAVAILABLE);
                }
                ToolName::InitConversation => {
                    response.payload["display"] =
                        json!({ "banner": { "formatted_banner": BANNER_UNAVAILABLE } });
                }
                _ => {}
            }
            response
        }
    }
}

/// The MCP tool handler. Holds the store chosen at startup.
#[derive(Clone)]
pub struct MemoryTools {
    store: Arc<dyn MemoryStore>,
}

impl MemoryTools {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    pub fn tools() -> Vec<Tool> {
        ToolName::ALL.iter().map(ToolName::to_tool).collect()
    }
}

impl ServerHandler for MemoryTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Persistent conversation memory. Call initConversation at the start of a \
                 conversation and endConversation at the end; use the store* tools to record \
                 milestones, decisions and requirements as they happen."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(Self::tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let response = dispatch(self.store.as_ref(), &request.name, request.arguments).await;
        Ok(response.into_call_result())
    }
}
