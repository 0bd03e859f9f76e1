mod helpers;

use chrono::{TimeZone, Utc};
use cursor10x::memory::store::MemoryStore;
use cursor10x::tools::{dispatch, dispatch_at, MemoryTools, ToolName};
use helpers::{args, durable_store, fallback_store};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn call(store: &dyn MemoryStore, name: &str, arguments: Value) -> Value {
    let response = dispatch(store, name, args(arguments)).await;
    assert!(!response.is_error, "{name} failed: {}", response.payload);
    response.payload
}

#[tokio::test]
async fn stored_message_reads_back_with_iso_timestamp() {
    let store = fallback_store();
    let stored = call(
        store.as_ref(),
        "storeUserMessage",
        json!({"content": "hello", "importance": "low"}),
    )
    .await;
    assert_eq!(stored["status"], "ok");
    assert!(stored["timestamp"].is_i64());

    let read = call(store.as_ref(), "getRecentMessages", json!({"limit": 1})).await;
    let messages = read["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[0]["role"], "user");
    let created_at = messages[0]["created_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    assert!(created_at.ends_with('Z'));
}

#[tokio::test]
async fn tracking_the_same_file_twice_keeps_one_row() {
    let tmp = TempDir::new().unwrap();
    for store in [fallback_store(), durable_store(&tmp).await] {
        call(store.as_ref(), "trackActiveFile", json!({"filename": "/a/b.js", "action": "open"})).await;
        let second = call(
            store.as_ref(),
            "trackActiveFile",
            json!({"filename": "/a/b.js", "action": "edit"}),
        )
        .await;
        assert_eq!(second["filename"], "/a/b.js");
        assert_eq!(second["action"], "edit");

        let files = call(store.as_ref(), "getActiveFiles", json!({"limit": 10})).await;
        let files = files["files"].as_array().unwrap();
        assert_eq!(files.len(), 1, "mode {}", store.mode());
        assert_eq!(files[0]["action"], "edit");
    }
}

#[tokio::test]
async fn low_importance_decisions_stay_out_of_context() {
    let store = fallback_store();
    call(
        store.as_ref(),
        "storeDecision",
        json!({"title": "use X", "content": "...", "importance": "low"}),
    )
    .await;
    let ctx = call(store.as_ref(), "getComprehensiveContext", json!({})).await;
    assert_eq!(ctx["context"]["longTerm"]["decisions"], json!([]));

    call(
        store.as_ref(),
        "storeDecision",
        json!({"title": "use Y", "content": "...", "importance": "high"}),
    )
    .await;
    let ctx = call(store.as_ref(), "getComprehensiveContext", json!({})).await;
    let decisions = ctx["context"]["longTerm"]["decisions"].as_array().unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0]["title"], "use Y");
}

#[tokio::test]
async fn storing_a_milestone_records_one_episode() {
    let store = fallback_store();
    let stored = call(
        store.as_ref(),
        "storeMilestone",
        json!({"title": "Auth shipped", "description": "login + logout"}),
    )
    .await;
    assert_eq!(stored["title"], "Auth shipped");

    let episodes = call(store.as_ref(), "getRecentEpisodes", json!({})).await;
    let episodes = episodes["episodes"].as_array().unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0]["action"], "milestone_created");
    assert_eq!(episodes[0]["content"], "Auth shipped");
    assert_eq!(episodes[0]["importance"], "medium");
}

#[tokio::test]
async fn end_conversation_reports_three_writes_sharing_a_timestamp() {
    let store = fallback_store();
    let out = call(
        store.as_ref(),
        "endConversation",
        json!({
            "content": "All done",
            "milestone_title": "Refactor",
            "milestone_description": "split modules"
        }),
    )
    .await;

    let results = &out["results"];
    assert_eq!(results["assistantMessage"]["stored"], true);
    assert_eq!(results["milestone"]["stored"], true);
    assert_eq!(results["episode"]["stored"], true);
    assert_eq!(results["milestone"]["title"], "Refactor");
    assert_eq!(results["episode"]["action"], "completion");
    let ts = &results["assistantMessage"]["timestamp"];
    assert_eq!(&results["milestone"]["timestamp"], ts);
    assert_eq!(&results["episode"]["timestamp"], ts);
}

#[tokio::test]
async fn init_conversation_returns_banner_and_context() {
    let store = fallback_store();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let response = dispatch_at(
        store.as_ref(),
        "initConversation",
        args(json!({"content": "Let's add caching"})),
        &now,
    )
    .await;
    assert!(!response.is_error);

    let out = response.payload;
    let banner = &out["display"]["banner"];
    assert_eq!(banner["mode"], "in-memory");
    assert_eq!(banner["memory_count"], 1);
    assert_eq!(banner["last_accessed"], "0 minutes ago");
    assert_eq!(out["internal"]["messageStored"], true);
    assert_eq!(out["internal"]["timestamp"], now.timestamp_millis());
    assert_eq!(
        out["internal"]["context"]["shortTerm"]["recentMessages"][0]["content"],
        "Let's add caching"
    );
}

#[tokio::test]
async fn banner_health_and_stats_on_empty_store() {
    let store = fallback_store();

    let banner = call(store.as_ref(), "generateBanner", json!({})).await;
    assert_eq!(banner["memory_system"], "active");
    assert_eq!(banner["last_accessed"], "Never");

    let health = dispatch(store.as_ref(), "checkHealth", None).await;
    assert!(!health.is_error);
    assert_eq!(health.payload["mode"], "in-memory");
    assert_eq!(health.payload["message_count"], 0);

    let stats = dispatch(store.as_ref(), "getMemoryStats", None).await;
    assert_eq!(stats.payload["stats"]["episode_count"], 0);
    assert!(stats.payload["stats"]["oldest_memory"].is_null());
}

#[tokio::test]
async fn durable_health_reports_turso_mode() {
    let tmp = TempDir::new().unwrap();
    let store = durable_store(&tmp).await;
    let health = call(store.as_ref(), "checkHealth", json!({})).await;
    assert_eq!(health["mode"], "turso");
}

#[tokio::test]
async fn validation_errors_leave_the_store_untouched() {
    let store = fallback_store();

    let missing = dispatch(store.as_ref(), "storeMilestone", args(json!({"title": "x"}))).await;
    assert!(missing.is_error);
    assert!(missing.payload["error"]
        .as_str()
        .unwrap()
        .contains("description"));

    let empty = dispatch(store.as_ref(), "recordEpisode", args(json!({"actor": "", "action": "a", "content": "c"}))).await;
    assert!(empty.is_error);
    assert_eq!(empty.payload["error"], "actor is required");

    let none = dispatch(store.as_ref(), "endConversation", None).await;
    assert_eq!(none.payload["error"], "No arguments provided");

    assert_eq!(store.counts().await.unwrap().total(), 0);
}

#[test]
fn tool_listing_matches_names() {
    let names: Vec<String> = MemoryTools::tools().iter().map(|t| t.name.to_string()).collect();
    for tool in ToolName::ALL {
        assert!(names.contains(&tool.as_str().to_string()));
    }
}
