//! Status banner and the relative-time formatter behind "Latest Memory".

use anyhow::Result;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::Serialize;

use super::store::MemoryStore;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const WEEK_MS: i64 = 7 * 24 * HOUR_MS;

/// Banner shown when the store could not be read.
pub const BANNER_UNAVAILABLE: &str =
    "🧠 Memory System: Issue\n🗂️ Total Memories: Unknown\n🕚 Latest Memory: Unknown";

#[derive(Debug, Clone, Serialize)]
pub struct Banner {
    pub status: &'static str,
    pub formatted_banner: String,
    pub memory_system: &'static str,
    pub mode: &'static str,
    pub memory_count: u64,
    pub last_accessed: String,
}

/// Describe `timestamp` (epoch ms) relative to `now`, in `now`'s time zone.
///
/// Bands: under an hour ("N minutes ago"), same calendar day ("Today at H:MM"),
/// previous calendar day ("Yesterday at H:MM"), under a week ("Monday at H:MM"),
/// otherwise "M/D/YYYY at H:MM".
pub fn format_relative<Tz: TimeZone>(timestamp: i64, now: &DateTime<Tz>) -> String {
    let elapsed = now.timestamp_millis() - timestamp;
    if elapsed < HOUR_MS {
        let minutes = (elapsed / MINUTE_MS).max(0);
        let plural = if minutes == 1 { "" } else { "s" };
        return format!("{minutes} minute{plural} ago");
    }

    let Some(date) = now.timezone().timestamp_millis_opt(timestamp).single() else {
        return "Unknown".to_string();
    };
    let clock = format!("{}:{:02}", date.hour(), date.minute());
    let day = date.date_naive();
    let today = now.date_naive();

    if day == today {
        format!("Today at {clock}")
    } else if today.pred_opt() == Some(day) {
        format!("Yesterday at {clock}")
    } else if elapsed < WEEK_MS {
        format!("{} at {clock}", day.format("%A"))
    } else {
        format!("{}/{}/{} at {clock}", day.month(), day.day(), day.year())
    }
}

/// Count all six collections and describe the newest message or episode.
pub async fn generate_banner<Tz: TimeZone>(
    store: &dyn MemoryStore,
    now: &DateTime<Tz>,
) -> Result<Banner> {
    let memory_count = store.counts().await?.total();
    let (_, newest_message) = store.message_time_range().await?;
    let newest_episode = store.latest_episode_timestamp().await?;

    let last_accessed = newest_message
        .into_iter()
        .chain(newest_episode)
        .max()
        .map(|ts| format_relative(ts, now))
        .unwrap_or_else(|| "Never".to_string());

    let formatted_banner = [
        "🧠 Memory System: Active".to_string(),
        format!("🗂️ Total Memories: {memory_count}"),
        format!("🕚 Latest Memory: {last_accessed}"),
    ]
    .join("\n");

    Ok(Banner {
        status: "ok",
        formatted_banner,
        memory_system: "active",
        mode: store.mode().as_str(),
        memory_count,
        last_accessed,
    })
}
