use anyhow::Result;

use crate::config::MemoryConfig;
use crate::memory::stats::StatsResponse;

/// Display memory statistics in the terminal.
pub async fn stats(config: &MemoryConfig) -> Result<()> {
    let store = crate::db::select_backend(&config.storage).await?;
    let response = crate::memory::stats::memory_stats(store.as_ref()).await?;

    println!("Memory Statistics ({})", store.mode());
    println!("{}", "=".repeat(40));
    print!("{}", render(&response));

    Ok(())
}

fn render(response: &StatsResponse) -> String {
    let rows = [
        ("Messages", response.message_count),
        ("Active files", response.active_file_count),
        ("Milestones", response.milestone_count),
        ("Decisions", response.decision_count),
        ("Requirements", response.requirement_count),
        ("Episodes", response.episode_count),
    ];

    let mut out = String::new();
    for (label, count) in rows {
        out.push_str(&format!("  {:<20} {}\n", format!("{label}:"), count));
    }
    out.push('\n');
    out.push_str(&format!(
        "Oldest message:        {}\n",
        response.oldest_memory.as_deref().unwrap_or("(none)")
    ));
    out.push_str(&format!(
        "Newest message:        {}\n",
        response.newest_memory.as_deref().unwrap_or("(none)")
    ));
    out
}
