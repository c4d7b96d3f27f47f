use anyhow::Result;

use memoir::config::MemoirConfig;
use memoir::journal::store;

/// Print the most recent entries, newest first.
pub fn entries(config: &MemoirConfig, user: &str, limit: usize) -> Result<()> {
    let conn = super::open_db(config)?;
    let entries = store::recent_entries(&conn, user, limit)?;

    if entries.is_empty() {
        println!("No entries yet. Try `memoir write`.");
        return Ok(());
    }

    for entry in entries {
        println!("{}  [{}]", entry.created_at.format("%Y-%m-%d %H:%M"), entry.sentiment);
        println!("  {}", entry.text);
        if !entry.summary.is_empty() && entry.summary != entry.text {
            println!("  summary: {}", entry.summary);
        }
        println!();
    }
    Ok(())
}
