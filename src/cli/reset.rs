//! CLI `reset` command: delete every journal after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use memoir::config::MemoirConfig;

pub fn reset(config: &MemoirConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL journal entries, notes and audit logs.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let conn = super::open_db(config)?;
    conn.execute_batch(
        "DELETE FROM entry_log;
         DELETE FROM future_notes;
         DELETE FROM entry_vectors;
         DELETE FROM entries;
         DELETE FROM schema_meta WHERE key = 'embedding_model';",
    )?;

    println!("All journals deleted. Database reset complete.");
    Ok(())
}
