use anyhow::Result;
use serde::Serialize;

use memoir::config::MemoirConfig;
use memoir::journal::store;
use memoir::journal::types::Entry;

/// Export format. Embeddings are left out; they are model-specific.
#[derive(Debug, Serialize)]
struct ExportData<'a> {
    user: &'a str,
    entries: Vec<Entry>,
}

/// Export one user's journal as JSON to stdout.
pub fn export(config: &MemoirConfig, user: &str) -> Result<()> {
    let conn = super::open_db(config)?;
    let data = ExportData {
        user,
        entries: store::list_entries(&conn, user)?,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} entries.", data.entries.len());
    Ok(())
}
