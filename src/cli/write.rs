//! CLI `write` command: annotate and store one entry, then show the reflection.

use std::io::Read;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use memoir::config::MemoirConfig;
use memoir::db;
use memoir::journal::reflect::{self, ReflectOptions, Resolver};
use memoir::journal::store;
use memoir::models::ModelProvider;

pub async fn write(config: &MemoirConfig, user: &str, text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read entry from stdin")?;
            buf
        }
    };

    let conn = super::open_db(config)?;
    let models = ModelProvider::from_config(config)?;
    let resolver = Resolver::new(models, ReflectOptions::from_config(config)?);
    db::sync_embedding_model(&conn, resolver.embedding_model())?;
    let db = Arc::new(Mutex::new(conn));

    let annotated = reflect::write_entry(&db, &resolver, user, &text).await?;
    let entry = &annotated.entry;

    println!("Saved entry for {}", entry.created_at.format("%Y-%m-%d %H:%M"));
    println!("Sentiment: {}", entry.sentiment);
    if entry.truncated {
        println!("  (only the beginning of this entry was used for sentiment)");
    }
    if !entry.summary.is_empty() {
        println!("Summary:   {}", entry.summary);
    }
    if !entry.tags.is_empty() {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        println!("Tags:      {}", tags.join(", "));
    }

    if let Some(similar) = &annotated.similar {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        if let Some(prior) = store::get_entry(&conn, user, &similar.entry_id)? {
            println!();
            println!(
                "You've felt this before, on {} (similarity {:.2}):",
                prior.date(),
                similar.score
            );
            println!("  {}", prior.text);
        }
    }

    Ok(())
}
