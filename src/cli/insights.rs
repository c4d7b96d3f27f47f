//! CLI `insights` command.

use anyhow::Result;

use memoir::config::MemoirConfig;
use memoir::journal::insights::{self, InsightsOptions};
use memoir::journal::store;

pub fn insights(config: &MemoirConfig, user: &str, json: bool) -> Result<()> {
    let options = InsightsOptions::from_config(&config.insights)?;
    let conn = super::open_db(config)?;
    let entries = store::list_entries(&conn, user)?;
    let report = insights::insights(&entries, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let Some(mood) = &report.mood else {
        println!(
            "Write more entries to view insights ({} of {} so far).",
            report.entry_count, options.min_entries
        );
        return Ok(());
    };

    println!("Mood overview ({} entries)", report.entry_count);
    println!("  Positive:  {}", mood.counts.positive);
    println!("  Negative:  {}", mood.counts.negative);
    println!("  Neutral:   {}", mood.counts.neutral);
    if mood.counts.unknown > 0 {
        println!("  Unknown:   {}", mood.counts.unknown);
    }
    println!();
    println!("Current streak: {} day(s)", mood.streak_length);
    println!("Trend: {}", mood.trend);
    println!("  {}", mood.narrative);

    if !report.recurring_tags.is_empty() {
        println!();
        println!("Top recurring thoughts:");
        for tag in &report.recurring_tags {
            println!("  {} ({})", tag.tag, tag.count);
        }
    }

    println!();
    println!("Mood over time:");
    for point in &report.timeline {
        let bar = match point.score {
            1 => "+",
            -1 => "-",
            _ => "=",
        };
        println!("  {}  {bar}", point.created_at.format("%Y-%m-%d"));
    }

    Ok(())
}
