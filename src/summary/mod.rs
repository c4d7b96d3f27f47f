//! Summaries and tags.
//!
//! A [`Summarizer`] condenses an entry into a short summary. Tags are then
//! taken from that summary rather than from the raw text: every summary word
//! longer than four characters, stripped of punctuation and lowercased.

pub mod extractive;

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Serialize;

use crate::config::SummarizerConfig;
use crate::error::{Capability, ModelUnavailable};

/// Trait for summarization providers. Synchronous, like the other capabilities.
pub trait Summarizer: Send + Sync {
    /// Produce a summary of at most `max_words` words. May return less, or nothing.
    fn summarize(&self, text: &str, max_words: usize) -> Result<String>;
}

/// A summary together with the tags derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    pub tags: BTreeSet<String>,
}

/// Summarize `text` and derive tags.
///
/// A summary below `min_words` is kept as-is but yields no tags.
pub fn summarize(
    summarizer: &dyn Summarizer,
    text: &str,
    config: &SummarizerConfig,
) -> Result<Summary, ModelUnavailable> {
    let summary = summarizer
        .summarize(text, config.max_words)
        .map_err(|e| ModelUnavailable::new(Capability::Summarizer, format!("{e:#}")))?;

    let tags = if summary.split_whitespace().count() < config.min_words {
        BTreeSet::new()
    } else {
        extract_tags(&summary)
    };

    Ok(Summary {
        text: summary,
        tags,
    })
}

/// Summary words longer than four characters, punctuation-trimmed and lowercased.
pub fn extract_tags(summary: &str) -> BTreeSet<String> {
    summary
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() > 4)
        .collect()
}

/// Create the configured summarizer.
pub fn create_summarizer(config: &SummarizerConfig) -> Result<Box<dyn Summarizer>> {
    match config.provider.as_str() {
        "extractive" => Ok(Box::new(extractive::ExtractiveSummarizer::new())),
        other => anyhow::bail!("unknown summarizer provider: {other}. Supported: extractive"),
    }
}
