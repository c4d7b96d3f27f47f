#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone};
use memoir::db;
use memoir::embedding::{l2_normalize, Embedder, EMBEDDING_DIM};
use memoir::journal::reflect::{ReflectOptions, Resolver};
use memoir::journal::types::EntryDraft;
use memoir::models::ModelProvider;
use memoir::sentiment::lexicon::LexiconClassifier;
use memoir::sentiment::{Sentiment, SentimentClassifier};
use memoir::summary::extractive::ExtractiveSummarizer;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
/// Each seed produces a distinct, orthogonal vector.
pub fn test_embedding(seed: u16) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    v[seed as usize % EMBEDDING_DIM] = 1.0;
    v
}

/// Bag-of-words embedder: every word bumps one hashed dimension.
///
/// Texts sharing most of their words land close together, which is all the
/// reflection tests need. Deterministic across runs.
pub struct HashingEmbedder;

impl Embedder for HashingEmbedder {
    fn encode(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            v[(hasher.finish() % EMBEDDING_DIM as u64) as usize] += 1.0;
        }
        Ok(l2_normalize(&v))
    }

    fn model_id(&self) -> &str {
        "hashing-test"
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn encode(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("embedding model not loaded")
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

pub struct FailingClassifier;

impl SentimentClassifier for FailingClassifier {
    fn predict(&self, _text: &str) -> anyhow::Result<(Sentiment, Option<f32>)> {
        anyhow::bail!("classifier crashed")
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Lexicon sentiment, extractive summaries, hashed embeddings. No model files.
pub fn test_models() -> ModelProvider {
    ModelProvider::new(
        Arc::new(LexiconClassifier::new()),
        Arc::new(ExtractiveSummarizer::new()),
        Arc::new(HashingEmbedder),
    )
}

pub fn test_resolver() -> Resolver {
    Resolver::new(test_models(), ReflectOptions::default())
}

/// A draft with fixed annotations and the given embedding.
pub fn test_draft(text: &str, sentiment: Sentiment, embedding: Vec<f32>) -> EntryDraft {
    EntryDraft {
        text: text.to_string(),
        sentiment,
        confidence: None,
        truncated: false,
        summary: text.to_string(),
        tags: Default::default(),
        embedding,
        embedding_model: "hashing-test".to_string(),
    }
}

/// Timestamp in UTC+2 on the given 2024 date.
pub fn at(month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, month, day, hour, 0, 0)
        .unwrap()
}
