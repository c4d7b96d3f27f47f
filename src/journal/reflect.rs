//! Reflection resolver: turns raw text into an annotated entry.
//!
//! Validation happens first and calls no model. The classifier, summarizer and
//! embedder then run concurrently on blocking threads, each under the same
//! timeout. Once all three finish, the configured failure policy decides what
//! gets assembled, and the new embedding is matched against the prior corpus.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

use super::index::most_similar;
use super::store;
use super::types::{AnnotatedEntry, CorpusEntry, EntryDraft, SimilarityMatch};
use crate::config::{MemoirConfig, SummarizerConfig};
use crate::embedding::EMBEDDING_DIM;
use crate::error::{Capability, JournalError, ModelUnavailable, StoreError, ValidationError};
use crate::models::ModelProvider;
use crate::sentiment::{self, Classification, Sentiment};
use crate::summary::{self, Summary};

/// What to do when the classifier cannot label an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentFailurePolicy {
    /// Fail the write with [`ModelUnavailable`].
    Surface,
    /// Store the entry as [`Sentiment::Unknown`] and log a warning.
    StoreUnknown,
}

impl FromStr for SentimentFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "surface" => Ok(Self::Surface),
            "unknown" => Ok(Self::StoreUnknown),
            _ => Err(format!(
                "invalid on_sentiment_failure: {s}. Must be one of: surface, unknown"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReflectOptions {
    pub min_words: usize,
    pub similarity_threshold: f32,
    pub classifier_max_words: usize,
    pub summarizer: SummarizerConfig,
    pub on_sentiment_failure: SentimentFailurePolicy,
    pub model_timeout: Duration,
}

impl ReflectOptions {
    pub fn from_config(config: &MemoirConfig) -> Result<Self> {
        let on_sentiment_failure = config
            .reflection
            .on_sentiment_failure
            .parse()
            .map_err(anyhow::Error::msg)?;
        Ok(Self {
            min_words: config.reflection.min_words,
            similarity_threshold: config.reflection.similarity_threshold,
            classifier_max_words: config.classifier.max_words,
            summarizer: config.summarizer.clone(),
            on_sentiment_failure,
            model_timeout: Duration::from_secs(config.reflection.model_timeout_secs),
        })
    }
}

impl Default for ReflectOptions {
    fn default() -> Self {
        let config = MemoirConfig::default();
        Self {
            min_words: config.reflection.min_words,
            similarity_threshold: config.reflection.similarity_threshold,
            classifier_max_words: config.classifier.max_words,
            summarizer: config.summarizer,
            on_sentiment_failure: SentimentFailurePolicy::Surface,
            model_timeout: Duration::from_secs(config.reflection.model_timeout_secs),
        }
    }
}

/// An annotated draft and its reflection, ready to append.
#[derive(Debug, Clone)]
pub struct Reflected {
    pub draft: EntryDraft,
    pub similar: Option<SimilarityMatch>,
}

/// Reject empty and too-short entries before any model runs.
pub fn validate(text: &str, min_words: usize) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    let words = text.split_whitespace().count();
    if words < min_words {
        return Err(ValidationError::TooShort {
            words,
            min: min_words,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct Resolver {
    models: ModelProvider,
    options: ReflectOptions,
}

impl Resolver {
    pub fn new(models: ModelProvider, options: ReflectOptions) -> Self {
        Self { models, options }
    }

    pub fn options(&self) -> &ReflectOptions {
        &self.options
    }

    /// Identifier recorded on every entry this resolver produces.
    pub fn embedding_model(&self) -> &str {
        self.models.embedder.model_id()
    }

    /// Annotate `text` and find the most recent similar entry in `corpus`.
    ///
    /// `corpus` must hold only entries written before this one, oldest first.
    pub async fn reflect(
        &self,
        text: &str,
        corpus: &[CorpusEntry],
    ) -> Result<Reflected, JournalError> {
        validate(text, self.options.min_words)?;

        let timeout = self.options.model_timeout;

        let classified = {
            let classifier = Arc::clone(&self.models.classifier);
            let text = text.to_string();
            let max_words = self.options.classifier_max_words;
            run_blocking(Capability::Classifier, timeout, move || {
                sentiment::classify(classifier.as_ref(), &text, max_words)
            })
        };
        let summarized = {
            let summarizer = Arc::clone(&self.models.summarizer);
            let text = text.to_string();
            let config = self.options.summarizer.clone();
            run_blocking(Capability::Summarizer, timeout, move || {
                summary::summarize(summarizer.as_ref(), &text, &config)
            })
        };
        let encoded = {
            let embedder = Arc::clone(&self.models.embedder);
            let text = text.to_string();
            run_blocking(Capability::Embedder, timeout, move || {
                embedder
                    .encode(&text)
                    .map_err(|e| ModelUnavailable::new(Capability::Embedder, format!("{e:#}")))
            })
        };

        let (classified, summarized, encoded) = tokio::join!(classified, summarized, encoded);

        let embedding = encoded?;
        if embedding.len() != EMBEDDING_DIM {
            return Err(ModelUnavailable::new(
                Capability::Embedder,
                format!(
                    "expected {EMBEDDING_DIM} dimensions, got {}",
                    embedding.len()
                ),
            )
            .into());
        }

        let classification = match classified {
            Ok(c) => c,
            Err(e) => match self.options.on_sentiment_failure {
                SentimentFailurePolicy::Surface => return Err(e.into()),
                SentimentFailurePolicy::StoreUnknown => {
                    tracing::warn!(capability = %e.capability, reason = %e.reason, "storing entry with UNKNOWN sentiment");
                    Classification {
                        label: Sentiment::Unknown,
                        confidence: None,
                        truncated: false,
                    }
                }
            },
        };

        let summary = summarized.unwrap_or_else(|e| {
            tracing::warn!(capability = %e.capability, reason = %e.reason, "storing entry without summary");
            Summary::default()
        });

        let similar = most_similar(&embedding, corpus, self.options.similarity_threshold);
        if let Some(m) = &similar {
            tracing::debug!(entry_id = %m.entry_id, score = m.score, "similar entry found");
        }

        Ok(Reflected {
            draft: EntryDraft {
                text: text.to_string(),
                sentiment: classification.label,
                confidence: classification.confidence,
                truncated: classification.truncated,
                summary: summary.text,
                tags: summary.tags,
                embedding,
                embedding_model: self.embedding_model().to_string(),
            },
            similar,
        })
    }
}

/// Run a synchronous model call on the blocking pool, bounded by `timeout`.
///
/// A timeout or a panicked task is reported as the capability being unavailable.
/// A timed-out task keeps running to completion; its result is discarded.
async fn run_blocking<T, F>(
    capability: Capability,
    timeout: Duration,
    f: F,
) -> Result<T, ModelUnavailable>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ModelUnavailable> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ModelUnavailable::new(
            capability,
            format!("task failed: {join_err}"),
        )),
        Err(_) => Err(ModelUnavailable::new(
            capability,
            format!("timed out after {}s", timeout.as_secs_f32()),
        )),
    }
}

/// Validate, annotate and append one entry to `user`'s journal.
///
/// The corpus is snapshotted and the entry appended under the connection lock,
/// both on the blocking pool; model calls run with the lock released. The entry
/// is stamped with the local time at append, so it is never older than anything
/// already stored.
pub async fn write_entry(
    db: &Arc<Mutex<Connection>>,
    resolver: &Resolver,
    user: &str,
    text: &str,
) -> Result<AnnotatedEntry, JournalError> {
    let corpus = {
        let db = Arc::clone(db);
        let user = user.to_string();
        let model = resolver.embedding_model().to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            store::corpus_snapshot(&conn, &user, &model)
        })
        .await
        .map_err(StoreError::from)??
    };

    let Reflected { draft, similar } = resolver.reflect(text, &corpus).await?;

    let entry = {
        let db = Arc::clone(db);
        let user = user.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            let created_at = Local::now().fixed_offset();
            store::append_entry(&mut conn, &user, &draft, created_at)
        })
        .await
        .map_err(StoreError::from)??
    };

    tracing::info!(
        user,
        entry_id = %entry.id,
        sentiment = %entry.sentiment,
        similar = similar.is_some(),
        "entry written"
    );

    Ok(AnnotatedEntry { entry, similar })
}
