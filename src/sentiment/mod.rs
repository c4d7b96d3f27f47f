//! Sentiment classification.
//!
//! Provides the [`SentimentClassifier`] trait, the [`Sentiment`] label set, and
//! [`classify`], which applies the word budget before calling a provider and
//! turns provider failures into [`ModelUnavailable`].
//!
//! Providers: `local` (ONNX Runtime, 3-class RoBERTa) and `lexicon` (marker
//! words, no model files).

pub mod lexicon;
pub mod local;

use std::borrow::Cow;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{Capability, ModelUnavailable};

/// Categorical sentiment of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    /// Stored when classification failed and the deployment opted to keep the entry anyway.
    Unknown,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
        Sentiment::Unknown,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Mood graph score: positive 1, negative -1, everything else 0.
    pub fn mood_score(&self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
            Self::Neutral | Self::Unknown => 0,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(format!("unknown sentiment label: {s}")),
        }
    }
}

/// Trait for sentiment providers.
///
/// Implementations must be deterministic for a fixed model. All methods are
/// synchronous; callers in async contexts should use `tokio::task::spawn_blocking`.
pub trait SentimentClassifier: Send + Sync {
    /// Label a non-empty text. The optional score is the provider's confidence in the label.
    fn predict(&self, text: &str) -> Result<(Sentiment, Option<f32>)>;

    fn model_id(&self) -> &str;
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// The provider only saw the first `max_words` words.
    pub truncated: bool,
}

/// Classify `text`, head-truncating it to `max_words` words first.
///
/// Empty input and provider errors come back as [`ModelUnavailable`] so the
/// caller can decide whether the entry may be stored as [`Sentiment::Unknown`].
pub fn classify(
    classifier: &dyn SentimentClassifier,
    text: &str,
    max_words: usize,
) -> Result<Classification, ModelUnavailable> {
    if text.trim().is_empty() {
        return Err(ModelUnavailable::new(
            Capability::Classifier,
            "cannot classify empty text",
        ));
    }

    let (input, truncated) = truncate_words(text, max_words);
    if truncated {
        tracing::debug!(max_words, "classifier input head-truncated");
    }

    let (label, confidence) = classifier
        .predict(&input)
        .map_err(|e| ModelUnavailable::new(Capability::Classifier, format!("{e:#}")))?;

    Ok(Classification {
        label,
        confidence,
        truncated,
    })
}

/// Keep the first `max_words` whitespace-separated words.
///
/// Returns the input untouched (and `false`) when it already fits.
pub fn truncate_words(text: &str, max_words: usize) -> (Cow<'_, str>, bool) {
    if text.split_whitespace().count() <= max_words {
        return (Cow::Borrowed(text), false);
    }
    let head: Vec<&str> = text.split_whitespace().take(max_words).collect();
    (Cow::Owned(head.join(" ")), true)
}

/// Create the configured classifier.
pub fn create_classifier(
    config: &crate::config::ClassifierConfig,
) -> Result<Box<dyn SentimentClassifier>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalClassifier::new(config)?)),
        "lexicon" => Ok(Box::new(lexicon::LexiconClassifier::new())),
        other => anyhow::bail!("unknown classifier provider: {other}. Supported: local, lexicon"),
    }
}
