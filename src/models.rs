//! The three model capabilities, bundled.
//!
//! Models are loaded once into a [`ModelProvider`] and handed to whatever
//! needs them. There are no process-wide model singletons.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::MemoirConfig;
use crate::embedding::{self, Embedder};
use crate::sentiment::{self, SentimentClassifier};
use crate::summary::{self, Summarizer};

#[derive(Clone)]
pub struct ModelProvider {
    pub classifier: Arc<dyn SentimentClassifier>,
    pub summarizer: Arc<dyn Summarizer>,
    pub embedder: Arc<dyn Embedder>,
}

impl ModelProvider {
    pub fn new(
        classifier: Arc<dyn SentimentClassifier>,
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            classifier,
            summarizer,
            embedder,
        }
    }

    /// Load every configured provider. Slow: ONNX sessions are built here.
    pub fn from_config(config: &MemoirConfig) -> Result<Self> {
        let classifier = sentiment::create_classifier(&config.classifier)
            .context("failed to create sentiment classifier")?;
        let summarizer = summary::create_summarizer(&config.summarizer)
            .context("failed to create summarizer")?;
        let embedder = embedding::create_embedder(&config.embedding)
            .context("failed to create embedder")?;

        tracing::info!(
            classifier = classifier.model_id(),
            summarizer = %config.summarizer.provider,
            embedder = embedder.model_id(),
            "model providers ready"
        );

        Ok(Self::new(
            Arc::from(classifier),
            Arc::from(summarizer),
            Arc::from(embedder),
        ))
    }
}
