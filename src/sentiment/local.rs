//! Local ONNX Runtime sentiment classifier.
//!
//! Runs a 3-class RoBERTa sentiment model (twitter-roberta-base-sentiment-latest)
//! and takes the softmax argmax over its logits.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{Sentiment, SentimentClassifier};
use crate::config::ClassifierConfig;
use crate::onnx::{self, ModelFiles};

/// RoBERTa position limit.
const MAX_SEQ_LEN: usize = 512;

/// Logit order of the model head.
const LABELS: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

pub struct LocalClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model: String,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
unsafe impl Send for LocalClassifier {}
unsafe impl Sync for LocalClassifier {}

impl LocalClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let files = ModelFiles::in_dir(&config.cache_dir);
        files.ensure_present()?;

        Ok(Self {
            session: Mutex::new(onnx::load_session(&files.model)?),
            tokenizer: onnx::load_tokenizer(&files.tokenizer, MAX_SEQ_LEN)?,
            model: config.model.clone(),
        })
    }
}

impl SentimentClassifier for LocalClassifier {
    fn predict(&self, text: &str) -> Result<(Sentiment, Option<f32>)> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let shape = vec![1i64, ids.len() as i64];

        let input_ids = Tensor::from_array((shape.clone(), ids.into_boxed_slice()))?;
        let attention_mask = Tensor::from_array((shape, mask.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
        })?;

        let logits_value = onnx::named_output(|name| outputs.get(name), &["logits"])?;
        let (shape, data) = logits_value
            .try_extract_tensor::<f32>()
            .context("failed to extract logits tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[1] == LABELS.len() as i64,
            "unexpected logits shape: {dims:?}, expected [1, {}]",
            LABELS.len()
        );

        let probs = softmax(&data[..LABELS.len()]);
        let (best, p) = argmax(&probs).context("empty logits")?;
        Ok((LABELS[best], Some(p)))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Index and value of the largest element; the first one wins ties.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some((2, 0.7)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    #[ignore] // Requires model files, see `memoir model download`
    fn test_classifies_proud_entry_as_positive() {
        let classifier = LocalClassifier::new(&ClassifierConfig::default()).unwrap();
        let (label, confidence) = classifier
            .predict("I finally felt proud of finishing my project today and it made me smile")
            .unwrap();
        assert_eq!(label, Sentiment::Positive);
        assert!(confidence.unwrap() > 0.5);
    }

    #[test]
    #[ignore]
    fn test_classification_is_deterministic() {
        let classifier = LocalClassifier::new(&ClassifierConfig::default()).unwrap();
        let text = "The train was late again and I missed the start of the meeting";
        assert_eq!(classifier.predict(text).unwrap(), classifier.predict(text).unwrap());
    }
}
