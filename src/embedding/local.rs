//! Local ONNX Runtime embedder.
//!
//! Implements [`Embedder`] using the all-MiniLM-L6-v2 model via `ort`.
//! Handles tokenization, inference, mean pooling, and L2 normalization.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{l2_normalize, Embedder, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;
use crate::onnx::{self, ModelFiles};

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

/// Local ONNX-based embedder using all-MiniLM-L6-v2.
pub struct LocalEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model: String,
}

// Safety: Tokenizer is Send+Sync. Session is behind a Mutex.
unsafe impl Send for LocalEmbedder {}
unsafe impl Sync for LocalEmbedder {}

impl LocalEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let files = ModelFiles::in_dir(&config.cache_dir);
        files.ensure_present()?;

        Ok(Self {
            session: Mutex::new(onnx::load_session(&files.model)?),
            tokenizer: onnx::load_tokenizer(&files.tokenizer, MAX_SEQ_LEN)?,
            model: config.model.clone(),
        })
    }
}

impl Embedder for LocalEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text])?
            .into_iter()
            .next()
            .context("embedding batch returned no vectors")
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let seq_len = encodings[0].get_ids().len();

        let mut input_ids_flat = Vec::with_capacity(batch_size * seq_len);
        let mut attention_mask_flat = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids_flat.extend(encoding.get_ids().iter().map(|&id| id as i64));
            attention_mask_flat.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
        }

        let shape = vec![batch_size as i64, seq_len as i64];
        let input_ids_tensor =
            Tensor::from_array((shape.clone(), input_ids_flat.into_boxed_slice()))?;
        let attention_mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask_flat.clone().into_boxed_slice()))?;
        // single segment: token_type_ids are all zero
        let token_type_ids = vec![0i64; batch_size * seq_len];
        let token_type_ids_tensor =
            Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor,
        })?;

        let token_emb_value = onnx::named_output(
            |name| outputs.get(name),
            &["token_embeddings", "last_hidden_state"],
        )?;

        let (shape, data) = token_emb_value
            .try_extract_tensor::<f32>()
            .context("failed to extract token_embeddings tensor")?;

        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token_embeddings shape: {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );
        let hidden_dim = dims[2] as usize;
        let actual_seq_len = dims[1] as usize;

        // Mean pooling weighted by the attention mask
        let mut results = Vec::with_capacity(batch_size);
        for b in 0..batch_size {
            let mut sum = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;

            for s in 0..actual_seq_len {
                let mask = attention_mask_flat[b * seq_len + s] as f32;
                if mask > 0.0 {
                    let offset = (b * actual_seq_len + s) * hidden_dim;
                    for (d, acc) in sum.iter_mut().enumerate() {
                        *acc += data[offset + d] * mask;
                    }
                    count += mask;
                }
            }

            if count > 0.0 {
                sum.iter_mut().for_each(|x| *x /= count);
            }

            results.push(l2_normalize(&sum));
        }

        Ok(results)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::index::cosine_similarity;

    fn provider() -> LocalEmbedder {
        LocalEmbedder::new(&EmbeddingConfig::default()).unwrap()
    }

    #[test]
    fn missing_model_files_point_at_download() {
        let config = EmbeddingConfig {
            cache_dir: "/nonexistent/memoir-models".into(),
            ..Default::default()
        };
        let err = LocalEmbedder::new(&config).err().unwrap();
        assert!(err.to_string().contains("memoir model download"));
    }

    #[test]
    #[ignore] // Requires model files: cargo test -- --ignored
    fn test_encode_produces_384_dims() {
        let embedding = provider().encode("Hello world").unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIM);
    }

    #[test]
    #[ignore]
    fn test_encode_is_deterministic() {
        let p = provider();
        let a = p.encode("Long walk by the river after work").unwrap();
        let b = p.encode("Long walk by the river after work").unwrap();
        assert_eq!(a, b, "same input must produce identical output");
    }

    #[test]
    #[ignore]
    fn test_similar_entries_score_above_reflection_threshold() {
        let p = provider();
        let a = p
            .encode("I finally felt proud of finishing my project today and it made me smile")
            .unwrap();
        let b = p
            .encode("Today I felt really proud of finishing my project and I could not stop smiling")
            .unwrap();
        let c = p.encode("The quarterly tax forms are due next Tuesday").unwrap();

        let sim_similar = cosine_similarity(&a, &b);
        let sim_different = cosine_similarity(&a, &c);
        assert!(sim_similar > 0.7, "got {sim_similar}");
        assert!(sim_different < sim_similar);
    }
}
