//! Text-to-vector encoding.
//!
//! Provides the [`Embedder`] trait and a local implementation using
//! all-MiniLM-L6-v2 (384 dimensions, L2-normalized). The provider is created
//! via [`create_embedder`] from configuration.
//!
//! Encodings are deterministic for a given model but not comparable across
//! models, which is why every stored entry records the model that encoded it.

pub mod local;

use anyhow::Result;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for encoding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`] dimensions.
/// All methods are synchronous; callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait Embedder: Send + Sync {
    /// Encode a single text string into a vector.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode a batch of texts. Implementations may override for batched inference.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }

    /// Identifier stored next to every vector this embedder produces.
    fn model_id(&self) -> &str;
}

/// Create an embedder from config.
///
/// Currently only `"local"` is supported (ONNX Runtime + all-MiniLM-L6-v2).
/// Returns an error if model files are not found; run `memoir model download` first.
pub fn create_embedder(config: &crate::config::EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbedder::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let v = vec![3.0, 4.0];
        let normalized = l2_normalize(&v);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(l2_normalize(&v), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = crate::config::EmbeddingConfig {
            provider: "cloud".into(),
            ..Default::default()
        };
        let err = create_embedder(&config).err().unwrap();
        assert!(err.to_string().contains("unknown embedding provider"));
    }
}
