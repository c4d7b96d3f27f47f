//! Shared ONNX Runtime plumbing for the local model providers.
//!
//! Every local model lives in its own cache directory holding `model.onnx`
//! and `tokenizer.json`, as fetched by `memoir model download`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ort::session::Session;
use tokenizers::Tokenizer;

/// Paths of the two files a local model needs.
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    pub fn in_dir(cache_dir: &str) -> Self {
        let dir = crate::config::expand_tilde(cache_dir);
        Self {
            model: dir.join("model.onnx"),
            tokenizer: dir.join("tokenizer.json"),
        }
    }

    pub fn ensure_present(&self) -> Result<()> {
        anyhow::ensure!(
            self.model.exists(),
            "ONNX model not found at {}. Run `memoir model download` first.",
            self.model.display()
        );
        anyhow::ensure!(
            self.tokenizer.exists(),
            "Tokenizer not found at {}. Run `memoir model download` first.",
            self.tokenizer.display()
        );
        Ok(())
    }
}

/// Build an optimized inference session from an ONNX file.
pub fn load_session(model_path: &Path) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)
        .context("failed to load ONNX model")?;

    tracing::info!(model = %model_path.display(), "ONNX model loaded");
    Ok(session)
}

/// Load a tokenizer with truncation at `max_len` tokens and batch-longest padding.
pub fn load_tokenizer(tokenizer_path: &Path, max_len: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

    tokenizer.with_padding(Some(tokenizers::PaddingParams {
        strategy: tokenizers::PaddingStrategy::BatchLongest,
        ..Default::default()
    }));

    tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");
    Ok(tokenizer)
}

/// The first of `names` the session produced. Output names vary by export.
pub fn named_output<'a, V>(
    lookup: impl Fn(&str) -> Option<&'a V>,
    names: &[&str],
) -> Result<&'a V> {
    names
        .iter()
        .find_map(|&name| lookup(name))
        .with_context(|| format!("model produced none of the outputs: {}", names.join(", ")))
}
