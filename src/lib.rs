//! Journaling analytics: sentiment, summaries, memory-mirror reflections and mood insights.
//!
//! memoir keeps a per-user, append-only journal. Every entry is annotated once,
//! at write time, with a sentiment label, a short summary and tags, and an
//! embedding. The embedding is used to surface the most recent prior entry
//! that "felt like this". Longitudinal views (mood distribution, writing
//! streaks, trend narratives) are recomputed from the stored history.
//!
//! # Architecture
//!
//! - **Storage**: SQLite, with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   holding the fixed-width entry vectors
//! - **Models**: local ONNX Runtime (all-MiniLM-L6-v2 embeddings, RoBERTa sentiment),
//!   a lexicon sentiment fallback, and an extractive summarizer
//! - **Surfaces**: a CLI and an MCP server over stdio or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`], [`sentiment`], [`summary`]: the three model capabilities
//! - [`models`]: the capabilities bundled for injection
//! - [`journal`]: the entry store, reflection resolver, similarity index and insights

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod journal;
pub mod models;
pub mod onnx;
pub mod sentiment;
pub mod summary;
