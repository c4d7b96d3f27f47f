use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MemoirConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub classifier: ClassifierConfig,
    pub summarizer: SummarizerConfig,
    pub reflection: ReflectionConfig,
    pub insights: InsightsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub default_user: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    /// Hugging Face repository the ONNX export is downloaded from.
    pub repo: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    pub provider: String,
    pub model: String,
    pub repo: String,
    pub cache_dir: String,
    /// Word budget; longer entries are head-truncated before classification.
    pub max_words: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SummarizerConfig {
    pub provider: String,
    pub max_words: usize,
    /// Summaries shorter than this produce no tags.
    pub min_words: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReflectionConfig {
    pub min_words: usize,
    pub similarity_threshold: f32,
    /// `"surface"` or `"unknown"`.
    pub on_sentiment_failure: String,
    pub model_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InsightsConfig {
    /// `"all"` or `"exclude_latest"`.
    pub mood_window: String,
    pub trend_window: usize,
    pub min_entries: usize,
    pub top_tags: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 7420,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memoir_dir()
            .join("journal.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_user: "me".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            repo: "sentence-transformers/all-MiniLM-L6-v2".into(),
            cache_dir: default_model_dir("all-MiniLM-L6-v2"),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            model: "twitter-roberta-base-sentiment-latest".into(),
            repo: "Xenova/twitter-roberta-base-sentiment-latest".into(),
            cache_dir: default_model_dir("twitter-roberta-base-sentiment-latest"),
            max_words: 500,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: "extractive".into(),
            max_words: 50,
            min_words: 10,
        }
    }
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            min_words: 10,
            similarity_threshold: crate::journal::index::DEFAULT_SIMILARITY_THRESHOLD,
            on_sentiment_failure: "surface".into(),
            model_timeout_secs: 30,
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            mood_window: "all".into(),
            trend_window: 3,
            min_entries: 2,
            top_tags: 5,
        }
    }
}

/// Returns `~/.memoir/`, falling back to the working directory when there is no home.
pub fn default_memoir_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memoir")
}

/// Returns the default config file path: `~/.memoir/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memoir_dir().join("config.toml")
}

fn default_model_dir(model: &str) -> String {
    default_memoir_dir()
        .join("models")
        .join(model)
        .to_string_lossy()
        .into_owned()
}

impl MemoirConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoirConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMOIR_DB, MEMOIR_USER, MEMOIR_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMOIR_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_USER") {
            self.storage.default_user = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// The user a command acts on when none is given explicitly.
    pub fn user_or_default<'a>(&'a self, user: Option<&'a str>) -> &'a str {
        user.unwrap_or(&self.storage.default_user)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
