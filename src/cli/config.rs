//! Configuration management for healthrag
//!
//! Provides TOML-based configuration with defaults, environment overrides
//! and validation.
//! Location: ~/.healthrag/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::embedding::DEFAULT_MODEL_ID;
use crate::errors::{RagError, Result};
use crate::llm::client::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_TEMPERATURE};
use crate::rag::pipeline::PipelineConfig;
use crate::store::{DEFAULT_COLLECTION, DEFAULT_QDRANT_URL};

/// Complete configuration for healthrag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub pipeline: PipelineConfig,
    pub paths: PathsConfig,
}

/// Ollama connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Embedding model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model_id: String,
}

/// Vector store connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub url: String,
    pub collection: String,
}

/// File system paths configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub state_dir: String,
    pub log_dir: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_dir: "~/.healthrag".to_string(),
            log_dir: "~/.healthrag/logs".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply the environment
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = path {
            Self::load_from_file(&config_path)?
        } else {
            Self::load_default()?
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }
        Ok(Self::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".healthrag").join("config.toml"))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    ///
    /// Numeric keys that fail to parse are rejected rather than ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.base_url = if host.contains("://") {
                host
            } else {
                format!("http://{}", host)
            };
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.vector_store.collection = collection;
        }
        if let Some(top_k) = lookup("TOP_K") {
            self.pipeline.top_k = parse_override("TOP_K", &top_k)?;
        }
        if let Some(threshold) = lookup("CONFIDENCE_THRESHOLD") {
            self.pipeline.confidence_threshold =
                parse_override("CONFIDENCE_THRESHOLD", &threshold)?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }

        let threshold = self.pipeline.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RagError::Config(
                "confidence_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.pipeline.max_history == 0 {
            return Err(RagError::Config("max_history must be greater than 0".to_string()));
        }

        if self.ollama.model.trim().is_empty() {
            return Err(RagError::Config("ollama.model must not be empty".to_string()));
        }

        if self.embedding.model_id.trim().is_empty() {
            return Err(RagError::Config("embedding.model_id must not be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    /// Get log directory path
    pub fn log_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.log_dir)
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RagError::Config(format!("invalid {} value '{}'", key, value)))
}
