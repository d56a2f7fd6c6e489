//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `Settings::default()` + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_SCORING__MIN_SCORE=0.3`). Provides helpers to expand `~` and `${VAR}`
//! and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Load from the working directory; the environment comes from `RUST_ENV` (default `dev`).
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        if matches!(env, "prod" | "production") {
            if settings.embedding.endpoint.is_none() {
                anyhow::bail!("Prod config must set embedding.endpoint; lexical-only retrieval is a dev mode");
            }
            if settings.llm.endpoint.is_none() {
                anyhow::bail!("Prod config must set llm.endpoint");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub scoring: ScoringSettings,
    pub planner: PlannerSettings,
    pub llm: LlmSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be > 0".into()));
        }
        if c.overlap >= c.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                c.overlap, c.chunk_size
            )));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be > 0".into()));
        }
        if self.embedding.concurrency == 0 || self.ingest.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency limits must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.ingest.max_non_text_ratio) {
            return Err(Error::InvalidConfig("ingest.max_non_text_ratio must be within [0, 1]".into()));
        }
        let s = &self.scoring;
        if !(-1.0..=s.max_score).contains(&s.min_score) {
            return Err(Error::InvalidConfig(format!(
                "scoring.min_score ({}) must be within [-1, max_score ({})]",
                s.min_score, s.max_score
            )));
        }
        let p = &self.planner;
        if p.default_k == 0 || p.reduced_k == 0 || p.max_keywords == 0 {
            return Err(Error::InvalidConfig("planner k values and max_keywords must be > 0".into()));
        }
        if p.default_k > p.max_k {
            return Err(Error::InvalidConfig("planner.default_k must not exceed planner.max_k".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Folder the CLI ingests when none is given on the command line.
    pub docs_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { docs_dir: "~/docqa/docs".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters repeated from the end of the previous chunk.
    pub overlap: usize,
    /// How far back from the hard limit to look for a paragraph or sentence break.
    pub boundary_window: usize,
    /// Keywords kept as tags per chunk.
    pub max_tags: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 100, boundary_window: 200, max_tags: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub min_content_chars: usize,
    pub max_non_text_ratio: f64,
    pub min_average_chunk_chars: usize,
    /// Files processed in parallel by batch ingest.
    pub concurrency: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { min_content_chars: 16, max_non_text_ratio: 0.10, min_average_chunk_chars: 100, concurrency: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible server; `None` means lexical vectors only.
    pub endpoint: Option<String>,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Provider vector length; lexical vectors use the same dimension.
    pub dim: usize,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    /// Embedding calls in flight per document.
    pub concurrency: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "text-embedding-3-small".to_string(),
            api_key_env: None,
            dim: 1536,
            timeout_ms: 10_000,
            retries: 1,
            backoff_ms: 250,
            concurrency: 4,
        }
    }
}

/// Score = clamp(raw cosine + boost, -1, max_score); hits below `min_score` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub min_score: f32,
    pub max_score: f32,
    pub system_boost: f32,
    pub subsystem_boost: f32,
    pub tag_boost: f32,
    pub max_tag_boost: f32,
    /// Multiplied by the fraction of query keywords found verbatim in the chunk.
    pub lexical_weight: f32,
    pub phrase_boost: f32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            min_score: 0.25,
            max_score: 1.5,
            system_boost: 0.10,
            subsystem_boost: 0.10,
            tag_boost: 0.05,
            max_tag_boost: 0.15,
            lexical_weight: 0.30,
            phrase_boost: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub default_k: usize,
    pub max_k: usize,
    pub reduced_k: usize,
    pub max_keywords: usize,
    /// Budget for the whole query: cascade plus LLM call.
    pub query_timeout_ms: u64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self { default_k: 5, max_k: 50, reduced_k: 3, max_keywords: 2, query_timeout_ms: 45_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible server; `None` means excerpt-only answers.
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub max_context_chars: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    pub preview_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: None,
            timeout_ms: 30_000,
            retries: 0,
            backoff_ms: 500,
            max_context_chars: 6000,
            temperature: 0.2,
            max_tokens: 512,
            preview_chars: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Read an API key from the environment variable named in config, if any.
pub fn api_key_from_env(var_name: Option<&str>) -> Option<String> {
    var_name.and_then(|name| env::var(name).ok()).filter(|key| !key.trim().is_empty())
}
