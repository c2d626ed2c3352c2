use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use crate::embeddings::{DEFAULT_MODEL, EMBEDDING_DIM};
use crate::error::{Result, TrendError};
use crate::search::DEFAULT_RESULT_LIMIT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("TRENDLENS_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("trendlens/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        let path = root.join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| TrendError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| TrendError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.embedding {
            self.embedding.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("TRENDLENS_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(value);
        } else if self.embedding.api_key.is_none() {
            self.embedding.api_key = env_string("OPENAI_API_KEY");
        }
        if let Some(value) = env_string("TRENDLENS_EMBEDDING_BASE_URL") {
            self.embedding.base_url = value;
        }
        if let Some(value) = env_string("TRENDLENS_EMBEDDING_MODEL") {
            self.embedding.model = value;
        }
        if let Some(value) = env_usize("TRENDLENS_EMBEDDING_DIMENSIONS")? {
            self.embedding.dimensions = value;
        }
        if let Some(value) = env_u64("TRENDLENS_EMBEDDING_TIMEOUT_SECS")? {
            self.embedding.timeout_secs = value;
        }
        if let Some(value) = env_usize("TRENDLENS_EMBEDDING_BATCH_SIZE")? {
            self.embedding.batch_size = value;
        }

        if let Some(value) = env_bool("TRENDLENS_CACHE_ENABLED") {
            self.cache.enabled = value;
        }
        if env_bool("TRENDLENS_CACHE_DISABLED").unwrap_or(false) {
            self.cache.enabled = false;
        }
        if let Some(value) = env_usize("TRENDLENS_CACHE_MAX_ENTRIES")? {
            self.cache.max_entries = value;
        }
        if let Some(value) = env_u64("TRENDLENS_CACHE_TTL_SECONDS")? {
            self.cache.ttl_seconds = value;
        }
        if let Some(value) = env_usize("TRENDLENS_CACHE_RESULT_MAX_ENTRIES")? {
            self.cache.result_max_entries = value;
        }
        if let Some(value) = env_u64("TRENDLENS_CACHE_RESULT_TTL_SECONDS")? {
            self.cache.result_ttl_seconds = value;
        }

        if let Some(value) = env_usize("TRENDLENS_SEARCH_LIMIT")? {
            self.search.per_collection_limit = value;
        }

        if let Some(value) = env_string("TRENDLENS_DATABASE") {
            self.storage.database = PathBuf::from(value);
        }

        Ok(())
    }

    /// Copy safe to print: the API key is masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.embedding.api_key.as_mut() {
            *key = redact(key);
        }
        copy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            dimensions: EMBEDDING_DIM,
            timeout_secs: 30,
            batch_size: 100,
        }
    }
}

impl EmbeddingConfig {
    fn merge(&mut self, patch: EmbeddingPatch) {
        if let Some(value) = patch.api_key {
            self.api_key = Some(value);
        }
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.model {
            self.model = value;
        }
        if let Some(value) = patch.dimensions {
            self.dimensions = value;
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
        if let Some(value) = patch.batch_size {
            self.batch_size = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl_seconds: u64,
    pub result_max_entries: usize,
    pub result_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            ttl_seconds: DEFAULT_TTL.as_secs(),
            result_max_entries: 100,
            result_ttl_seconds: 300,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.max_entries {
            self.max_entries = value;
        }
        if let Some(value) = patch.ttl_seconds {
            self.ttl_seconds = value;
        }
        if let Some(value) = patch.result_max_entries {
            self.result_max_entries = value;
        }
        if let Some(value) = patch.result_ttl_seconds {
            self.result_ttl_seconds = value;
        }
    }

    /// Embedding TTL; zero when caching is disabled.
    pub const fn ttl(&self) -> Duration {
        if self.enabled {
            Duration::from_secs(self.ttl_seconds)
        } else {
            Duration::ZERO
        }
    }

    /// Search-result TTL; zero when caching is disabled.
    pub const fn result_ttl(&self) -> Duration {
        if self.enabled {
            Duration::from_secs(self.result_ttl_seconds)
        } else {
            Duration::ZERO
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub per_collection_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_collection_limit: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.per_collection_limit {
            self.per_collection_limit = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; relative paths resolve against the data root
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("trendlens.db"),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.database {
            self.database = value;
        }
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.database.is_absolute() {
            self.database.clone()
        } else {
            root.join(&self.database)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub embedding: Option<EmbeddingPatch>,
    pub cache: Option<CachePatch>,
    pub search: Option<SearchPatch>,
    pub storage: Option<StoragePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingPatch {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub dimensions: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    pub enabled: Option<bool>,
    pub max_entries: Option<usize>,
    pub ttl_seconds: Option<u64>,
    pub result_max_entries: Option<usize>,
    pub result_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub per_collection_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub database: Option<PathBuf>,
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse::<u64>().map(Some).map_err(|err| {
            TrendError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse::<usize>().map(Some).map_err(|err| {
            TrendError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}
