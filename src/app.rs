use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::embeddings::{EmbeddingService, HttpEmbeddingProvider};
use crate::error::{Result, TrendError};
use crate::search::{QueryOrchestrator, SearchResults, SimilaritySearch};
use crate::storage::SqliteStore;

pub type Orchestrator = QueryOrchestrator<HttpEmbeddingProvider, SqliteStore>;

pub struct AppContext {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub embeddings: Arc<EmbeddingService<HttpEmbeddingProvider>>,
    pub results_cache: Option<Arc<TtlCache<SearchResults>>>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = find_root()?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| default_config_path(&root));
        let config = Config::load(cli.config.as_deref(), &root)?;

        let db_path = config.storage.database_path(&root);
        debug!(root = %root.display(), db = %db_path.display(), "opening store");
        let store = Arc::new(SqliteStore::open(&db_path)?);

        let provider = HttpEmbeddingProvider::from_config(&config.embedding)?;
        let embedding_cache = Arc::new(TtlCache::new(
            config.cache.max_entries,
            config.cache.ttl(),
        ));
        let embeddings = Arc::new(EmbeddingService::new(
            provider,
            embedding_cache,
            config.embedding.dimensions,
        ));

        let result_ttl = config.cache.result_ttl();
        let results_cache = (result_ttl > Duration::ZERO).then(|| {
            Arc::new(TtlCache::new(config.cache.result_max_entries, result_ttl))
        });

        Ok(Self {
            root,
            config_path,
            config,
            store,
            embeddings,
            results_cache,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Orchestrator over the shared store and caches, capped at `limit`
    /// per collection (the configured limit when `None`).
    pub fn orchestrator(&self, limit: Option<usize>) -> Orchestrator {
        let limit = limit.unwrap_or(self.config.search.per_collection_limit);
        let orchestrator = QueryOrchestrator::new(
            Arc::clone(&self.embeddings),
            SimilaritySearch::new(Arc::clone(&self.store)),
        )
        .with_limit(limit);

        match &self.results_cache {
            Some(cache) if limit == self.config.search.per_collection_limit => {
                orchestrator.with_results_cache(Arc::clone(cache))
            }
            _ => orchestrator,
        }
    }
}

/// Data root: `TRENDLENS_ROOT`, else the nearest `.trendlens` directory
/// above the working directory, else the platform data directory.
pub fn find_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("TRENDLENS_ROOT") {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir()?;
    if let Some(found) = find_upwards(&cwd, ".trendlens") {
        return Ok(found);
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| TrendError::MissingConfig("data directory not found".to_string()))?;
    Ok(data_dir.join("trendlens"))
}

fn default_config_path(root: &Path) -> PathBuf {
    if root.ends_with(".trendlens") {
        root.join("config.toml")
    } else {
        dirs::config_dir()
            .unwrap_or_else(|| root.to_path_buf())
            .join("trendlens/config.toml")
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
