//! Layered configuration: defaults, optional TOML file, `CLAIMCHECK__*`
//! environment overrides, then the flat legacy variables.

use crate::error::Result;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Default configuration file looked up when `CLAIMCHECK_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "claimcheck.toml";

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub nli: NliConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from the file named by `CLAIMCHECK_CONFIG` (or the default file)
    pub fn load() -> Result<Self> {
        let path = std::env::var("CLAIMCHECK_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file(&path)
    }

    /// Load from a specific file; a missing file yields defaults
    pub fn from_file(path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CLAIMCHECK").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config.from_env())
    }

    /// Apply the flat environment variables used by existing deployments
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("SEARCH_PROVIDER") {
            self.search.provider = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("SERPER_API_KEY") {
            if !val.is_empty() {
                self.search.api_key = Some(SecretString::new(val));
            }
        }

        if let Ok(val) = std::env::var("DB_PATH") {
            self.store.path = val;
        }

        if let Ok(val) = std::env::var("PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        if let Ok(val) = std::env::var("EMBEDDING_URL") {
            self.embedding.endpoint = val;
        }

        if let Ok(val) = std::env::var("NLI_URL") {
            self.nli.endpoint = val;
        }

        self
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_max_body_bytes() -> usize { 64 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Search provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Provider name (serper, google, brave)
    #[serde(default = "default_search_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    /// Sources kept after domain deduplication
    #[serde(default = "default_search_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_search_provider() -> String { "serper".to_string() }
fn default_search_endpoint() -> String { "https://google.serper.dev/search".to_string() }
fn default_search_max_results() -> usize { 5 }
fn default_search_timeout_ms() -> u64 { 10_000 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_key: None,
            endpoint: default_search_endpoint(),
            max_results: default_search_max_results(),
            timeout_ms: default_search_timeout_ms(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Page fetch transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Pages larger than this are treated as unfetchable
    #[serde(default = "default_fetch_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_connect_timeout_ms() -> u64 { 5_000 }
fn default_fetch_timeout_ms() -> u64 { 10_000 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}
fn default_fetch_max_body_bytes() -> usize { 5 * 1024 * 1024 }

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            timeout_ms: default_fetch_timeout_ms(),
            user_agent: default_user_agent(),
            max_body_bytes: default_fetch_max_body_bytes(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Embedding oracle implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible embeddings endpoint
    Http,
    /// Local feature-hashing embedder, no network
    Hashing,
}

/// Embedding oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Vector size for the hashing backend
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_embedding_backend() -> EmbeddingBackend { EmbeddingBackend::Http }
fn default_embedding_endpoint() -> String { "http://localhost:8081/v1/embeddings".to_string() }
fn default_embedding_model() -> String { "sentence-transformers/all-MiniLM-L6-v2".to_string() }
fn default_embedding_dimensions() -> usize { 384 }
fn default_oracle_timeout_ms() -> u64 { 30_000 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            dimensions: default_embedding_dimensions(),
            timeout_ms: default_oracle_timeout_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Entailment oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NliConfig {
    #[serde(default = "default_nli_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_nli_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_nli_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_nli_endpoint() -> String { "http://localhost:8082/v1/nli".to_string() }
fn default_nli_model() -> String { "MoritzLaurer/DeBERTa-v3-base-mnli".to_string() }
fn default_nli_batch_size() -> usize { 8 }

impl Default for NliConfig {
    fn default() -> Self {
        Self {
            endpoint: default_nli_endpoint(),
            model: default_nli_model(),
            api_key: None,
            batch_size: default_nli_batch_size(),
            timeout_ms: default_oracle_timeout_ms(),
        }
    }
}

impl NliConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Pipeline sizing and outer deadline
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_per_source")]
    pub per_source: usize,
    #[serde(default = "default_max_total")]
    pub max_total: usize,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

fn default_per_source() -> usize { 2 }
fn default_max_total() -> usize { 8 }
fn default_deadline_secs() -> u64 { 60 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            per_source: default_per_source(),
            max_total: default_max_total(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl PipelineConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// Result store implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

/// Result store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: u64,
    #[serde(default = "default_memory_ttl_secs")]
    pub memory_ttl_secs: u64,
}

fn default_store_backend() -> StoreBackend { StoreBackend::Sqlite }
fn default_store_path() -> String { "data.db".to_string() }
fn default_memory_capacity() -> u64 { 10_000 }
fn default_memory_ttl_secs() -> u64 { 24 * 60 * 60 }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            memory_capacity: default_memory_capacity(),
            memory_ttl_secs: default_memory_ttl_secs(),
        }
    }
}

impl StoreConfig {
    pub fn memory_ttl(&self) -> Duration {
        Duration::from_secs(self.memory_ttl_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> LogFormat { LogFormat::Pretty }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
