//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `DIFFSCOPE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

/// Default capacity of the background task queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default embedding dimension expected by the hunk index.
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `DIFFSCOPE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Path to the persisted hunk index blob. Retrieval is disabled when
    /// unset or when the file does not exist.
    pub index_path: Option<PathBuf>,

    /// Shared secret for webhook signature verification. Verification is
    /// disabled when unset (explicit opt-out, not a default-secure posture).
    pub webhook_secret: Option<String>,

    /// Bearer token for the repository-hosting API.
    pub github_token: Option<String>,

    /// External inference endpoint for the model-backed scorer. The
    /// heuristic fallback scorer is used when unset.
    pub inference_url: Option<String>,

    /// External embedding endpoint. A deterministic hash embedder is used
    /// when unset.
    pub embedding_url: Option<String>,

    /// Embedding dimension D. Default: `768`.
    pub embedding_dim: usize,

    /// Max queued tasks before new items are dropped. Default: `100`.
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            index_path: None,
            webhook_secret: None,
            github_token: None,
            inference_url: None,
            embedding_url: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "DIFFSCOPE_PORT";
    const ENV_BIND_ADDR: &'static str = "DIFFSCOPE_BIND_ADDR";
    const ENV_INDEX_PATH: &'static str = "DIFFSCOPE_INDEX_PATH";
    const ENV_WEBHOOK_SECRET: &'static str = "DIFFSCOPE_WEBHOOK_SECRET";
    const ENV_GITHUB_TOKEN: &'static str = "DIFFSCOPE_GITHUB_TOKEN";
    const ENV_INFERENCE_URL: &'static str = "DIFFSCOPE_INFERENCE_URL";
    const ENV_EMBEDDING_URL: &'static str = "DIFFSCOPE_EMBEDDING_URL";
    const ENV_EMBEDDING_DIM: &'static str = "DIFFSCOPE_EMBEDDING_DIM";
    const ENV_QUEUE_CAPACITY: &'static str = "DIFFSCOPE_QUEUE_CAPACITY";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let index_path = Self::parse_optional_path_from_env(Self::ENV_INDEX_PATH);
        let webhook_secret = Self::parse_optional_string_from_env(Self::ENV_WEBHOOK_SECRET);
        let github_token = Self::parse_optional_string_from_env(Self::ENV_GITHUB_TOKEN);
        let inference_url = Self::parse_optional_string_from_env(Self::ENV_INFERENCE_URL);
        let embedding_url = Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL);
        let embedding_dim = Self::parse_embedding_dim_from_env(defaults.embedding_dim)?;
        let queue_capacity =
            Self::parse_usize_from_env(Self::ENV_QUEUE_CAPACITY, defaults.queue_capacity);

        Ok(Self {
            port,
            bind_addr,
            index_path,
            webhook_secret,
            github_token,
            inference_url,
            embedding_url,
            embedding_dim,
            queue_capacity,
        })
    }

    /// Validates paths and basic invariants (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.index_path {
            if path.exists() && !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_embedding_dim_from_env(default: usize) -> Result<usize, ConfigError> {
        match env::var(Self::ENV_EMBEDDING_DIM) {
            Ok(value) => match value.parse::<usize>() {
                Ok(dim) if dim > 0 => Ok(dim),
                _ => Err(ConfigError::InvalidEmbeddingDim { value }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
