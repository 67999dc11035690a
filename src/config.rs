// Configuration for the HotKV server
//
// All knobs are enumerated here; nothing is read from the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Server configuration
///
/// # Example
///
/// ```
/// use hotkv::Config;
///
/// let config = Config::default()
///     .with_cache_capacity(500)
///     .with_pool_size(8)
///     .with_listen("0.0.0.0", 8080);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend host
    pub db_host: String,

    /// Backend port
    pub db_port: u16,

    /// Backend database name
    pub db_name: String,

    /// Backend user
    pub db_user: String,

    /// Backend credential
    pub db_password: String,

    /// Maximum resident cache entries
    pub cache_capacity: usize,

    /// Target backend session count
    pub pool_size: usize,

    /// HTTP listen address
    pub listen_addr: String,

    /// HTTP listen port
    pub listen_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "127.0.0.1".to_string(),
            db_port: 5432,
            db_name: "hotkv".to_string(),
            db_user: "hotkv".to_string(),
            db_password: "hotkv".to_string(),
            cache_capacity: 100,
            pool_size: 4,
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Set backend connection parameters (chainable)
    pub fn with_backend(
        mut self,
        host: impl Into<String>,
        port: u16,
        name: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.db_host = host.into();
        self.db_port = port;
        self.db_name = name.into();
        self.db_user = user.into();
        self.db_password = password.into();
        self
    }

    /// Set cache capacity (chainable)
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set pool size (chainable)
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set HTTP listen address and port (chainable)
    pub fn with_listen(mut self, addr: impl Into<String>, port: u16) -> Self {
        self.listen_addr = addr.into();
        self.listen_port = port;
        self
    }

    /// Check that all knobs hold usable values
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "cache_capacity must be a positive integer".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(Error::Config(
                "pool_size must be a positive integer".to_string(),
            ));
        }
        if self.db_host.is_empty() {
            return Err(Error::Config("db_host must not be empty".to_string()));
        }
        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}
