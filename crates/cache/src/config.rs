//! Cache configuration for the surface cache budget.
//!
//! Configuration can be created programmatically or loaded from environment
//! variables.

/// Default budget for rendered surfaces: 128 MB.
pub const DEFAULT_MEMORY_LIMIT: usize = 128 * 1024 * 1024;

/// Environment variable overriding the surface cache budget in megabytes.
pub const CACHE_MB_ENV: &str = "FLIPBOOK_CACHE_MB";

/// Configuration for the surface cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// RAM budget for rendered surfaces in bytes
    pub memory_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { memory_limit: DEFAULT_MEMORY_LIMIT }
    }
}

impl CacheConfig {
    /// Creates a configuration with a budget in megabytes.
    pub fn new(memory_mb: usize) -> Self {
        Self { memory_limit: memory_mb * 1024 * 1024 }
    }

    /// Sets the budget in megabytes.
    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.memory_limit = mb * 1024 * 1024;
        self
    }

    /// Returns the budget in megabytes.
    pub fn memory_mb(&self) -> usize {
        self.memory_limit / (1024 * 1024)
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLIPBOOK_CACHE_MB`: surface cache budget in MB (default: 128)
    ///
    /// # Errors
    /// Returns an error if the variable is set but is not a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(CACHE_MB_ENV) {
            let mb = val
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue { key: CACHE_MB_ENV, value: val.clone() })?;
            config = config.with_memory_mb(mb);
        }

        Ok(config)
    }
}

/// Errors that can occur while reading cache configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
