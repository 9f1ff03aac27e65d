use crate::audio::AudioEncoding;
use crate::batch::BatchRunner;
use crate::defaults;
use crate::retry::RetryPolicy;
use crate::streaming::StreamConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

/// Remote backend call configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub language: String,
    pub sample_rate_hz: u32,
    pub encoding: AudioEncoding,
    pub punctuation: bool,
}

/// Retry/backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub backoff_multiplier: f64,
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub skip: bool,
}

/// Batch execution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub parallelism: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            sample_rate_hz: defaults::SAMPLE_RATE,
            encoding: AudioEncoding::Linear16,
            punctuation: true,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            base_delay_ms: defaults::BASE_DELAY.as_millis() as u64,
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::CACHE_TTL.as_secs(),
            skip: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallelism: defaults::BATCH_PARALLELISM,
        }
    }
}

impl BackendConfig {
    /// Streaming session configuration with these backend settings.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            encoding: self.encoding,
            sample_rate_hz: self.sample_rate_hz,
            language: self.language.clone(),
            punctuation: self.punctuation,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            self.backoff_multiplier,
        )
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl BatchConfig {
    pub fn runner(&self) -> BatchRunner {
        BatchRunner::with_parallelism(self.parallelism)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXBRIDGE_LANGUAGE → backend.language
    /// - VOXBRIDGE_CACHE_TTL_SECS → cache.ttl_secs
    /// - VOXBRIDGE_BATCH_PARALLELISM → batch.parallelism
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("VOXBRIDGE_LANGUAGE")
            && !language.is_empty()
        {
            self.backend.language = language;
        }

        if let Ok(ttl) = std::env::var("VOXBRIDGE_CACHE_TTL_SECS")
            && let Ok(secs) = ttl.parse::<u64>()
        {
            self.cache.ttl_secs = secs;
        }

        if let Ok(parallelism) = std::env::var("VOXBRIDGE_BATCH_PARALLELISM")
            && let Ok(n) = parallelism.parse::<usize>()
        {
            self.batch.parallelism = n;
        }

        self
    }
}
