use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

/// Pipeline configuration module
/// This module holds the configuration for every pipeline component;
/// all settings carry serde defaults so a partial (or empty) JSON
/// document deserializes into a usable configuration.
/// Represents the pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Extraction and retry settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Transcript cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate limiter settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Bulk processing settings
    #[serde(default)]
    pub bulk: BulkConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            bulk: BulkConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Validate the configuration, rejecting values that would stall or
    /// disable the pipeline outright
    pub fn validate(&self) -> Result<()> {
        if self.extraction.retry_attempts == 0 {
            return Err(anyhow!("extraction.retry_attempts must be at least 1"));
        }
        if self.cache.max_entries == 0 {
            return Err(anyhow!("cache.max_entries must be at least 1"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(anyhow!("rate_limit.max_requests must be at least 1"));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(anyhow!("rate_limit.window_ms must be positive"));
        }
        if self.rate_limit.max_concurrency == 0 {
            return Err(anyhow!("rate_limit.max_concurrency must be at least 1"));
        }
        if self.bulk.concurrency == 0 {
            return Err(anyhow!("bulk.concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Settings for a single extraction and its retry policy
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    // @field: Total attempts per network step (first try included)
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    // @field: Base delay for the linear retry backoff (attempt * base)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    // @field: Per-call network timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // @field: Language to request when the caller does not pin one
    #[serde(default)]
    pub default_language: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            default_language: None,
        }
    }
}

impl ExtractionConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Settings for the bounded, time-expiring transcript cache
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    // @field: Maximum number of cached transcripts before LRU eviction
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,

    // @field: Time-to-live for a cached transcript in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_max_entries(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Settings for the windowed admission gate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    // @field: Maximum operations started within any rolling window
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: usize,

    // @field: Rolling window length in milliseconds
    #[serde(default = "default_rate_limit_window_ms")]
    pub window_ms: u64,

    // @field: Maximum operations in flight simultaneously
    #[serde(default = "default_rate_limit_max_concurrency")]
    pub max_concurrency: usize,

    // @field: Minimum delay before re-evaluating an exhausted window
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_rate_limit_max_requests(),
            window_ms: default_rate_limit_window_ms(),
            max_concurrency: default_rate_limit_max_concurrency(),
            backoff_ms: default_rate_limit_backoff_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Settings for bulk fan-out
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BulkConfig {
    // @field: Worker pool size when the caller does not override it
    #[serde(default = "default_bulk_concurrency")]
    pub concurrency: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            concurrency: default_bulk_concurrency(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_rate_limit_max_requests() -> usize {
    10
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}

fn default_rate_limit_max_concurrency() -> usize {
    4
}

fn default_rate_limit_backoff_ms() -> u64 {
    500
}

fn default_bulk_concurrency() -> usize {
    3
}
