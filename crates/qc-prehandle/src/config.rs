//! Configuration for pre-handle

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid valid-duration bounds: min {min}s > max {max}s")]
    InvalidDurationBounds { min: i64, max: i64 },

    #[error("Maximum signed transaction size must be positive")]
    ZeroTransactionSize,

    #[error("Deduplication retention must be positive")]
    ZeroRetention,
}

/// Pre-handle configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreHandleConfig {
    /// Version of the active configuration. Results computed under another
    /// version are reprocessed.
    pub config_version: u64,
    /// Pre-handle workers (0 = hardware parallelism)
    pub worker_threads: usize,
    /// Signature verification workers (0 = hardware parallelism)
    pub verification_threads: usize,
    /// Maximum wire size of a signed transaction (bytes)
    pub max_signed_transaction_size: usize,
    /// Maximum memo length (bytes)
    pub max_memo_bytes: usize,
    /// Shortest accepted validity window (seconds)
    pub min_valid_duration_secs: i64,
    /// Longest accepted validity window (seconds)
    pub max_valid_duration_secs: i64,
    /// How many levels of embedded transactions may be reflected
    pub max_nested_depth: usize,
    /// How long transaction ids stay in the dedup cache (seconds)
    pub dedup_retention_secs: u64,
}

impl Default for PreHandleConfig {
    fn default() -> Self {
        Self {
            config_version: 0,
            worker_threads: 0,
            verification_threads: 0,
            max_signed_transaction_size: 6144,
            max_memo_bytes: 100,
            min_valid_duration_secs: 15,
            max_valid_duration_secs: 180,
            max_nested_depth: 1,
            dedup_retention_secs: 180,
        }
    }
}

impl PreHandleConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_PREHANDLE_CONFIG_VERSION` (default: 0)
    /// - `QC_PREHANDLE_WORKER_THREADS` (default: 0)
    /// - `QC_PREHANDLE_VERIFICATION_THREADS` (default: 0)
    /// - `QC_PREHANDLE_MAX_TX_SIZE` (default: 6144)
    /// - `QC_PREHANDLE_MAX_MEMO_BYTES` (default: 100)
    /// - `QC_PREHANDLE_MIN_VALID_DURATION` (default: 15)
    /// - `QC_PREHANDLE_MAX_VALID_DURATION` (default: 180)
    /// - `QC_PREHANDLE_MAX_NESTED_DEPTH` (default: 1)
    /// - `QC_PREHANDLE_DEDUP_RETENTION` (default: 180)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            config_version: env_or("QC_PREHANDLE_CONFIG_VERSION", defaults.config_version),
            worker_threads: env_or("QC_PREHANDLE_WORKER_THREADS", defaults.worker_threads),
            verification_threads: env_or(
                "QC_PREHANDLE_VERIFICATION_THREADS",
                defaults.verification_threads,
            ),
            max_signed_transaction_size: env_or(
                "QC_PREHANDLE_MAX_TX_SIZE",
                defaults.max_signed_transaction_size,
            ),
            max_memo_bytes: env_or("QC_PREHANDLE_MAX_MEMO_BYTES", defaults.max_memo_bytes),
            min_valid_duration_secs: env_or(
                "QC_PREHANDLE_MIN_VALID_DURATION",
                defaults.min_valid_duration_secs,
            ),
            max_valid_duration_secs: env_or(
                "QC_PREHANDLE_MAX_VALID_DURATION",
                defaults.max_valid_duration_secs,
            ),
            max_nested_depth: env_or("QC_PREHANDLE_MAX_NESTED_DEPTH", defaults.max_nested_depth),
            dedup_retention_secs: env_or(
                "QC_PREHANDLE_DEDUP_RETENTION",
                defaults.dedup_retention_secs,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_valid_duration_secs > self.max_valid_duration_secs {
            return Err(ConfigError::InvalidDurationBounds {
                min: self.min_valid_duration_secs,
                max: self.max_valid_duration_secs,
            });
        }
        if self.max_signed_transaction_size == 0 {
            return Err(ConfigError::ZeroTransactionSize);
        }
        if self.dedup_retention_secs == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the number of CPUs.
    pub fn effective_worker_threads(&self) -> usize {
        resolve_threads(self.worker_threads)
    }

    /// Verification worker count with 0 resolved to the number of CPUs.
    pub fn effective_verification_threads(&self) -> usize {
        resolve_threads(self.verification_threads)
    }
}

fn resolve_threads(configured: usize) -> usize {
    if configured == 0 {
        num_cpus::get().max(1)
    } else {
        configured
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
