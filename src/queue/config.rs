//! Engine configuration
//!
//! Construction-time settings, immutable once the engine is built.
//! Deserializable from TOML with per-field defaults, so partial config
//! files work.

use std::time::Duration;

use serde::Deserialize;

use crate::queue::error::{QueueError, QueueResult};

/// Queue engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name used in stats output and lifecycle events.
    pub name: String,
    /// Scheduler capacity; `produce` reports backpressure beyond this.
    pub capacity: usize,
    /// Failed attempts a message may accumulate before dead-lettering.
    pub max_retries: u32,
    /// Maximum messages drained per collection tick.
    pub batch_size: usize,
    /// Collection period; a full batch triggers collection earlier.
    pub batch_timeout_ms: u64,
    /// TTL applied by `new_message` when the producer doesn't pick one.
    pub default_ttl_ms: u64,
    /// Period of the expiry sweep.
    pub reap_interval_ms: u64,
    /// Base of the exponential retry backoff.
    pub backoff_base: u32,
    /// One backoff unit - the delay is `unit * base^retry_count`.
    pub backoff_unit_ms: u64,
    /// Concurrent dispatch tasks.
    pub dispatch_workers: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            capacity: 10_000,
            max_retries: 3,
            batch_size: 10,
            batch_timeout_ms: 2_000,
            default_ttl_ms: 24 * 60 * 60 * 1_000,
            reap_interval_ms: 60_000,
            backoff_base: 2,
            backoff_unit_ms: 1_000,
            dispatch_workers: 4,
        }
    }
}

impl QueueConfig {
    /// Parse from a TOML document; absent keys keep their defaults.
    pub fn from_toml(input: &str) -> QueueResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| QueueError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QueueResult<()> {
        if self.batch_size == 0 {
            return Err(QueueError::InvalidConfig {
                message: "batch_size must be greater than zero".to_string(),
            });
        }
        if self.batch_timeout_ms == 0 {
            return Err(QueueError::InvalidConfig {
                message: "batch_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(QueueError::InvalidConfig {
                message: "capacity must be greater than zero".to_string(),
            });
        }
        if self.dispatch_workers == 0 {
            return Err(QueueError::InvalidConfig {
                message: "dispatch_workers must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }

    /// Backoff delay before the given retry attempt: `unit * base^retry`.
    /// Saturates instead of overflowing for large retry counts.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let factor = (self.backoff_base as u64).saturating_pow(retry_count);
        Duration::from_millis(self.backoff_unit_ms.saturating_mul(factor))
    }
}
