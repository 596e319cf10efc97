//! Pipeline Configuration
//!
//! Serde-backed configuration for the pipeline. The same structure is loaded
//! from TOML by the CLI and built in code by tests.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default bit position where the group id starts inside a fragment
pub const DEFAULT_ID_SHIFT: u32 = 37;

/// Default number of compute workers
pub const DEFAULT_COMPUTE_WORKERS: usize = 3;

// ----------------------------------------------------------------------------
// Duplicate Policy
// ----------------------------------------------------------------------------

/// What the send stage does with a second resolution for the same group
///
/// Every submission produces a fresh snapshot, so a group that keeps receiving
/// fragments after it first resolved can resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Deliver only the first resolution of each group; later ones are dropped
    #[default]
    KeepFirst,
    /// Deliver every resolution; consumers deduplicate downstream
    SendAll,
}

// ----------------------------------------------------------------------------
// Pipeline Configuration
// ----------------------------------------------------------------------------

/// Configuration for a pipeline instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of compute worker threads
    pub compute_workers: usize,
    /// Bit position where the group id starts inside a fragment
    pub id_shift: u32,
    /// Delivery policy for repeated resolutions of one group
    pub duplicate_policy: DuplicatePolicy,
    /// Prefix for the names of all pipeline-owned threads
    pub thread_name_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compute_workers: DEFAULT_COMPUTE_WORKERS,
            id_shift: DEFAULT_ID_SHIFT,
            duplicate_policy: DuplicatePolicy::KeepFirst,
            thread_name_prefix: "sentinel".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            compute_workers: 4,
            thread_name_prefix: "sentinel-test".to_string(),
            ..Self::default()
        }
    }

    pub fn with_compute_workers(mut self, workers: usize) -> Self {
        self.compute_workers = workers;
        self
    }

    pub fn with_id_shift(mut self, shift: u32) -> Self {
        self.id_shift = shift;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Check every field; the first violation wins
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_worker_count(self.compute_workers)?;

        if self.id_shift >= u64::BITS {
            return Err(ConfigError::InvalidIdShift {
                shift: self.id_shift,
            });
        }

        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::InvalidThreadName {
                reason: "prefix is empty".to_string(),
            });
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(ConfigError::InvalidThreadName {
                reason: "prefix contains a NUL byte".to_string(),
            });
        }

        Ok(())
    }
}

/// Compute pools need at least one worker or nothing would ever resolve
pub fn validate_worker_count(count: usize) -> Result<(), ConfigError> {
    if count == 0 {
        return Err(ConfigError::InvalidWorkerCount { count });
    }
    Ok(())
}
