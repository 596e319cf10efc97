//! Error types for the Sentinel pipeline
//!
//! This module contains all error types used throughout the pipeline, including
//! configuration errors, lifecycle errors and capability failures, plus the
//! `SentinelError` type that unifies them all.

use crate::types::GroupId;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid worker count: {count} (must be at least 1)")]
    InvalidWorkerCount { count: usize },
    #[error("Invalid group id shift: {shift} (must be below 64)")]
    InvalidIdShift { shift: u32 },
    #[error("Invalid thread name prefix: {reason}")]
    InvalidThreadName { reason: String },
}

/// Pipeline lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline already started")]
    AlreadyStarted,
    #[error("Pipeline is not running")]
    NotRunning,
    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        role: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{role} thread panicked")]
    WorkerPanicked { role: String },
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Main error type for the Sentinel pipeline
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Receiver failed: {reason}")]
    Receiver { reason: String },

    #[error("Transmitter failed for group {group}: {reason}")]
    Transmitter { group: GroupId, reason: String },

    #[error("Invalid fragment '{input}': {reason}")]
    InvalidFragment { input: String, reason: String },
}

impl SentinelError {
    /// Convenience constructor for receiver failures
    pub fn receiver(reason: impl Into<String>) -> Self {
        Self::Receiver {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transmitter failures
    pub fn transmitter(group: GroupId, reason: impl Into<String>) -> Self {
        Self::Transmitter {
            group,
            reason: reason.into(),
        }
    }
}

/// Result type alias for Sentinel operations
pub type SentinelResult<T> = Result<T, SentinelError>;
