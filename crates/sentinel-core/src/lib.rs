//! Sentinel Core
//!
//! This crate provides the foundational types and capability interfaces for the
//! Sentinel fragment reassembly pipeline:
//! - `Fragment` / `GroupId`: the data model and group id extraction
//! - `Receiver`, `Transmitter`, `Solver`: the capabilities the pipeline consumes
//! - `MaximalSolver`: adapts a candidate search into a `Solver`
//! - `PipelineConfig`: serde-backed configuration with validation
//!
//! The concurrent engine lives in `sentinel-runtime`; this crate has no threads.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod capability;
pub mod config;
pub mod errors;
pub mod solver;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use capability::{Receiver, Solver, Transmitter};
pub use config::{
    validate_worker_count, DuplicatePolicy, PipelineConfig, DEFAULT_COMPUTE_WORKERS, DEFAULT_ID_SHIFT,
};
pub use errors::{ConfigError, PipelineError, SentinelError, SentinelResult};
pub use solver::{CandidateSearch, MaximalSolver};
pub use types::{ComputeTask, Fragment, GroupId, Resolved, Snapshot};
