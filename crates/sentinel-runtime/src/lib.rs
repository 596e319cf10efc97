//! Sentinel Runtime Engine
//!
//! This crate contains the concurrent engine of the Sentinel pipeline:
//! - `SentinelPipeline`: the lifecycle coordinator owning every worker thread
//! - `IngressRouter` / `IngressHandle`: fragment submission into the group store
//! - `WorkQueue`: closable FIFO queues between stages
//! - Worker loops for receiver drains, compute workers and send workers
//!
//! ```text
//! Receivers ─▶ Ingress Router ─▶ Compute Queue ─▶ Compute Pool ─▶ Send Queue ─▶ Send Pool ─▶ Transmitters
//! ```
//!
//! `sentinel-core` provides the data model and capability traits this engine
//! is built on.

pub mod builder;
pub mod context;
pub mod ingress;
pub mod pipeline;
pub mod queue;
pub mod stats;
pub mod store;
pub mod workers;

pub use builder::PipelineBuilder;
pub use context::PipelineContext;
pub use ingress::{IngressHandle, IngressRouter};
pub use pipeline::{PipelineState, SentinelPipeline};
pub use queue::{Rendezvous, RendezvousTicket, WorkQueue};
pub use stats::{PipelineReport, PipelineStats, StatsSnapshot};
pub use store::{DeliveryLedger, GroupStore};

// Re-export core types for convenience
pub use sentinel_core::{
    DuplicatePolicy, Fragment, GroupId, PipelineConfig, Receiver, SentinelError, SentinelResult,
    Solver, Transmitter,
};
