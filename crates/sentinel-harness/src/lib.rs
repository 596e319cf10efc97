//! Sentinel Harness
//!
//! Test doubles for the capabilities the pipeline consumes, plus the
//! reference fixture and a fragment feeder that imitates concurrent producers.
//! The CLI reuses the threshold solver for replays.

pub mod feeder;
pub mod fixtures;
pub mod receivers;
pub mod solvers;
pub mod transmitters;

pub use feeder::{feed_fragments, spawn_feeder, Jitter};
pub use receivers::{FailingReceiver, ScriptedReceiver};
pub use solvers::{threshold_solver, SlowSolver, ThresholdSearch, ThresholdSolver};
pub use transmitters::{FailingTransmitter, RecordingTransmitter, TransmitterLog};
