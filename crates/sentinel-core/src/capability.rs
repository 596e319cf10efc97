//! Capability Interfaces
//!
//! The pipeline never talks to concrete I/O or math. It consumes three
//! capabilities, each running unlocked inside a dedicated worker thread:
//!
//! - [`Receiver`]: a blocking source of fragments, drained by its own thread
//! - [`Transmitter`]: a sink for resolved values and incomplete-group reports
//! - [`Solver`]: a pure function from a fragment sequence to a value
//!
//! Implementations for tests live in the `sentinel-harness` crate.

use crate::errors::SentinelResult;
use crate::types::{Fragment, GroupId};

// ----------------------------------------------------------------------------
// Receiver
// ----------------------------------------------------------------------------

/// Blocking source of fragments
///
/// `receive` is only ever called from the receiver's dedicated drain thread,
/// so implementations may block freely.
pub trait Receiver: Send {
    /// Wait for the next fragment
    ///
    /// Returns `Ok(None)` at end of stream. An error ends this receiver's
    /// contribution; it is not retried.
    fn receive(&mut self) -> SentinelResult<Option<Fragment>>;

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        "receiver"
    }
}

impl<R: Receiver + ?Sized> Receiver for Box<R> {
    fn receive(&mut self) -> SentinelResult<Option<Fragment>> {
        (**self).receive()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ----------------------------------------------------------------------------
// Transmitter
// ----------------------------------------------------------------------------

/// Sink for resolved groups
///
/// Both calls are fire-and-forget from the pipeline's point of view: an error
/// is logged and the send worker moves on to its next item.
pub trait Transmitter<V>: Send {
    /// Deliver a resolved value for `group`
    fn send(&mut self, group: GroupId, value: &V) -> SentinelResult<()>;

    /// Report that `group` never resolved during the run
    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()>;

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        "transmitter"
    }
}

impl<V, T: Transmitter<V> + ?Sized> Transmitter<V> for Box<T> {
    fn send(&mut self, group: GroupId, value: &V) -> SentinelResult<()> {
        (**self).send(group, value)
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        (**self).incomplete(group)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// ----------------------------------------------------------------------------
// Solver
// ----------------------------------------------------------------------------

/// Decides whether a fragment sequence resolves to a value
///
/// Must be deterministic and side-effect free: the same sequence always yields
/// the same result. Calls may be arbitrarily expensive and are shared across
/// all compute workers.
pub trait Solver: Send + Sync {
    type Value: Send + 'static;

    /// Resolve `fragments`, or `None` if they are not (yet) resolvable
    fn resolve(&self, fragments: &[Fragment]) -> Option<Self::Value>;
}

impl<S: Solver + ?Sized> Solver for std::sync::Arc<S> {
    type Value = S::Value;

    fn resolve(&self, fragments: &[Fragment]) -> Option<Self::Value> {
        (**self).resolve(fragments)
    }
}
