//! Worker Loops
//!
//! The three thread bodies the lifecycle coordinator spawns:
//! - receiver drain: one per receiver, feeds the ingress router
//! - compute worker: N per pipeline, runs the solver on snapshots
//! - send worker: one per transmitter, delivers results and then reports
//!   every undelivered group as incomplete
//!
//! No lock is held while a capability runs.

use crate::context::PipelineContext;
use crate::ingress::IngressHandle;
use crate::queue::RendezvousTicket;
use sentinel_core::{DuplicatePolicy, Receiver, Resolved, Solver, Transmitter};
use std::sync::Arc;
use tracing::{debug, trace, warn};

// ----------------------------------------------------------------------------
// Receiver Drain
// ----------------------------------------------------------------------------

/// Pull fragments from `receiver` until end of stream or failure
///
/// Returns the number of fragments received.
pub fn drain_receiver<R: Receiver>(mut receiver: R, ingress: IngressHandle) -> u64 {
    let name = receiver.name().to_string();
    debug!(receiver = %name, "receiver drain started");

    let mut received = 0u64;
    loop {
        match receiver.receive() {
            Ok(Some(fragment)) => {
                received += 1;
                ingress.submit(fragment);
            }
            Ok(None) => {
                debug!(receiver = %name, received, "receiver reached end of stream");
                break;
            }
            Err(e) => {
                warn!(receiver = %name, received, error = %e, "receiver failed, retiring drain thread");
                break;
            }
        }
    }
    received
}

// ----------------------------------------------------------------------------
// Compute Worker
// ----------------------------------------------------------------------------

/// Resolve snapshots until ingestion is closed and the compute queue is empty
pub fn run_compute_worker<S: Solver>(
    worker: usize,
    context: Arc<PipelineContext<S::Value>>,
    solver: Arc<S>,
) {
    debug!(worker, "compute worker started");
    let queue = context.router().compute_queue();

    while let Some(task) = queue.pop() {
        match solver.resolve(&task.snapshot) {
            Some(value) => {
                context.stats().record_resolution(true);
                trace!(worker, group = %task.group, fragments = task.snapshot.len(), "snapshot resolved");
                if !context.send_queue().push(Resolved::new(task.group, value)) {
                    warn!(worker, group = %task.group, "send queue closed, result dropped");
                }
            }
            None => {
                context.stats().record_resolution(false);
                trace!(worker, group = %task.group, fragments = task.snapshot.len(), "snapshot not resolvable yet");
            }
        }
    }

    debug!(worker, "compute worker finished");
}

// ----------------------------------------------------------------------------
// Send Worker
// ----------------------------------------------------------------------------

/// Deliver results until computation is closed and the send queue is empty,
/// then report every undelivered group to this worker's transmitter
///
/// `ticket` holds the worker's place at the finalization rendezvous: no send
/// worker starts reporting incomplete groups while a sibling may still be
/// delivering one.
pub fn run_send_worker<V, T>(
    worker: usize,
    context: Arc<PipelineContext<V>>,
    mut transmitter: T,
    ticket: RendezvousTicket,
) where
    T: Transmitter<V>,
{
    let name = transmitter.name().to_string();
    debug!(worker, transmitter = %name, "send worker started");

    while let Some(resolved) = context.send_queue().pop() {
        if context.is_aborted() {
            trace!(worker, group = %resolved.group, "run aborted, dropping result");
            continue;
        }
        deliver(&context, &mut transmitter, &name, resolved);
    }

    trace!(worker, transmitter = %name, "send queue drained, waiting for siblings");
    ticket.wait();

    if context.is_aborted() {
        debug!(worker, transmitter = %name, "run aborted, skipping incomplete reports");
        return;
    }

    let groups = context.router().store().group_ids();
    let incomplete = context.ledger().undelivered(&groups);
    debug!(
        worker,
        transmitter = %name,
        groups = groups.len(),
        incomplete = incomplete.len(),
        "reporting incomplete groups"
    );

    for group in incomplete {
        context.stats().record_incomplete();
        if let Err(e) = transmitter.incomplete(group) {
            warn!(transmitter = %name, %group, error = %e, "incomplete report failed");
        }
    }

    debug!(worker, transmitter = %name, "send worker finished");
}

fn deliver<V, T: Transmitter<V>>(
    context: &PipelineContext<V>,
    transmitter: &mut T,
    name: &str,
    resolved: Resolved<V>,
) {
    let group = resolved.group;

    if context.duplicate_policy() == DuplicatePolicy::KeepFirst && !context.ledger().claim(group) {
        context.stats().record_duplicate();
        trace!(transmitter = %name, %group, "group already delivered, dropping resolution");
        return;
    }

    match transmitter.send(group, &resolved.value) {
        Ok(()) => {
            context.stats().record_delivery();
            debug!(transmitter = %name, %group, "result delivered");
        }
        Err(e) => {
            context.stats().record_delivery_failure();
            warn!(transmitter = %name, %group, error = %e, "send failed");
        }
    }

    // A delivery attempt marks the group either way; sink failures are the
    // transmitter's concern.
    context.ledger().record(group);
}
