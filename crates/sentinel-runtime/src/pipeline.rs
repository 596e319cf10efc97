//! Sentinel Pipeline
//!
//! The lifecycle coordinator. It owns the attached capabilities, spawns every
//! worker thread on [`start`](SentinelPipeline::start) and tears them down in
//! phases on [`stop`](SentinelPipeline::stop):
//!
//! ```text
//! Idle ──start──▶ Running ──receivers joined, ingestion closed──▶ Draining
//!      ──compute joined, computation closed──▶ Finalizing
//!      ──send workers joined──▶ Stopped
//! ```
//!
//! Each phase ends once its input queue is empty and its upstream producers
//! have all retired. Phase transitions close the corresponding queue, which
//! wakes every blocked consumer at once.
//!
//! ## Example
//!
//! ```rust
//! use sentinel_core::{Fragment, GroupId, PipelineConfig, SentinelResult, Solver, Transmitter};
//! use sentinel_runtime::SentinelPipeline;
//!
//! struct PairSolver;
//!
//! impl Solver for PairSolver {
//!     type Value = usize;
//!
//!     fn resolve(&self, fragments: &[Fragment]) -> Option<usize> {
//!         (fragments.len() >= 2).then_some(fragments.len())
//!     }
//! }
//!
//! struct Printer;
//!
//! impl Transmitter<usize> for Printer {
//!     fn send(&mut self, group: GroupId, value: &usize) -> SentinelResult<()> {
//!         println!("{group} -> {value}");
//!         Ok(())
//!     }
//!
//!     fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
//!         println!("{group} incomplete");
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> SentinelResult<()> {
//! let mut pipeline = SentinelPipeline::new(PipelineConfig::default(), PairSolver)?;
//! pipeline.add_transmitter(Printer)?;
//! pipeline.start(2)?;
//!
//! let ingress = pipeline.ingress();
//! ingress.submit(Fragment::new(0x071e124dabef));
//! ingress.submit(Fragment::new(0x071d2f8fe0a1));
//!
//! let report = pipeline.stop()?;
//! assert_eq!(report.groups_delivered, 1);
//! # Ok(())
//! # }
//! ```

use crate::context::PipelineContext;
use crate::ingress::IngressHandle;
use crate::queue::Rendezvous;
use crate::stats::PipelineReport;
use crate::workers::{drain_receiver, run_compute_worker, run_send_worker};
use sentinel_core::{
    validate_worker_count, Fragment, GroupId, PipelineConfig, PipelineError, Receiver,
    SentinelResult, Solver, Transmitter,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

// ----------------------------------------------------------------------------
// Pipeline State
// ----------------------------------------------------------------------------

/// Lifecycle phase of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Capabilities may be attached; no threads exist
    Idle,
    /// All workers are running and receivers are being drained
    Running,
    /// Ingestion is closed; compute workers flush the remaining snapshots
    Draining,
    /// Computation is closed; send workers flush results and report incomplete groups
    Finalizing,
    /// Every pipeline-owned thread has been joined
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Running => write!(f, "running"),
            PipelineState::Draining => write!(f, "draining"),
            PipelineState::Finalizing => write!(f, "finalizing"),
            PipelineState::Stopped => write!(f, "stopped"),
        }
    }
}

// ----------------------------------------------------------------------------
// Worker Handles
// ----------------------------------------------------------------------------

/// A spawned thread and the role it plays, for join diagnostics
struct WorkerHandle {
    role: &'static str,
    name: String,
    handle: JoinHandle<()>,
}

/// Join every handle, returning the first panic encountered
fn join_all(handles: Vec<WorkerHandle>) -> Result<(), PipelineError> {
    let mut first_panic = None;
    for worker in handles {
        if worker.handle.join().is_err() {
            error!(thread = %worker.name, "{} thread panicked", worker.role);
            first_panic.get_or_insert(PipelineError::WorkerPanicked {
                role: worker.role.to_string(),
            });
        }
    }
    first_panic.map_or(Ok(()), Err)
}

// ----------------------------------------------------------------------------
// Sentinel Pipeline
// ----------------------------------------------------------------------------

type BoxedReceiver = Box<dyn Receiver>;
type BoxedTransmitter<V> = Box<dyn Transmitter<V>>;

/// Concurrent fragment reassembly pipeline
///
/// Attach receivers and transmitters while idle, then [`start`](Self::start).
/// Fragments may also be fed from any thread through [`ingress`](Self::ingress).
/// [`stop`](Self::stop) must be called once every receiver is guaranteed to
/// reach end of stream; dropping a running pipeline stops it.
pub struct SentinelPipeline<S: Solver + 'static> {
    config: PipelineConfig,
    solver: Arc<S>,
    context: Arc<PipelineContext<S::Value>>,
    receivers: Vec<BoxedReceiver>,
    transmitters: Vec<BoxedTransmitter<S::Value>>,
    receiver_handles: Vec<WorkerHandle>,
    compute_handles: Vec<WorkerHandle>,
    send_handles: Vec<WorkerHandle>,
    counts: (usize, usize, usize),
    state: PipelineState,
    #[cfg(test)]
    fail_spawn_role: Option<&'static str>,
}

impl<S: Solver + 'static> SentinelPipeline<S> {
    /// Create an idle pipeline
    pub fn new(config: PipelineConfig, solver: S) -> SentinelResult<Self> {
        Self::with_shared_solver(config, Arc::new(solver))
    }

    /// Create an idle pipeline around a solver shared with other owners
    pub fn with_shared_solver(config: PipelineConfig, solver: Arc<S>) -> SentinelResult<Self> {
        config.validate()?;
        let context = Arc::new(PipelineContext::new(&config));

        Ok(Self {
            config,
            solver,
            context,
            receivers: Vec::new(),
            transmitters: Vec::new(),
            receiver_handles: Vec::new(),
            compute_handles: Vec::new(),
            send_handles: Vec::new(),
            counts: (0, 0, 0),
            state: PipelineState::Idle,
            #[cfg(test)]
            fail_spawn_role: None,
        })
    }

    /// Attach a receiver; each gets its own drain thread on start
    pub fn add_receiver<R: Receiver + 'static>(&mut self, receiver: R) -> SentinelResult<()> {
        self.ensure_idle()?;
        self.receivers.push(Box::new(receiver));
        Ok(())
    }

    /// Attach a transmitter; each gets its own send worker on start
    pub fn add_transmitter<T>(&mut self, transmitter: T) -> SentinelResult<()>
    where
        T: Transmitter<S::Value> + 'static,
    {
        self.ensure_idle()?;
        self.transmitters.push(Box::new(transmitter));
        Ok(())
    }

    /// Handle for submitting fragments from outside the attached receivers
    pub fn ingress(&self) -> IngressHandle {
        IngressHandle::new(Arc::clone(self.context.router()))
    }

    /// Submit a single fragment
    pub fn submit(&self, fragment: Fragment) -> bool {
        self.context.router().submit(fragment)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.len() + self.receiver_handles.len()
    }

    pub fn transmitter_count(&self) -> usize {
        self.transmitters.len() + self.send_handles.len()
    }

    /// Copy of every group and its fragments seen so far
    pub fn groups(&self) -> BTreeMap<GroupId, Vec<Fragment>> {
        self.context.router().store().to_map()
    }

    /// Groups with at least one delivered result
    pub fn delivered_groups(&self) -> Vec<GroupId> {
        self.context.ledger().delivered()
    }

    /// Spawn all worker threads
    ///
    /// Send workers are spawned first, then `compute_workers` compute
    /// workers, then one drain thread per receiver. If any spawn fails the
    /// threads already started are shut down and joined, the pipeline moves
    /// to `Stopped` and the spawn error is returned.
    pub fn start(&mut self, compute_workers: usize) -> SentinelResult<()> {
        self.ensure_idle()?;
        validate_worker_count(compute_workers)?;

        info!(
            receivers = self.receivers.len(),
            compute_workers,
            transmitters = self.transmitters.len(),
            "starting pipeline"
        );

        if let Err(e) = self.spawn_all(compute_workers) {
            error!(error = %e, "pipeline start failed, unwinding");
            self.abort_start();
            return Err(e.into());
        }

        self.state = PipelineState::Running;
        Ok(())
    }

    /// Start with the worker count from the configuration
    pub fn start_configured(&mut self) -> SentinelResult<()> {
        self.start(self.config.compute_workers)
    }

    fn spawn_all(&mut self, compute_workers: usize) -> Result<(), PipelineError> {
        let prefix = self.config.thread_name_prefix.clone();
        let transmitters = std::mem::take(&mut self.transmitters);
        let receivers = std::mem::take(&mut self.receivers);

        let rendezvous = Rendezvous::new();
        for (index, transmitter) in transmitters.into_iter().enumerate() {
            let context = Arc::clone(&self.context);
            let ticket = rendezvous.ticket();
            let handle = self.spawn_worker(format!("{prefix}-send-{index}"), "send", move || {
                run_send_worker(index, context, transmitter, ticket)
            })?;
            self.send_handles.push(handle);
        }

        for index in 0..compute_workers {
            let context = Arc::clone(&self.context);
            let solver = Arc::clone(&self.solver);
            let handle = self.spawn_worker(format!("{prefix}-compute-{index}"), "compute", move || {
                run_compute_worker(index, context, solver)
            })?;
            self.compute_handles.push(handle);
        }

        for (index, receiver) in receivers.into_iter().enumerate() {
            let ingress = IngressHandle::new(Arc::clone(self.context.router()));
            let handle = self.spawn_worker(format!("{prefix}-recv-{index}"), "receiver", move || {
                drain_receiver(receiver, ingress);
            })?;
            self.receiver_handles.push(handle);
        }

        self.counts = (
            self.receiver_handles.len(),
            self.compute_handles.len(),
            self.send_handles.len(),
        );
        Ok(())
    }

    fn spawn_worker<F>(
        &self,
        name: String,
        role: &'static str,
        body: F,
    ) -> Result<WorkerHandle, PipelineError>
    where
        F: FnOnce() + Send + 'static,
    {
        #[cfg(test)]
        if self.fail_spawn_role == Some(role) {
            return Err(PipelineError::Spawn {
                role: role.to_string(),
                source: std::io::Error::other("spawn refused"),
            });
        }
        spawn(name, role, body)
    }

    /// Undo a partial start: mark the run aborted so no sink is called,
    /// close both queues, join compute and send workers, detach drain threads
    /// that may be blocked in a receiver
    fn abort_start(&mut self) {
        self.context.abort();
        self.context.router().compute_queue().close();
        self.context.send_queue().close();

        for worker in self.receiver_handles.drain(..) {
            warn!(thread = %worker.name, "detaching receiver drain thread after failed start");
        }
        let compute = std::mem::take(&mut self.compute_handles);
        let send = std::mem::take(&mut self.send_handles);
        if let Err(e) = join_all(compute).and(join_all(send)) {
            warn!(error = %e, "worker failed while unwinding start");
        }

        self.state = PipelineState::Stopped;
    }

    /// Drain and join every worker in phase order
    ///
    /// Blocks until all receivers reach end of stream. All phases run even
    /// if a worker panicked; the first panic is returned afterwards.
    pub fn stop(&mut self) -> SentinelResult<PipelineReport> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping pipeline: waiting for receivers to finish");
        let receivers = join_all(std::mem::take(&mut self.receiver_handles));

        self.context.router().compute_queue().close();
        self.transition(PipelineState::Draining);
        let compute = join_all(std::mem::take(&mut self.compute_handles));

        self.context.send_queue().close();
        self.transition(PipelineState::Finalizing);
        let send = join_all(std::mem::take(&mut self.send_handles));

        self.transition(PipelineState::Stopped);

        let report = self.report();
        info!(
            groups = report.groups_seen,
            delivered = report.groups_delivered,
            incomplete = report.groups_incomplete(),
            fragments = report.stats.fragments_accepted,
            "pipeline stopped"
        );

        receivers.and(compute).and(send)?;
        Ok(report)
    }

    /// Summary of the run so far
    pub fn report(&self) -> PipelineReport {
        let (receivers, compute_workers, transmitters) = self.counts;
        PipelineReport {
            groups_seen: self.context.router().store().group_count(),
            groups_delivered: self.context.ledger().len(),
            receivers,
            compute_workers,
            transmitters,
            stats: self.context.stats().snapshot(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline phase change");
        self.state = next;
    }

    fn ensure_idle(&self) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Idle => Ok(()),
            _ => Err(PipelineError::AlreadyStarted),
        }
    }
}

impl<S: Solver + 'static> Drop for SentinelPipeline<S> {
    fn drop(&mut self) {
        if self.state == PipelineState::Running {
            warn!("pipeline dropped while running, stopping");
            if let Err(e) = self.stop() {
                error!(error = %e, "pipeline stop during drop failed");
            }
        }
    }
}

impl<S: Solver + 'static> fmt::Debug for SentinelPipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelPipeline")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("receivers", &self.receiver_count())
            .field("transmitters", &self.transmitter_count())
            .finish()
    }
}

fn spawn<F>(name: String, role: &'static str, body: F) -> Result<WorkerHandle, PipelineError>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .map_err(|source| PipelineError::Spawn {
            role: role.to_string(),
            source,
        })?;

    Ok(WorkerHandle { role, name, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{ConfigError, SentinelError};

    struct NeverSolver;

    impl Solver for NeverSolver {
        type Value = ();

        fn resolve(&self, _fragments: &[Fragment]) -> Option<()> {
            None
        }
    }

    /// Counts every call it receives
    struct CountingTransmitter(Arc<std::sync::atomic::AtomicUsize>);

    impl Transmitter<()> for CountingTransmitter {
        fn send(&mut self, _group: GroupId, _value: &()) -> SentinelResult<()> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        fn incomplete(&mut self, _group: GroupId) -> SentinelResult<()> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    struct EndOfStream;

    impl Receiver for EndOfStream {
        fn receive(&mut self) -> SentinelResult<Option<Fragment>> {
            Ok(None)
        }
    }

    fn pipeline() -> SentinelPipeline<NeverSolver> {
        SentinelPipeline::new(PipelineConfig::testing(), NeverSolver).unwrap()
    }

    #[test]
    fn test_new_pipeline_is_idle() {
        let pipeline = pipeline();
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(pipeline.receiver_count(), 0);
        assert_eq!(pipeline.transmitter_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = SentinelPipeline::new(
            PipelineConfig::default().with_compute_workers(0),
            NeverSolver,
        );
        assert!(matches!(
            result,
            Err(SentinelError::Config(ConfigError::InvalidWorkerCount { count: 0 }))
        ));
    }

    #[test]
    fn test_start_requires_workers() {
        let mut pipeline = pipeline();
        assert!(matches!(
            pipeline.start(0),
            Err(SentinelError::Config(ConfigError::InvalidWorkerCount { .. }))
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn test_stop_before_start_fails() {
        let mut pipeline = pipeline();
        assert!(matches!(
            pipeline.stop(),
            Err(SentinelError::Pipeline(PipelineError::NotRunning))
        ));
    }

    #[test]
    fn test_lifecycle_phases() {
        let mut pipeline = pipeline();
        pipeline.start(2).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert!(matches!(
            pipeline.start(2),
            Err(SentinelError::Pipeline(PipelineError::AlreadyStarted))
        ));

        let report = pipeline.stop().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(report.compute_workers, 2);
        assert_eq!(report.groups_seen, 0);
        assert!(matches!(
            pipeline.stop(),
            Err(SentinelError::Pipeline(PipelineError::NotRunning))
        ));
    }

    #[test]
    fn test_submit_after_stop_is_not_scheduled() {
        let mut pipeline = pipeline();
        pipeline.start(1).unwrap();
        pipeline.stop().unwrap();

        assert!(!pipeline.ingress().is_open());
        assert!(!pipeline.submit(Fragment::new(0x02230000000c)));
    }

    #[test]
    fn test_failed_spawn_aborts_without_sink_calls() {
        for role in ["compute", "receiver"] {
            let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
            let mut pipeline = pipeline();
            pipeline
                .add_transmitter(CountingTransmitter(Arc::clone(&calls)))
                .unwrap();
            pipeline.add_receiver(EndOfStream).unwrap();
            pipeline.submit(Fragment::new(0x0223_0000_000c));
            pipeline.submit(Fragment::new(0x071e_124d_abef));
            pipeline.fail_spawn_role = Some(role);

            let result = pipeline.start(2);
            assert!(matches!(
                result,
                Err(SentinelError::Pipeline(PipelineError::Spawn { role: ref failed, .. })) if failed == role
            ));
            assert_eq!(pipeline.state(), PipelineState::Stopped);
            assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
            assert!(matches!(
                pipeline.stop(),
                Err(SentinelError::Pipeline(PipelineError::NotRunning))
            ));
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Draining.to_string(), "draining");
        assert_eq!(PipelineState::Finalizing.to_string(), "finalizing");
    }
}
