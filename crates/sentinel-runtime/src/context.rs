//! Pipeline Context
//!
//! Everything the worker threads of one pipeline instance share. The context
//! is owned by its pipeline through an `Arc`, so several pipelines can run
//! side by side and each is torn down with its owner.

use crate::ingress::IngressRouter;
use crate::queue::WorkQueue;
use crate::stats::PipelineStats;
use crate::store::DeliveryLedger;
use sentinel_core::{DuplicatePolicy, PipelineConfig, Resolved};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared state of one pipeline instance
#[derive(Debug)]
pub struct PipelineContext<V> {
    router: Arc<IngressRouter>,
    send_queue: WorkQueue<Resolved<V>>,
    ledger: DeliveryLedger,
    stats: Arc<PipelineStats>,
    duplicate_policy: DuplicatePolicy,
    aborted: AtomicBool,
}

impl<V> PipelineContext<V> {
    pub fn new(config: &PipelineConfig) -> Self {
        let stats = Arc::new(PipelineStats::default());
        Self {
            router: Arc::new(IngressRouter::new(config.id_shift, Arc::clone(&stats))),
            send_queue: WorkQueue::new(),
            ledger: DeliveryLedger::new(),
            stats,
            duplicate_policy: config.duplicate_policy,
            aborted: AtomicBool::new(false),
        }
    }

    pub fn router(&self) -> &Arc<IngressRouter> {
        &self.router
    }

    pub fn send_queue(&self) -> &WorkQueue<Resolved<V>> {
        &self.send_queue
    }

    pub fn ledger(&self) -> &DeliveryLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Mark the run as failed; send workers then skip delivery and finalization
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
