//! Ingress Router
//!
//! Turns single fragments into compute tasks: append to the group store,
//! snapshot the group, enqueue `(group, snapshot)` for the compute pool.
//! Submitting never waits on downstream consumers.

use crate::queue::WorkQueue;
use crate::stats::PipelineStats;
use crate::store::GroupStore;
use sentinel_core::{ComputeTask, Fragment, GroupId, Snapshot};
use std::sync::Arc;
use tracing::{trace, warn};

// ----------------------------------------------------------------------------
// Ingress Router
// ----------------------------------------------------------------------------

/// Shared ingestion state: the group store and the compute queue it feeds
#[derive(Debug)]
pub struct IngressRouter {
    id_shift: u32,
    store: GroupStore,
    compute_queue: WorkQueue<ComputeTask>,
    stats: Arc<PipelineStats>,
}

impl IngressRouter {
    pub fn new(id_shift: u32, stats: Arc<PipelineStats>) -> Self {
        Self {
            id_shift,
            store: GroupStore::new(),
            compute_queue: WorkQueue::new(),
            stats,
        }
    }

    /// Route one fragment to its group and queue a fresh snapshot
    ///
    /// Returns `false` if the compute queue is already closed. The fragment
    /// is recorded in the group store either way.
    pub fn submit(&self, fragment: Fragment) -> bool {
        let group = fragment.group_id(self.id_shift);
        let snapshot = self.store.append(group, fragment);
        self.stats.record_fragment();

        trace!(%group, %fragment, len = snapshot.len(), "fragment routed");
        self.enqueue(group, snapshot)
    }

    fn enqueue(&self, group: GroupId, snapshot: Snapshot) -> bool {
        let accepted = self.compute_queue.push(ComputeTask::new(group, snapshot));
        if !accepted {
            self.stats.record_late_fragment();
            warn!(%group, "fragment submitted after ingestion closed, not scheduled");
        }
        accepted
    }

    pub fn id_shift(&self) -> u32 {
        self.id_shift
    }

    pub fn store(&self) -> &GroupStore {
        &self.store
    }

    pub fn compute_queue(&self) -> &WorkQueue<ComputeTask> {
        &self.compute_queue
    }
}

// ----------------------------------------------------------------------------
// Ingress Handle
// ----------------------------------------------------------------------------

/// Cloneable handle for feeding fragments from any thread
#[derive(Debug, Clone)]
pub struct IngressHandle {
    router: Arc<IngressRouter>,
}

impl IngressHandle {
    pub(crate) fn new(router: Arc<IngressRouter>) -> Self {
        Self { router }
    }

    /// Submit one fragment; see [`IngressRouter::submit`]
    pub fn submit(&self, fragment: Fragment) -> bool {
        self.router.submit(fragment)
    }

    /// Submit every fragment of `fragments` in order
    ///
    /// Returns how many were scheduled for resolution.
    pub fn submit_all<I>(&self, fragments: I) -> usize
    where
        I: IntoIterator<Item = Fragment>,
    {
        fragments
            .into_iter()
            .map(|fragment| self.submit(fragment))
            .filter(|scheduled| *scheduled)
            .count()
    }

    /// Whether submitted fragments are still scheduled for resolution
    pub fn is_open(&self) -> bool {
        !self.router.compute_queue().is_closed()
    }
}
