//! Closable Work Queues
//!
//! FIFO queues shared between one producer population and one consumer
//! population. Consumers block until an item arrives or the queue is closed;
//! closing broadcasts to every waiter exactly once, at the phase transition,
//! so no consumer ever polls.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

// ----------------------------------------------------------------------------
// Work Queue
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking FIFO queue with an explicit end-of-input signal
#[derive(Debug)]
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue an item and wake one consumer
    ///
    /// Returns `false` and drops the item if the queue is already closed.
    pub fn push(&self, item: T) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.items.push_back(item);
        drop(state);
        self.available.notify_one();
        true
    }

    /// Dequeue the oldest item, blocking while the queue is open and empty
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Non-blocking variant of [`pop`](Self::pop)
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Stop accepting items and wake every blocked consumer
    ///
    /// Items already queued are still handed out. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Rendezvous
// ----------------------------------------------------------------------------

/// Meeting point for a worker population
///
/// Every participant holds a [`RendezvousTicket`]; [`RendezvousTicket::wait`]
/// returns once all tickets have either waited or been dropped. A ticket
/// dropped without waiting (a worker that panicked, or a thread that never
/// spawned) still counts as arrived, so siblings cannot hang on it.
#[derive(Debug, Default)]
pub struct Rendezvous {
    pending: Mutex<usize>,
    all_arrived: Condvar,
}

impl Rendezvous {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register one more participant
    pub fn ticket(self: &Arc<Self>) -> RendezvousTicket {
        *self.pending.lock() += 1;
        RendezvousTicket {
            rendezvous: Arc::clone(self),
            arrived: false,
        }
    }

    /// Participants that have not arrived yet
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    fn arrive(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            drop(pending);
            self.all_arrived.notify_all();
        }
    }
}

/// One participant's place at a [`Rendezvous`]
#[derive(Debug)]
pub struct RendezvousTicket {
    rendezvous: Arc<Rendezvous>,
    arrived: bool,
}

impl RendezvousTicket {
    /// Arrive and block until every other participant has arrived
    pub fn wait(mut self) {
        self.arrived = true;
        self.rendezvous.arrive();

        let mut pending = self.rendezvous.pending.lock();
        while *pending > 0 {
            self.rendezvous.all_arrived.wait(&mut pending);
        }
    }
}

impl Drop for RendezvousTicket {
    fn drop(&mut self) {
        if !self.arrived {
            self.rendezvous.arrive();
        }
    }
}
