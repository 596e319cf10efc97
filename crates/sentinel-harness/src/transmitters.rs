//! Transmitter Test Doubles
//!
//! Both doubles write into a shared [`TransmitterLog`] so a test can keep a
//! handle after the transmitter has been moved into the pipeline.

use parking_lot::Mutex;
use sentinel_core::{GroupId, SentinelError, SentinelResult, Transmitter};
use std::sync::Arc;
use tracing::debug;

// ----------------------------------------------------------------------------
// Transmitter Log
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct LogEntries<V> {
    sent: Vec<(GroupId, V)>,
    incomplete: Vec<GroupId>,
}

/// Shared record of everything a transmitter was asked to do
#[derive(Debug)]
pub struct TransmitterLog<V> {
    entries: Arc<Mutex<LogEntries<V>>>,
}

impl<V> Clone for TransmitterLog<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for TransmitterLog<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TransmitterLog<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(LogEntries {
                sent: Vec::new(),
                incomplete: Vec::new(),
            })),
        }
    }

    fn push_sent(&self, group: GroupId, value: V) {
        self.entries.lock().sent.push((group, value));
    }

    fn push_incomplete(&self, group: GroupId) {
        self.entries.lock().incomplete.push(group);
    }

    pub fn total_sent(&self) -> usize {
        self.entries.lock().sent.len()
    }

    pub fn total_incomplete(&self) -> usize {
        self.entries.lock().incomplete.len()
    }

    /// Groups reported incomplete, in report order
    pub fn incomplete(&self) -> Vec<GroupId> {
        self.entries.lock().incomplete.clone()
    }

    /// Groups sent, in send order
    pub fn sent_groups(&self) -> Vec<GroupId> {
        self.entries.lock().sent.iter().map(|(group, _)| *group).collect()
    }
}

impl<V: Clone> TransmitterLog<V> {
    /// Every `(group, value)` pair sent, in send order
    pub fn sent(&self) -> Vec<(GroupId, V)> {
        self.entries.lock().sent.clone()
    }
}

// ----------------------------------------------------------------------------
// Recording Transmitter
// ----------------------------------------------------------------------------

/// Transmitter that accepts everything and records it
#[derive(Debug)]
pub struct RecordingTransmitter<V> {
    name: String,
    log: TransmitterLog<V>,
}

impl<V> RecordingTransmitter<V> {
    pub fn new() -> Self {
        Self::with_log(TransmitterLog::new())
    }

    pub fn with_log(log: TransmitterLog<V>) -> Self {
        Self {
            name: "recording".to_string(),
            log,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Handle that stays valid after the transmitter is moved
    pub fn log(&self) -> TransmitterLog<V> {
        self.log.clone()
    }
}

impl<V> Default for RecordingTransmitter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Transmitter<V> for RecordingTransmitter<V> {
    fn send(&mut self, group: GroupId, value: &V) -> SentinelResult<()> {
        debug!(transmitter = %self.name, %group, "recorded send");
        self.log.push_sent(group, value.clone());
        Ok(())
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        debug!(transmitter = %self.name, %group, "recorded incomplete");
        self.log.push_incomplete(group);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ----------------------------------------------------------------------------
// Failing Transmitter
// ----------------------------------------------------------------------------

/// Transmitter that records every attempt and then rejects it
#[derive(Debug)]
pub struct FailingTransmitter<V> {
    log: TransmitterLog<V>,
    fail_incomplete: bool,
}

impl<V> FailingTransmitter<V> {
    /// Fails sends only; incomplete reports succeed
    pub fn new() -> Self {
        Self {
            log: TransmitterLog::new(),
            fail_incomplete: false,
        }
    }

    /// Fails incomplete reports as well
    pub fn failing_incomplete(mut self) -> Self {
        self.fail_incomplete = true;
        self
    }

    pub fn log(&self) -> TransmitterLog<V> {
        self.log.clone()
    }
}

impl<V> Default for FailingTransmitter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Transmitter<V> for FailingTransmitter<V> {
    fn send(&mut self, group: GroupId, value: &V) -> SentinelResult<()> {
        self.log.push_sent(group, value.clone());
        Err(SentinelError::transmitter(group, "send rejected"))
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        self.log.push_incomplete(group);
        if self.fail_incomplete {
            return Err(SentinelError::transmitter(group, "incomplete report rejected"));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "failing"
    }
}
