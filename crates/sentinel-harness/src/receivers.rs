//! Receiver Test Doubles
//!
//! - [`ScriptedReceiver`]: replays a fixed fragment list, then ends the stream
//! - [`FailingReceiver`]: replays a prefix, then reports a receiver failure

use crate::feeder::Jitter;
use sentinel_core::{Fragment, Receiver, SentinelError, SentinelResult};
use std::collections::VecDeque;

// ----------------------------------------------------------------------------
// Scripted Receiver
// ----------------------------------------------------------------------------

/// Receiver that yields a predefined fragment sequence
#[derive(Debug, Clone)]
pub struct ScriptedReceiver {
    name: String,
    pending: VecDeque<Fragment>,
    jitter: Jitter,
}

impl ScriptedReceiver {
    pub fn new<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        Self {
            name: "scripted".to_string(),
            pending: fragments.into_iter().collect(),
            jitter: Jitter::none(),
        }
    }

    /// Build from raw `u64` fragments
    pub fn from_raw(raw: &[u64]) -> Self {
        Self::new(raw.iter().copied().map(Fragment::new))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Pause randomly before each fragment
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Receiver for ScriptedReceiver {
    fn receive(&mut self) -> SentinelResult<Option<Fragment>> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        self.jitter.pause();
        Ok(self.pending.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ----------------------------------------------------------------------------
// Failing Receiver
// ----------------------------------------------------------------------------

/// Receiver that fails once its scripted prefix is exhausted
#[derive(Debug, Clone)]
pub struct FailingReceiver {
    inner: ScriptedReceiver,
    reason: String,
}

impl FailingReceiver {
    pub fn new<I>(prefix: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        Self {
            inner: ScriptedReceiver::new(prefix).named("failing"),
            reason: reason.into(),
        }
    }
}

impl Receiver for FailingReceiver {
    fn receive(&mut self) -> SentinelResult<Option<Fragment>> {
        match self.inner.receive()? {
            Some(fragment) => Ok(Some(fragment)),
            None => Err(SentinelError::receiver(self.reason.clone())),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
