//! Core types for the Sentinel pipeline
//!
//! This module defines the fundamental data model shared by every pipeline
//! stage, using newtype patterns for type safety.

use core::fmt;
use core::ops::Deref;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::{SentinelError, SentinelResult};

// ----------------------------------------------------------------------------
// Group Identifier
// ----------------------------------------------------------------------------

/// Identifier of the group a fragment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(u64);

impl GroupId {
    /// Create a new GroupId
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw identifier
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Fragment
// ----------------------------------------------------------------------------

/// A single received fragment
///
/// The high bits carry the group id, the remaining bits are payload that only
/// the solver interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fragment(u64);

impl Fragment {
    /// Wrap a raw fragment
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw fragment bits
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Extract the group id encoded above `id_shift`
    ///
    /// Shifts of 64 or more are rejected by `PipelineConfig::validate`; here
    /// they yield group 0 rather than overflowing.
    pub fn group_id(&self, id_shift: u32) -> GroupId {
        GroupId(self.0.checked_shr(id_shift).unwrap_or(0))
    }

    /// Payload bits below `id_shift`
    pub fn payload(&self, id_shift: u32) -> u64 {
        match 1u64.checked_shl(id_shift) {
            Some(bound) => self.0 & (bound - 1),
            None => self.0,
        }
    }

    /// Parse a hex fragment, with or without a `0x` prefix
    pub fn parse_hex(input: &str) -> SentinelResult<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| SentinelError::InvalidFragment {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<u64> for Fragment {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#014x}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------------

/// Immutable copy of a group's fragment sequence at enqueue time
///
/// Cloning a snapshot is cheap; the underlying sequence is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[Fragment]>);

impl Snapshot {
    /// Copy `fragments` into a new snapshot
    pub fn new(fragments: &[Fragment]) -> Self {
        Self(Arc::from(fragments))
    }

    /// Fragments captured by this snapshot
    pub fn fragments(&self) -> &[Fragment] {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = [Fragment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Fragment>> for Snapshot {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self(Arc::from(fragments))
    }
}

// ----------------------------------------------------------------------------
// Queue Items
// ----------------------------------------------------------------------------

/// A group snapshot waiting to be handed to the solver
#[derive(Debug, Clone)]
pub struct ComputeTask {
    pub group: GroupId,
    pub snapshot: Snapshot,
}

impl ComputeTask {
    pub fn new(group: GroupId, snapshot: Snapshot) -> Self {
        Self { group, snapshot }
    }
}

/// A solver result waiting to be delivered to a transmitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<V> {
    pub group: GroupId,
    pub value: V,
}

impl<V> Resolved<V> {
    pub fn new(group: GroupId, value: V) -> Self {
        Self { group, value }
    }
}
