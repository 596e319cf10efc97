//! Group Store and Delivery Ledger
//!
//! The group store accumulates every fragment seen during a run, keyed by
//! group id. The delivery ledger (the "sent set") records which groups have
//! had at least one result forwarded to a transmitter. Both only grow.

use parking_lot::Mutex;
use sentinel_core::{Fragment, GroupId, Snapshot};
use std::collections::{BTreeMap, BTreeSet};

// ----------------------------------------------------------------------------
// Group Store
// ----------------------------------------------------------------------------

/// Thread-safe, append-only map from group id to its fragment sequence
#[derive(Debug, Default)]
pub struct GroupStore {
    groups: Mutex<BTreeMap<GroupId, Vec<Fragment>>>,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `fragment` to `group` and return a snapshot of the result
    ///
    /// The group is created on first use. The lock covers only the append
    /// and the copy.
    pub fn append(&self, group: GroupId, fragment: Fragment) -> Snapshot {
        let mut groups = self.groups.lock();
        let sequence = groups.entry(group).or_default();
        sequence.push(fragment);
        Snapshot::new(sequence.as_slice())
    }

    /// All group ids seen so far, ascending
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.lock().keys().copied().collect()
    }

    /// Current fragment sequence of `group`
    pub fn fragments(&self, group: GroupId) -> Option<Vec<Fragment>> {
        self.groups.lock().get(&group).cloned()
    }

    /// Copy of the whole store
    pub fn to_map(&self) -> BTreeMap<GroupId, Vec<Fragment>> {
        self.groups.lock().clone()
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().len()
    }

    pub fn fragment_count(&self) -> usize {
        self.groups.lock().values().map(Vec::len).sum()
    }
}

// ----------------------------------------------------------------------------
// Delivery Ledger
// ----------------------------------------------------------------------------

/// Monotonic record of delivered groups
#[derive(Debug, Default)]
pub struct DeliveryLedger {
    sent: Mutex<BTreeSet<GroupId>>,
}

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `group` as delivered
    pub fn record(&self, group: GroupId) {
        self.sent.lock().insert(group);
    }

    /// Mark `group` as delivered, returning `false` if it already was
    pub fn claim(&self, group: GroupId) -> bool {
        self.sent.lock().insert(group)
    }

    pub fn contains(&self, group: GroupId) -> bool {
        self.sent.lock().contains(&group)
    }

    /// Groups from `candidates` that were never delivered, in input order
    pub fn undelivered(&self, candidates: &[GroupId]) -> Vec<GroupId> {
        let sent = self.sent.lock();
        candidates
            .iter()
            .copied()
            .filter(|group| !sent.contains(group))
            .collect()
    }

    pub fn delivered(&self) -> Vec<GroupId> {
        self.sent.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_creates_group_lazily() {
        let store = GroupStore::new();
        assert_eq!(store.group_count(), 0);

        let snapshot = store.append(GroupId::new(7), Fragment::new(1));
        assert_eq!(snapshot.fragments(), &[Fragment::new(1)]);
        assert_eq!(store.group_ids(), vec![GroupId::new(7)]);
    }

    #[test]
    fn test_snapshots_do_not_see_later_appends() {
        let store = GroupStore::new();
        let group = GroupId::new(3);

        let first = store.append(group, Fragment::new(10));
        let second = store.append(group, Fragment::new(11));

        assert_eq!(first.len(), 1);
        assert_eq!(second.fragments(), &[Fragment::new(10), Fragment::new(11)]);
        assert_eq!(store.fragments(group).unwrap().len(), 2);
        assert_eq!(store.fragment_count(), 2);
    }

    #[test]
    fn test_group_ids_are_sorted() {
        let store = GroupStore::new();
        for id in [9, 2, 5, 2] {
            store.append(GroupId::new(id), Fragment::new(id));
        }
        assert_eq!(
            store.group_ids(),
            vec![GroupId::new(2), GroupId::new(5), GroupId::new(9)]
        );
    }

    #[test]
    fn test_ledger_claim_is_one_way() {
        let ledger = DeliveryLedger::new();
        let group = GroupId::new(0x38);

        assert!(ledger.claim(group));
        assert!(!ledger.claim(group));
        ledger.record(group);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(group));
    }

    #[test]
    fn test_ledger_undelivered() {
        let ledger = DeliveryLedger::new();
        ledger.record(GroupId::new(2));

        let all = [GroupId::new(1), GroupId::new(2), GroupId::new(3)];
        assert_eq!(
            ledger.undelivered(&all),
            vec![GroupId::new(1), GroupId::new(3)]
        );
    }
}
