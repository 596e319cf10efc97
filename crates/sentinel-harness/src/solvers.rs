//! Solver Test Doubles
//!
//! [`ThresholdSolver`] resolves a group once it holds enough distinct
//! fragments; its value is the sum of their payloads, so it depends only on
//! the set of fragments and not on arrival order. [`SlowSolver`] wraps any
//! solver with a fixed delay to keep compute workers busy.

use sentinel_core::{CandidateSearch, Fragment, MaximalSolver, Solver, DEFAULT_ID_SHIFT};
use std::collections::BTreeSet;
use std::time::Duration;

// ----------------------------------------------------------------------------
// Threshold Solver
// ----------------------------------------------------------------------------

/// Candidate search behind [`ThresholdSolver`]
///
/// Every prefix of the ascending distinct fragment set that reaches the
/// threshold is a candidate valued at its payload sum; the maximum is the
/// full set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSearch {
    min_fragments: usize,
    id_shift: u32,
}

impl CandidateSearch for ThresholdSearch {
    type Value = u128;

    fn search(&self, fragments: &[Fragment], visit: &mut dyn FnMut(u128)) {
        let distinct: BTreeSet<Fragment> = fragments.iter().copied().collect();
        let mut sum = 0u128;
        for (taken, fragment) in distinct.iter().enumerate() {
            sum += u128::from(fragment.payload(self.id_shift));
            if taken + 1 >= self.min_fragments {
                visit(sum);
            }
        }
    }
}

/// Resolves once at least `min_fragments` distinct fragments are present
pub type ThresholdSolver = MaximalSolver<ThresholdSearch>;

impl ThresholdSearch {
    pub fn new(min_fragments: usize, id_shift: u32) -> Self {
        Self {
            min_fragments: min_fragments.max(1),
            id_shift,
        }
    }

    pub fn min_fragments(&self) -> usize {
        self.min_fragments
    }
}

/// Threshold solver for the default group id layout
pub fn threshold_solver(min_fragments: usize) -> ThresholdSolver {
    MaximalSolver::new(ThresholdSearch::new(min_fragments, DEFAULT_ID_SHIFT))
}

// ----------------------------------------------------------------------------
// Slow Solver
// ----------------------------------------------------------------------------

/// Delays every call to the wrapped solver
#[derive(Debug, Clone)]
pub struct SlowSolver<S> {
    inner: S,
    delay: Duration,
}

impl<S: Solver> SlowSolver<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S: Solver> Solver for SlowSolver<S> {
    type Value = S::Value;

    fn resolve(&self, fragments: &[Fragment]) -> Option<Self::Value> {
        std::thread::sleep(self.delay);
        self.inner.resolve(fragments)
    }
}
