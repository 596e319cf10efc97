//! Maximal-candidate solver
//!
//! A fragment sequence can usually be combined in several ways; each decodable
//! combination yields a candidate value. [`MaximalSolver`] turns any
//! [`CandidateSearch`] into a [`Solver`] that keeps the largest candidate and
//! reports the sequence unresolvable when no candidate exists.

use crate::capability::Solver;
use crate::types::Fragment;

/// Enumerates the candidate values a fragment sequence decodes to
pub trait CandidateSearch: Send + Sync {
    type Value: Ord + Send + 'static;

    /// Call `visit` once per decodable combination of `fragments`
    fn search(&self, fragments: &[Fragment], visit: &mut dyn FnMut(Self::Value));
}

/// Solver returning the maximum over all candidates
#[derive(Debug, Clone, Default)]
pub struct MaximalSolver<C> {
    search: C,
}

impl<C: CandidateSearch> MaximalSolver<C> {
    pub fn new(search: C) -> Self {
        Self { search }
    }

    pub fn search(&self) -> &C {
        &self.search
    }
}

impl<C: CandidateSearch> Solver for MaximalSolver<C> {
    type Value = C::Value;

    fn resolve(&self, fragments: &[Fragment]) -> Option<Self::Value> {
        let mut best: Option<C::Value> = None;
        self.search.search(fragments, &mut |candidate| match &best {
            Some(current) if *current >= candidate => {}
            _ => best = Some(candidate),
        });
        best
    }
}
