/*! Implements tolerance pairs and the strategies that search for them: an
exhaustive brute-force enumeration of all partition pairs, a backtracking
tree search, and a minimal-only variant of the search. */
mod brute;
mod pair;
mod progress;
mod search;

pub use brute::BruteForceCreator;
pub use pair::{Subset, TolerancePair};
pub use progress::ProgressSink;
pub use search::SearchCreator;

use crate::systemz::ToleranceWitness;
use crate::worlds::WorldSet;
use kappa_fol::syntax::KnowledgeBase;
use std::sync::Arc;

/// Is a valid tolerance pair together with the witnesses the validator
/// recorded for it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValidPair {
    /// The tolerance pair.
    pub pair: TolerancePair,

    /// One witness per conditional of the knowledge base.
    pub witnesses: Vec<ToleranceWitness>,
}

/// Selects a strategy for creating tolerance pairs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchStrategy {
    /// Enumerate and test every partition pair.
    BruteForce,

    /// Explore the partition tree, collecting all valid pairs.
    SearchAll,

    /// Explore the partition tree, collecting only the minimal valid
    /// pairs.
    SearchMin,
}

/// Creates the tolerance pairs of `kb` with the chosen strategy. The result
/// is sorted by [`TolerancePair::order`]; an empty result means the
/// knowledge base is inconsistent. The optional progress sink is invoked
/// periodically and may cancel the search by returning `false`, in which
/// case the (cleared) result is returned cleanly.
pub fn create_pairs(
    kb: &KnowledgeBase,
    worlds: &Arc<WorldSet>,
    strategy: SearchStrategy,
    sink: Option<&mut dyn ProgressSink>,
) -> Vec<ValidPair> {
    match strategy {
        SearchStrategy::BruteForce => {
            let mut creator = BruteForceCreator::new(kb, worlds.clone());
            creator.create_pairs(sink);
            creator.into_results()
        }
        SearchStrategy::SearchAll => {
            let mut creator = SearchCreator::all(kb, worlds.clone());
            creator.create_pairs(sink);
            creator.into_results()
        }
        SearchStrategy::SearchMin => {
            let mut creator = SearchCreator::minimal(kb, worlds.clone());
            creator.create_pairs(sink);
            creator.into_results()
        }
    }
}
