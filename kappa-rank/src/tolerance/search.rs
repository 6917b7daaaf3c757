/*! Implements the backtracking strategy: a tree of partially built
partition pairs, rooted at the pair with one empty subset. Nodes extend
the trailing subset by one conditional or constant, or open a new empty
subset; branches whose trailing subset cannot be tolerated are pruned
early, and fully placed leaves are tested through the validator. The
minimal-only variant additionally prunes against the current best pair. */
use super::{ProgressSink, TolerancePair, ValidPair};
use crate::systemz::SystemZ;
use crate::trace;
use crate::worlds::WorldSet;
use kappa_fol::grounding;
use kappa_fol::syntax::{Conditional, Const, KnowledgeBase};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates tolerance pairs by exploring the partition tree, either
/// collecting every valid pair or only the minimal ones.
pub struct SearchCreator {
    kb: KnowledgeBase,
    worlds: Arc<WorldSet>,
    /// canonical indices of the worlds satisfying all facts
    valid_worlds: Vec<usize>,
    visited: HashSet<TolerancePair>,
    results: Vec<ValidPair>,
    minimal: bool,
    propositional: bool,
    cancelled: bool,
}

impl SearchCreator {
    /// Returns a search creator collecting all valid pairs.
    pub fn all(kb: &KnowledgeBase, worlds: Arc<WorldSet>) -> Self {
        Self::with_mode(kb, worlds, false)
    }

    /// Returns a search creator collecting only the minimal valid pairs.
    pub fn minimal(kb: &KnowledgeBase, worlds: Arc<WorldSet>) -> Self {
        Self::with_mode(kb, worlds, true)
    }

    fn with_mode(kb: &KnowledgeBase, worlds: Arc<WorldSet>, minimal: bool) -> Self {
        let valid_worlds = worlds
            .iter()
            .enumerate()
            .filter(|(_, w)| w.satisfies_all(kb.facts()))
            .map(|(i, _)| i)
            .collect();
        Self {
            kb: kb.clone(),
            worlds,
            valid_worlds,
            visited: HashSet::new(),
            results: Vec::new(),
            minimal,
            propositional: false,
            cancelled: false,
        }
    }

    /// Explores the partition tree. The sink is invoked before every node
    /// expansion and may cancel the run; the results are then cleared. The
    /// surviving results are sorted by pair order.
    pub fn create_pairs(&mut self, mut sink: Option<&mut dyn ProgressSink>) {
        self.results.clear();
        self.visited.clear();
        self.cancelled = false;

        let left_conditionals: BTreeSet<Conditional> =
            self.kb.conditionals().iter().cloned().collect();
        let left_constants: BTreeSet<Const> = self.worlds.domain().iter().cloned().collect();
        self.propositional = left_constants.is_empty();
        let strategy = if self.minimal { "search-min" } else { "search-all" };
        info!(
            event = trace::SEARCH,
            strategy,
            conditionals = left_conditionals.len(),
            constants = left_constants.len()
        );

        self.search(
            TolerancePair::new(1),
            &left_conditionals,
            &left_constants,
            &mut sink,
        );
        self.results.sort_by(|a, b| a.pair.order(&b.pair));
    }

    /// Returns the valid pairs found so far.
    pub fn results(&self) -> &[ValidPair] {
        &self.results
    }

    /// Consumes the receiver and returns the valid pairs.
    pub fn into_results(self) -> Vec<ValidPair> {
        self.results
    }

    fn search(
        &mut self,
        pair: TolerancePair,
        left_conditionals: &BTreeSet<Conditional>,
        left_constants: &BTreeSet<Const>,
        sink: &mut Option<&mut dyn ProgressSink>,
    ) {
        if self.cancelled {
            return;
        }
        if let Some(s) = sink.as_mut() {
            if !s.progress_changed(0.0) {
                info!(event = trace::CANCEL);
                self.results.clear();
                self.cancelled = true;
                return;
            }
        }

        if !self.test(&pair, left_conditionals, left_constants) {
            return;
        }

        let subset = pair.n_parts() - 1;

        if !self.propositional
            && pair.conditional_part(subset).is_empty()
            && pair.constant_part(subset).is_empty()
        {
            // a fresh subset is seeded with one conditional and one constant
            for c in left_conditionals {
                for a in left_constants {
                    self.add_and_search(
                        &pair,
                        left_conditionals,
                        Some(c),
                        left_constants,
                        Some(a),
                        sink,
                    );
                }
            }
        } else {
            if !pair.constant_part(subset).is_empty() || self.propositional {
                for c in left_conditionals {
                    self.add_and_search(&pair, left_conditionals, Some(c), left_constants, None, sink);
                }
            }
            if !pair.conditional_part(subset).is_empty() {
                for a in left_constants {
                    self.add_and_search(&pair, left_conditionals, None, left_constants, Some(a), sink);
                }
            }
        }

        // open a new subset once the current one is populated and both
        // element kinds are still available
        if !pair.conditional_part(subset).is_empty()
            && (!pair.constant_part(subset).is_empty() || self.propositional)
            && !left_conditionals.is_empty()
            && (!left_constants.is_empty() || self.propositional)
        {
            self.search(pair.extend(), left_conditionals, left_constants, sink);
        }
    }

    fn add_and_search(
        &mut self,
        pair: &TolerancePair,
        left_conditionals: &BTreeSet<Conditional>,
        conditional: Option<&Conditional>,
        left_constants: &BTreeSet<Const>,
        constant: Option<&Const>,
        sink: &mut Option<&mut dyn ProgressSink>,
    ) {
        let mut new_pair = pair.clone();
        let last = new_pair.n_parts() - 1;

        let mut new_left_conditionals = left_conditionals.clone();
        if let Some(c) = conditional {
            new_left_conditionals.remove(c);
            new_pair.part_mut(last).conditionals.insert(c.clone());
        }
        let mut new_left_constants = left_constants.clone();
        if let Some(a) = constant {
            new_left_constants.remove(a);
            new_pair.part_mut(last).constants.insert(a.clone());
        }

        self.search(new_pair, &new_left_conditionals, &new_left_constants, sink);
    }

    /// Decides whether the node should be expanded. Leaves (duplicates,
    /// fully placed pairs, and nodes whose trailing subset fails the
    /// tolerance check) are not expanded; fully placed pairs are tested
    /// and recorded here.
    fn test(
        &mut self,
        pair: &TolerancePair,
        left_conditionals: &BTreeSet<Conditional>,
        left_constants: &BTreeSet<Const>,
    ) -> bool {
        let subset = pair.n_parts() - 1;

        // an empty trailing subset always needs expansion
        if pair.conditional_part(subset).is_empty() && pair.constant_part(subset).is_empty() {
            return true;
        }

        if !self.visited.insert(pair.clone()) {
            return false;
        }

        if self.minimal {
            if let Some(best) = self.results.first() {
                if best.pair.order_partial(pair) == Ordering::Less {
                    debug!(event = trace::PRUNE, reason = "beyond the current minimum");
                    return false;
                }
            }
        }

        if left_conditionals.is_empty() && (left_constants.is_empty() || self.propositional) {
            // fully placed: run the validator
            let system = SystemZ::new(&self.kb, self.worlds.clone(), pair.clone());
            if system.tolerance_pair().is_some() {
                if self.minimal {
                    let comparison = match self.results.first() {
                        None => Ordering::Equal,
                        Some(best) => pair.order(&best.pair),
                    };
                    if comparison != Ordering::Greater {
                        if comparison == Ordering::Less {
                            self.results.clear();
                        }
                        info!(event = trace::PAIR, pair = %pair);
                        self.results.push(ValidPair {
                            pair: pair.clone(),
                            witnesses: system.into_witnesses(),
                        });
                    }
                } else {
                    info!(event = trace::PAIR, pair = %pair);
                    self.results.push(ValidPair {
                        pair: pair.clone(),
                        witnesses: system.into_witnesses(),
                    });
                }
            }
            return false;
        }

        if !self.partial_tolerance(pair, left_conditionals) {
            debug!(event = trace::PRUNE, reason = "trailing subset not tolerated");
            return false;
        }

        true
    }

    /// Checks the tolerance condition for the conditionals of the trailing
    /// subset only: each must be verified in some fact-satisfying world by
    /// a constant of the trailing subset while no unplaced or trailing
    /// conditional is falsified there. Every world still has rank 0 at
    /// this point, so verification and falsification reduce to plain
    /// satisfaction.
    fn partial_tolerance(
        &self,
        pair: &TolerancePair,
        left_conditionals: &BTreeSet<Conditional>,
    ) -> bool {
        let last = pair.n_parts() - 1;
        let constants: Vec<Const> = if pair.constant_part(last).is_empty() {
            // dummy constant for the propositional case
            vec![Const::from("")]
        } else {
            pair.constant_part(last).iter().cloned().collect()
        };

        let mut check: BTreeSet<&Conditional> = left_conditionals.iter().collect();
        check.extend(pair.conditional_part(last).iter());

        'conditional: for c in pair.conditional_part(last) {
            for &index in &self.valid_worlds {
                let world = &self.worlds.worlds()[index];
                for a in &constants {
                    let cg = grounding::ground_conditional(c, a);
                    if !world.verifies(&cg) {
                        continue;
                    }
                    let mut falsified = false;
                    'falsification: for other in &check {
                        for a2 in &constants {
                            let og = grounding::ground_conditional(other, a2);
                            if world.falsifies(&og) {
                                falsified = true;
                                break 'falsification;
                            }
                        }
                    }
                    if !falsified {
                        continue 'conditional;
                    }
                }
            }
            // no world tolerates this conditional
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worlds::{create_possible_worlds, DEFAULT_ATOM_LIMIT};
    use kappa_fol::parser::parse_knowledge_base;

    fn simple() -> (Arc<WorldSet>, KnowledgeBase) {
        let text = r#"
signature

D={t,p}
B(D)
F(D)

conditionals

Conditionals{
  (F(X) | B(X))
}
Facts{
  (B(p))
}
"#;
        let (sig, kb) = parse_knowledge_base(text).unwrap();
        let worlds = Arc::new(
            create_possible_worlds(sig.ground_atoms(), sig.domain().to_vec(), DEFAULT_ATOM_LIMIT)
                .unwrap(),
        );
        (worlds, kb)
    }

    #[test]
    fn single_conditional_has_a_single_subset_pair() {
        let (worlds, kb) = simple();
        let mut creator = SearchCreator::all(&kb, worlds);
        creator.create_pairs(None);
        assert!(!creator.results().is_empty());
        for valid in creator.results() {
            assert_eq!(1, valid.pair.n_parts());
            assert_eq!(1, valid.pair.conditional_part(0).len());
        }
    }

    #[test]
    fn cancellation_clears_the_results() {
        let (worlds, kb) = simple();
        let mut creator = SearchCreator::all(&kb, worlds);
        let mut calls = 0usize;
        let mut sink = |_p: f64| {
            calls += 1;
            calls < 3
        };
        creator.create_pairs(Some(&mut sink));
        assert!(creator.results().is_empty());
        assert_eq!(3, calls);
    }

    #[test]
    fn progress_keeps_running_when_the_sink_agrees() {
        let (worlds, kb) = simple();
        let mut all = SearchCreator::all(&kb, worlds.clone());
        all.create_pairs(None);

        let mut observed = SearchCreator::all(&kb, worlds);
        let mut sink = |_p: f64| true;
        observed.create_pairs(Some(&mut sink));
        assert_eq!(all.results(), observed.results());
    }
}
