/*! Implements the System-Z-like construction of a ranking function for a
first-order conditional knowledge base from a tolerance pair, together
with the tolerance-pair validator. */
use crate::ranking::{Rank, RankingFunction};
use crate::tolerance::TolerancePair;
use crate::worlds::{PossibleWorld, WorldSet};
use kappa_fol::grounding;
use kappa_fol::syntax::{Conditional, Const, KnowledgeBase};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Is the witness the validator records for one conditional: the world and
/// constant realizing its tolerance within its subset. The constant is
/// `None` in the propositional case, where a dummy constant stands in.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ToleranceWitness {
    /// Index of the subset the conditional belongs to.
    pub subset: usize,

    /// The tolerated conditional.
    pub conditional: Conditional,

    /// The verifying constant, `None` for the dummy constant.
    pub constant: Option<Const>,

    /// The verifying world.
    pub world: PossibleWorld,
}

impl fmt::Display for ToleranceWitness {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "i={}, r={}", self.subset, self.conditional)?;
        match &self.constant {
            Some(a) => write!(f, ", a={}", a)?,
            None => {}
        }
        write!(f, "\n{}", self.world)
    }
}

/// Returns the constants of subset `i` of a pair, or the dummy constant in
/// the propositional case, where all constant parts are empty.
fn constants_for_part(pair: &TolerancePair, i: usize) -> (Vec<Const>, bool) {
    let part = pair.constant_part(i);
    if part.is_empty() {
        (vec![Const::from("")], true)
    } else {
        (part.iter().cloned().collect(), false)
    }
}

/// Is the System-Z constructor: given a knowledge base and a partition
/// pair, it validates the pair and, when it is a tolerance pair, computes
/// the normalized ranking function. An invalid pair is not an error; it
/// leaves the ranking all zero and is observable through
/// [`SystemZ::tolerance_pair`] returning `None`.
pub struct SystemZ {
    worlds: Arc<WorldSet>,
    pair: Option<TolerancePair>,
    witnesses: Vec<ToleranceWitness>,
    kappa: RankingFunction,
    kappa_zero: u64,
}

impl SystemZ {
    /// Validates `pair` against `kb` and, on success, computes the ranking
    /// function.
    pub fn new(kb: &KnowledgeBase, worlds: Arc<WorldSet>, pair: TolerancePair) -> Self {
        let kappa = RankingFunction::new(worlds.clone());
        let mut system = Self {
            worlds,
            pair: None,
            witnesses: Vec::new(),
            kappa,
            kappa_zero: 0,
        };
        if let Some(witnesses) = Self::check_tolerance(kb, &system.worlds, &pair) {
            system.witnesses = witnesses;
            system.pair = Some(pair);
        }
        system.compute_ranking(kb);
        system
    }

    /// Returns the validated tolerance pair, or `None` if the given pair
    /// was no tolerance pair.
    pub fn tolerance_pair(&self) -> Option<&TolerancePair> {
        self.pair.as_ref()
    }

    /// Returns the witnesses recorded by the validator, one per
    /// conditional.
    pub fn witnesses(&self) -> &[ToleranceWitness] {
        &self.witnesses
    }

    /// Consumes the receiver and returns the witnesses.
    pub fn into_witnesses(self) -> Vec<ToleranceWitness> {
        self.witnesses
    }

    /// Returns the computed ranking function: the System-Z ranking if the
    /// pair was valid, the all-zero ranking otherwise.
    pub fn ranking(&self) -> &RankingFunction {
        &self.kappa
    }

    /// Consumes the receiver and returns the ranking function.
    pub fn into_ranking(self) -> RankingFunction {
        self.kappa
    }

    /// Returns the normalization offset κ₀ that was subtracted from every
    /// finite rank.
    pub fn kappa_zero(&self) -> u64 {
        self.kappa_zero
    }

    /// Decides whether `pair` is a tolerance pair for `kb`: for every
    /// subset `i` and conditional `c ∈ Rᵢ` there is a world satisfying all
    /// facts and a constant `a ∈ Dᵢ` (or the dummy constant in the
    /// propositional case) such that the world verifies `c` grounded with
    /// `a` and falsifies no conditional of any subset `j ≥ i` grounded
    /// with any constant of `Dᵢ`. On success the recorded witnesses are
    /// returned.
    pub fn check_tolerance(
        kb: &KnowledgeBase,
        worlds: &WorldSet,
        pair: &TolerancePair,
    ) -> Option<Vec<ToleranceWitness>> {
        let mut witnesses = Vec::new();

        for i in 0..pair.n_parts() {
            let (constants, dummy) = constants_for_part(pair, i);
            for c in pair.conditional_part(i) {
                let mut witness = None;

                'world: for world in worlds {
                    if !world.satisfies_all(kb.facts()) {
                        continue;
                    }
                    for a in &constants {
                        let cg = grounding::ground_conditional(c, a);
                        if !world.verifies(&cg) {
                            continue;
                        }
                        let mut falsified = false;
                        'check: for j in i..pair.n_parts() {
                            for other in pair.conditional_part(j) {
                                for a2 in &constants {
                                    let og = grounding::ground_conditional(other, a2);
                                    if world.falsifies(&og) {
                                        falsified = true;
                                        break 'check;
                                    }
                                }
                            }
                        }
                        if !falsified {
                            witness = Some(ToleranceWitness {
                                subset: i,
                                conditional: c.clone(),
                                constant: if dummy { None } else { Some(a.clone()) },
                                world: world.clone(),
                            });
                            break 'world;
                        }
                    }
                }

                match witness {
                    Some(w) => witnesses.push(w),
                    // no world tolerates this conditional
                    None => return None,
                }
            }
        }

        Some(witnesses)
    }

    /// Computes λ(i, w): zero when no conditional is falsified by `w`
    /// under the constants of subset `i`, otherwise `j + 1` for the
    /// largest subset index `j` holding a falsified conditional.
    pub fn lambda(&self, i: usize, world: &PossibleWorld) -> Rank {
        match &self.pair {
            None => Rank::INFINITY,
            Some(pair) => Rank::finite(Self::lambda_for(pair, i, world)),
        }
    }

    fn lambda_for(pair: &TolerancePair, i: usize, world: &PossibleWorld) -> u64 {
        let (constants, _) = constants_for_part(pair, i);
        // scan from the largest subset down and stop on the first hit
        for j in (0..pair.n_parts()).rev() {
            for a in &constants {
                for c in pair.conditional_part(j) {
                    let cg = grounding::ground_conditional(c, a);
                    if world.falsifies(&cg) {
                        return j as u64 + 1;
                    }
                }
            }
        }
        0
    }

    fn compute_ranking(&mut self, kb: &KnowledgeBase) {
        let pair = match &self.pair {
            Some(pair) => pair.clone(),
            None => return,
        };
        let m = pair.n_parts() as u64 - 1;

        let mut kappa_zero = u64::MAX;
        for (index, world) in self.worlds.iter().enumerate() {
            if !world.satisfies_all(kb.facts()) {
                self.kappa.set_rank_at(index, Rank::INFINITY);
                continue;
            }
            let mut sum = 0u64;
            for i in 0..pair.n_parts() {
                sum += (m + 2).pow(i as u32) * Self::lambda_for(&pair, i, world);
            }
            self.kappa.set_rank_at(index, Rank::finite(sum));
            if sum < kappa_zero {
                kappa_zero = sum;
            }
        }

        // normalize so that some world has rank 0
        if kappa_zero != u64::MAX && kappa_zero > 0 {
            for index in 0..self.worlds.len() {
                let rank = self.kappa.rank_at(index);
                if let Some(value) = rank.value() {
                    self.kappa.set_rank_at(index, Rank::finite(value - kappa_zero));
                }
            }
        }
        self.kappa_zero = if kappa_zero == u64::MAX { 0 } else { kappa_zero };

        debug!(
            event = crate::trace::RANKED,
            parts = pair.n_parts(),
            kappa_zero = self.kappa_zero
        );
    }
}
