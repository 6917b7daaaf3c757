/*! Implements the brute-force strategy: enumerate every ordered partition
pair of the conditionals and the domain and test each candidate. */
use super::{ProgressSink, TolerancePair, ValidPair};
use crate::systemz::SystemZ;
use crate::trace;
use crate::worlds::WorldSet;
use kappa_fol::syntax::{Conditional, Const, KnowledgeBase};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates tolerance pairs by generating all partition pairs and testing
/// each one through the validator. Progress is reported after every tested
/// candidate.
pub struct BruteForceCreator {
    kb: KnowledgeBase,
    worlds: Arc<WorldSet>,
    results: Vec<ValidPair>,
}

impl BruteForceCreator {
    /// Returns a brute-force creator for the given knowledge base and
    /// world set.
    pub fn new(kb: &KnowledgeBase, worlds: Arc<WorldSet>) -> Self {
        Self {
            kb: kb.clone(),
            worlds,
            results: Vec::new(),
        }
    }

    /// Generates and tests all partition pairs, in pair order. The sink
    /// may cancel the run; the results are then cleared.
    pub fn create_pairs(&mut self, mut sink: Option<&mut dyn ProgressSink>) {
        let conditionals = self.kb.conditionals().to_vec();
        let constants = self.worlds.domain().to_vec();

        let mut candidates = generate_partition_pairs(&conditionals, &constants);
        candidates.sort_by(|a, b| a.order(b));
        info!(
            event = trace::SEARCH,
            strategy = "brute-force",
            candidates = candidates.len()
        );

        self.results.clear();
        let total = candidates.len();
        for (tested, pair) in candidates.into_iter().enumerate() {
            let system = SystemZ::new(&self.kb, self.worlds.clone(), pair.clone());
            if system.tolerance_pair().is_some() {
                debug!(event = trace::PAIR, pair = %pair);
                self.results.push(ValidPair {
                    pair,
                    witnesses: system.into_witnesses(),
                });
            }
            if let Some(s) = sink.as_mut() {
                if !s.progress_changed((tested + 1) as f64 / total as f64) {
                    info!(event = trace::CANCEL);
                    self.results.clear();
                    return;
                }
            }
        }
    }

    /// Returns the valid pairs found so far.
    pub fn results(&self) -> &[ValidPair] {
        &self.results
    }

    /// Consumes the receiver and returns the valid pairs.
    pub fn into_results(self) -> Vec<ValidPair> {
        self.results
    }
}

/// Generates all partition pairs with k = 1..=min(|R|, |D|) subsets
/// (k = 1..=|R| in the propositional case), discarding any candidate with
/// an empty block.
fn generate_partition_pairs(
    conditionals: &[Conditional],
    constants: &[Const],
) -> Vec<TolerancePair> {
    let mut all = Vec::new();
    let max_parts = if constants.is_empty() {
        conditionals.len()
    } else {
        conditionals.len().min(constants.len())
    };

    for k in 1..=max_parts {
        let conditional_partitions = k_partitions(conditionals, k);
        if constants.is_empty() {
            for cond_blocks in &conditional_partitions {
                if let Some(pair) = build_pair(cond_blocks, None) {
                    all.push(pair);
                }
            }
        } else {
            let constant_partitions = k_partitions(constants, k);
            for cond_blocks in &conditional_partitions {
                for const_blocks in &constant_partitions {
                    if let Some(pair) = build_pair(cond_blocks, Some(const_blocks)) {
                        all.push(pair);
                    }
                }
            }
        }
    }
    all
}

/// Returns all ordered partitions of `items` into `k` (possibly empty)
/// blocks by enumerating the n-digit numbers in base k: digit j assigns
/// the j-th item to the block named by the digit value.
fn k_partitions<T: Clone>(items: &[T], k: usize) -> Vec<Vec<Vec<T>>> {
    let n = items.len();
    let count = k.pow(n as u32);
    let mut partitions = Vec::with_capacity(count);
    for number in 0..count {
        let mut blocks = vec![Vec::new(); k];
        for (j, item) in items.iter().enumerate() {
            let digit = number / k.pow(j as u32) % k;
            blocks[digit].push(item.clone());
        }
        partitions.push(blocks);
    }
    partitions
}

/// Combines a conditional partition and a constant partition into one
/// candidate, rejecting it when any block is empty.
fn build_pair(
    conditional_blocks: &[Vec<Conditional>],
    constant_blocks: Option<&Vec<Vec<Const>>>,
) -> Option<TolerancePair> {
    let k = conditional_blocks.len();
    let mut pair = TolerancePair::new(k);
    for i in 0..k {
        if conditional_blocks[i].is_empty() {
            return None;
        }
        pair.part_mut(i)
            .conditionals
            .extend(conditional_blocks[i].iter().cloned());
        if let Some(blocks) = constant_blocks {
            if blocks[i].is_empty() {
                return None;
            }
            pair.part_mut(i).constants.extend(blocks[i].iter().cloned());
        }
    }
    Some(pair)
}
