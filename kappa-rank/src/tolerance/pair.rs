/*! Defines the tolerance-pair data structure: an ordered sequence of
paired subsets of conditionals and constants. */
use itertools::Itertools;
use kappa_fol::syntax::{Conditional, Const};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Is one tuple `(Rᵢ, Dᵢ)` of a partition pair: a subset of the
/// conditionals and a subset of the domain.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Subset {
    /// The conditionals of this subset.
    pub conditionals: BTreeSet<Conditional>,

    /// The constants of this subset.
    pub constants: BTreeSet<Const>,
}

/// Is a partition pair: an ordered sequence of [`Subset`]s whose
/// conditional parts partition the conditionals of a knowledge base and
/// whose constant parts partition the domain (all constant parts are empty
/// in the propositional case). The structure itself does not check the
/// tolerance condition; that is the validator's concern
/// ([`crate::systemz::SystemZ::check_tolerance`]), which is why a value of
/// this type is just a candidate until validated.
///
/// Equality and hashing are structural, subset by subset, which makes the
/// type usable as a visited-set entry during search. The minimality order
/// is *not* [`Ord`]: two structurally different pairs may compare as equal
/// under [`TolerancePair::order`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TolerancePair {
    parts: Vec<Subset>,
}

impl TolerancePair {
    /// Returns a pair with `n_parts` empty subsets.
    pub fn new(n_parts: usize) -> Self {
        Self {
            parts: vec![Subset::default(); n_parts],
        }
    }

    /// Returns the number of subsets (`m + 1`).
    pub fn n_parts(&self) -> usize {
        self.parts.len()
    }

    /// Returns subset `i`.
    pub fn part(&self, i: usize) -> &Subset {
        &self.parts[i]
    }

    /// Returns subset `i` mutably.
    pub fn part_mut(&mut self, i: usize) -> &mut Subset {
        &mut self.parts[i]
    }

    /// Returns the conditionals of subset `i`.
    pub fn conditional_part(&self, i: usize) -> &BTreeSet<Conditional> {
        &self.parts[i].conditionals
    }

    /// Returns the constants of subset `i`.
    pub fn constant_part(&self, i: usize) -> &BTreeSet<Const> {
        &self.parts[i].constants
    }

    /// Returns a copy of the receiver with an additional empty trailing
    /// subset.
    pub fn extend(&self) -> TolerancePair {
        let mut parts = self.parts.clone();
        parts.push(Subset::default());
        Self { parts }
    }

    /// Compares two pairs. A pair is smaller if it has fewer subsets, or,
    /// at equal subset counts, if at the first differing position it has
    /// more conditionals, or more constants, in the earlier subset.
    pub fn order(&self, other: &Self) -> Ordering {
        self.order_up_to(other, self.parts.len())
    }

    /// Compares two pairs like [`TolerancePair::order`], but ignores the
    /// trailing subset. Used while a pair is still being built.
    pub fn order_partial(&self, other: &Self) -> Ordering {
        self.order_up_to(other, self.parts.len().saturating_sub(1))
    }

    fn order_up_to(&self, other: &Self, parts: usize) -> Ordering {
        let by_len = self.parts.len().cmp(&other.parts.len());
        if by_len != Ordering::Equal {
            return by_len;
        }
        for i in 0..parts {
            // larger earlier subsets order first
            let by_conditionals = other.parts[i]
                .conditionals
                .len()
                .cmp(&self.parts[i].conditionals.len());
            if by_conditionals != Ordering::Equal {
                return by_conditionals;
            }
            let by_constants = other.parts[i]
                .constants
                .len()
                .cmp(&self.parts[i].constants.len());
            if by_constants != Ordering::Equal {
                return by_constants;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for TolerancePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        for (i, part) in self.parts.iter().enumerate() {
            writeln!(
                f,
                "{} --- [{}] --- [{}]",
                i,
                part.conditionals.iter().map(|c| c.to_string()).join(", "),
                part.constants.iter().map(|c| c.to_string()).join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_fol::syntax::{Atom, Formula, Pred};

    fn cond(name: &str) -> Conditional {
        Conditional::fact(Formula::from(Atom::nullary(Pred::from(name))))
    }

    fn pair(layout: &[(&[&str], &[&str])]) -> TolerancePair {
        let mut p = TolerancePair::new(layout.len());
        for (i, (conds, consts)) in layout.iter().enumerate() {
            for c in *conds {
                p.part_mut(i).conditionals.insert(cond(c));
            }
            for a in *consts {
                p.part_mut(i).constants.insert(Const::from(*a));
            }
        }
        p
    }

    #[test]
    fn fewer_subsets_order_first() {
        let one = pair(&[(&["a", "b"], &["t", "p"])]);
        let two = pair(&[(&["a"], &["t"]), (&["b"], &["p"])]);
        assert_eq!(Ordering::Less, one.order(&two));
        assert_eq!(Ordering::Greater, two.order(&one));
    }

    #[test]
    fn more_conditionals_in_early_subsets_order_first() {
        let heavy = pair(&[(&["a", "b"], &["t"]), (&["c"], &["p"])]);
        let light = pair(&[(&["a"], &["t"]), (&["b", "c"], &["p"])]);
        assert_eq!(Ordering::Less, heavy.order(&light));
    }

    #[test]
    fn order_can_equal_without_structural_equality() {
        let left = pair(&[(&["a"], &["t"]), (&["b"], &["p"])]);
        let right = pair(&[(&["b"], &["t"]), (&["a"], &["p"])]);
        assert_eq!(Ordering::Equal, left.order(&right));
        assert_ne!(left, right);
    }

    #[test]
    fn partial_order_ignores_the_trailing_subset() {
        let finished = pair(&[(&["a", "b"], &["t", "p"]), (&["c"], &["q"])]);
        let partial = pair(&[(&["a"], &["t"]), (&[], &[])]);
        // the trailing subsets differ wildly, but only the first counts
        assert_eq!(Ordering::Less, finished.order_partial(&partial));
    }

    #[test]
    fn extend_appends_an_empty_subset() {
        let p = pair(&[(&["a"], &["t"])]);
        let q = p.extend();
        assert_eq!(2, q.n_parts());
        assert!(q.conditional_part(1).is_empty());
        assert!(q.constant_part(1).is_empty());
        // the receiver is untouched
        assert_eq!(1, p.n_parts());
    }
}
