/*! Defines ranking functions: mappings from possible worlds to degrees of
implausibility, together with the derived ranks and acceptance relations
for formulae, conditionals and knowledge bases. */
use crate::explain::Explanation;
use crate::worlds::{PossibleWorld, WorldSet};
use itertools::Itertools;
use kappa_fol::grounding;
use kappa_fol::syntax::{Conditional, Const, Formula, KnowledgeBase};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Is the rank of a possible world: a non-negative integer, or infinity for
/// an impossible world. Rank 0 marks a most plausible world. Infinity is a
/// sentinel maximum value, so the derived ordering places it last.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Rank(u64);

impl Rank {
    /// Is the rank of a most plausible world.
    pub const ZERO: Rank = Rank(0);

    /// Is the rank of an impossible world.
    pub const INFINITY: Rank = Rank(u64::MAX);

    /// Returns a finite rank.
    pub fn finite(value: u64) -> Self {
        debug_assert!(value != u64::MAX, "finite rank overflowed into the sentinel");
        Rank(value)
    }

    /// Returns true if the receiver is the infinite rank.
    pub fn is_infinite(self) -> bool {
        self == Rank::INFINITY
    }

    /// Returns true if the receiver is rank 0.
    pub fn is_zero(self) -> bool {
        self == Rank::ZERO
    }

    /// Returns the finite value of the receiver, or `None` for infinity.
    pub fn value(self) -> Option<u64> {
        if self.is_infinite() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Is returned when a CSV rendering of a ranking function cannot be read
/// back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// The input has no header line.
    #[error("missing CSV header")]
    MissingHeader,

    /// The header columns do not match the interpretable atoms.
    #[error("CSV header does not match the interpretable atoms")]
    HeaderMismatch,

    /// A data row has the wrong number of columns.
    #[error("wrong number of columns in CSV line {line}")]
    WrongColumnCount {
        /// 1-based line number.
        line: usize,
    },

    /// A truth value column holds something other than `0` or `1`.
    #[error("invalid truth value in CSV line {line}")]
    BadTruthValue {
        /// 1-based line number.
        line: usize,
    },

    /// The rank column holds something other than a number or `inf`.
    #[error("invalid rank in CSV line {line}")]
    BadRank {
        /// 1-based line number.
        line: usize,
    },
}

/// Is a ranking function over a shared set of possible worlds. Each world
/// is mapped to a [`Rank`], initially 0. Ranks of formulae and
/// conditionals, and the acceptance relations, are derived from the world
/// ranks.
///
/// Every evaluation can grow an [`Explanation`] tree; pass
/// [`Explanation::Off`] to evaluate silently. The explanation never
/// influences a result.
#[derive(Clone, PartialEq, Debug)]
pub struct RankingFunction {
    worlds: Arc<WorldSet>,
    ranks: Vec<Rank>,
}

impl RankingFunction {
    /// Returns a ranking function mapping every world of `worlds` to 0.
    pub fn new(worlds: Arc<WorldSet>) -> Self {
        let ranks = vec![Rank::ZERO; worlds.len()];
        Self { worlds, ranks }
    }

    /// Returns the world set the receiver is defined on.
    pub fn worlds(&self) -> &WorldSet {
        &self.worlds
    }

    /// Returns the rank of the world at canonical position `index`.
    pub fn rank_at(&self, index: usize) -> Rank {
        self.ranks[index]
    }

    /// Sets the rank of the world at canonical position `index`.
    pub fn set_rank_at(&mut self, index: usize, rank: Rank) {
        self.ranks[index] = rank;
    }

    /// Returns the rank of `world`.
    pub fn rank_of(&self, world: &PossibleWorld) -> Rank {
        self.ranks[world.canonical_index()]
    }

    /// Sets the rank of `world`.
    pub fn set_rank(&mut self, world: &PossibleWorld, rank: Rank) {
        self.ranks[world.canonical_index()] = rank;
    }

    /// Returns the rank of a formula. For a ground formula this is the
    /// minimal rank of a world satisfying it, or infinity if there is none;
    /// for an open formula it is the minimal rank over all groundings.
    pub fn rank_formula(&self, formula: &Formula, exp: &mut Explanation) -> Rank {
        if formula.is_ground() {
            let mut min = Rank::INFINITY;
            let mut min_world = None;
            for (world, rank) in self.worlds.iter().zip(&self.ranks) {
                if *rank < min && world.satisfies(formula) {
                    min = *rank;
                    min_world = Some(world);
                }
            }
            if let Some(world) = min_world {
                exp.leaf(world.to_string());
            }
            exp.set_text(format!("k( {} ) = {}", formula, min));
            min
        } else {
            let mut min = Rank::INFINITY;
            for a in self.worlds.domain() {
                let fg = grounding::ground(formula, a);
                if fg.is_ground() {
                    let k = self.rank_formula(&fg, exp.child());
                    if k < min {
                        min = k;
                    }
                }
            }
            exp.set_text(format!("k( {} ) = {}", formula, min));
            min
        }
    }

    /// Returns the rank of a conditional `(B | A)`. For a ground
    /// conditional this is `κ(A ∧ B) − κ(A)`, or infinity when the
    /// verification is impossible; for an open conditional it is the
    /// minimal rank over all groundings.
    pub fn rank_conditional(&self, conditional: &Conditional, exp: &mut Explanation) -> Rank {
        if conditional.is_ground() {
            let v = self.verification_rank(conditional, exp.child());
            if v.is_infinite() {
                exp.set_text(format!("k{} = {}", conditional, v));
                return Rank::INFINITY;
            }
            let a = self.rank_formula(conditional.antecedent(), exp.child());
            // κ(A) ≤ κ(A ∧ B), so the difference is a finite rank
            let diff = Rank::finite(v.0 - a.0);
            exp.leaf(format!("k{} = {} - {} = {}", conditional, v, a, diff));
            exp.set_text(format!("k{} = {}", conditional, diff));
            diff
        } else {
            let mut min = Rank::INFINITY;
            for cg in grounding::conditional_groundings(conditional, self.worlds.domain()) {
                if cg.is_ground() {
                    let k = self.rank_conditional(&cg, exp.child());
                    if k < min {
                        min = k;
                    }
                }
            }
            exp.set_text(format!("k{} = {}", conditional, min));
            min
        }
    }

    /// Returns the rank of the verification formula `A ∧ B` of a
    /// conditional.
    pub fn verification_rank(&self, conditional: &Conditional, exp: &mut Explanation) -> Rank {
        self.rank_formula(&conditional.verification(), exp)
    }

    /// Returns the rank of the falsification formula `A ∧ ¬B` of a
    /// conditional.
    pub fn falsification_rank(&self, conditional: &Conditional, exp: &mut Explanation) -> Rank {
        self.rank_formula(&conditional.falsification(), exp)
    }

    /// Decides whether a formula is accepted. A ground formula is accepted
    /// if it holds in every world of rank 0; an open formula is accepted if
    /// the conditional fact `(F | ⊤)` is.
    pub fn accepts_formula(&self, formula: &Formula, exp: &mut Explanation) -> bool {
        if formula.is_ground() {
            let mut plausible = 0;
            for (world, rank) in self.worlds.iter().zip(&self.ranks) {
                if rank.is_zero() {
                    if !world.satisfies(formula) {
                        exp.leaf(format!("{} does not hold in a world with k = 0", formula));
                        exp.leaf(world.to_string());
                        exp.set_text(format!("k |= {} -> false", formula));
                        return false;
                    }
                    plausible += 1;
                }
            }
            exp.leaf(format!(
                "{} holds in all {} worlds with k = 0",
                formula, plausible
            ));
            exp.set_text(format!("k |= {} -> true", formula));
            true
        } else {
            let fact = Conditional::fact(formula.clone());
            let accepted = self.accepts_conditional(&fact, exp.child());
            exp.set_text(format!("k |= {} -> {}", formula, accepted));
            accepted
        }
    }

    /// Decides whether a conditional is accepted. A ground conditional is
    /// accepted if its verification has a strictly lower rank than its
    /// falsification. An open conditional is accepted if it has at least
    /// one representative and either (Acc-1) the open verification rank is
    /// below the open falsification rank, or (Acc-2) the two are equal and
    /// every representative instantiation of the negated conditional's
    /// verification ranks strictly below every instantiation of the
    /// receiver's verification with representatives of the negated
    /// conditional.
    pub fn accepts_conditional(&self, conditional: &Conditional, exp: &mut Explanation) -> bool {
        if conditional.is_ground() {
            let v = self.verification_rank(conditional, exp.child());
            let f = self.falsification_rank(conditional, exp.child());
            let accepted = v < f;
            exp.leaf(format!("{} < {} ?", v, f));
            exp.set_text(format!("k |= {} -> {}", conditional, accepted));
            accepted
        } else {
            let rep = self.representatives(conditional, exp.child());
            if rep.is_empty() {
                exp.leaf(format!("Rep{} is empty", conditional));
                exp.set_text(format!("k |= {} -> false", conditional));
                return false;
            }

            let first = exp.child();
            first.set_text("Acc-1");
            let v = self.verification_rank(conditional, first.child());
            let f = self.falsification_rank(conditional, first.child());
            if v < f {
                first.leaf(format!("{} < {}", v, f));
                first.set_text("Acc-1 -> true");
                exp.set_text(format!("k |= {} -> true", conditional));
                return true;
            }
            if v > f {
                first.leaf(format!("{} > {}", v, f));
                first.set_text("Acc-1 -> false");
                exp.set_text(format!("k |= {} -> false", conditional));
                return false;
            }
            first.leaf(format!("not {} < {}", v, f));
            first.set_text("Acc-1 -> false");

            let second = exp.child();
            second.set_text("Acc-2");
            second.leaf(format!("{} = {}", v, f));
            let negated = conditional.negated();
            let negated_over_rep = grounding::conditional_groundings(&negated, &rep);
            let negated_rep = self.representatives(&negated, second.child());
            let receiver_over_negated_rep =
                grounding::conditional_groundings(conditional, &negated_rep);
            for falsifying in &negated_over_rep {
                for verifying in &receiver_over_negated_rep {
                    let pair_exp = second.child();
                    let f_rank = self.verification_rank(falsifying, pair_exp.child());
                    let v_rank = self.verification_rank(verifying, pair_exp.child());
                    if f_rank >= v_rank {
                        pair_exp.set_text(format!(
                            "not k{} = {} < k{} = {}",
                            falsifying, f_rank, verifying, v_rank
                        ));
                        second.set_text("Acc-2 -> false");
                        exp.set_text(format!("k |= {} -> false", conditional));
                        return false;
                    }
                    pair_exp.set_text(format!(
                        "k{} = {} < k{} = {}",
                        falsifying, f_rank, verifying, v_rank
                    ));
                }
            }
            second.set_text("Acc-2 -> true");
            exp.set_text(format!("k |= {} -> true", conditional));
            true
        }
    }

    /// Decides whether a knowledge base is accepted: every world falsifying
    /// some fact is ranked infinite, and every conditional is accepted.
    pub fn accepts_kb(&self, kb: &KnowledgeBase) -> bool {
        for (world, rank) in self.worlds.iter().zip(&self.ranks) {
            if !rank.is_infinite() && !world.satisfies_all(kb.facts()) {
                return false;
            }
        }
        kb.conditionals()
            .iter()
            .all(|c| self.accepts_conditional(c, &mut Explanation::Off))
    }

    /// Returns the representatives of an open conditional: all weak
    /// representatives if there is at most one, otherwise those weak
    /// representatives whose grounded falsification rank is minimal.
    pub fn representatives(&self, conditional: &Conditional, exp: &mut Explanation) -> Vec<Const> {
        let weak = self.weak_representatives(conditional, exp.child());
        if weak.len() <= 1 {
            exp.set_text(format!(
                "Rep{} = [{}]",
                conditional,
                weak.iter().join(", ")
            ));
            return weak;
        }

        let min_exp = exp.child();
        let mut rep: Vec<Const> = Vec::new();
        let mut min_falsification = Rank::INFINITY;
        for a in &weak {
            let cg = grounding::ground_conditional(conditional, a);
            let f_rank = self.falsification_rank(&cg, min_exp.child());
            if f_rank < min_falsification {
                rep.clear();
                rep.push(a.clone());
                min_falsification = f_rank;
            } else if f_rank == min_falsification {
                rep.push(a.clone());
            }
        }
        min_exp.set_text(format!(
            "weak representatives with minimal falsification rank: [{}]",
            rep.iter().join(", ")
        ));
        exp.set_text(format!("Rep{} = [{}]", conditional, rep.iter().join(", ")));
        rep
    }

    /// Returns the weak representatives of an open conditional: the
    /// constants whose grounding realizes the open verification rank and
    /// whose grounded conditional is accepted.
    pub fn weak_representatives(
        &self,
        conditional: &Conditional,
        exp: &mut Explanation,
    ) -> Vec<Const> {
        let mut weak = Vec::new();
        let v_open = self.rank_formula(&conditional.verification(), exp.child());

        for a in self.worlds.domain() {
            let a_exp = exp.child();
            let cg = grounding::ground_conditional(conditional, a);
            let v_ground = self.verification_rank(&cg, a_exp.child());
            if v_open != v_ground {
                a_exp.leaf(format!("not {} = {}", v_open, v_ground));
                a_exp.set_text(format!("{} -> false", a));
                continue;
            }
            a_exp.leaf(format!("{} = {}", v_open, v_ground));
            let f_ground = self.falsification_rank(&cg, a_exp.child());
            if v_ground < f_ground {
                a_exp.leaf(format!("{} < {}", v_ground, f_ground));
                a_exp.set_text(format!("{} -> true", a));
                weak.push(a.clone());
            } else {
                a_exp.leaf(format!("not {} < {}", v_ground, f_ground));
                a_exp.set_text(format!("{} -> false", a));
            }
        }
        exp.set_text(format!(
            "WRep{} = [{}]",
            conditional,
            weak.iter().join(", ")
        ));
        weak
    }

    /// Returns the textual representation of the receiver with worlds
    /// sorted by rank, omitting impossible worlds.
    pub fn to_string_sorted(&self) -> String {
        self.worlds
            .iter()
            .zip(&self.ranks)
            .filter(|(_, rank)| !rank.is_infinite())
            .sorted_by_key(|(_, rank)| **rank)
            .map(|(world, rank)| format!("k{} = {}", world, rank))
            .join("\n")
    }

    /// Renders the receiver as CSV: one column per interpretable atom in
    /// canonical order and a final `k` column, `inf` for infinity.
    pub fn to_csv(&self) -> String {
        let atoms = self.worlds.space().atoms();
        let mut out = String::new();
        for atom in atoms {
            out.push_str(&atom.to_string());
            out.push(';');
        }
        out.push_str("k\n");
        for (world, rank) in self.worlds.iter().zip(&self.ranks) {
            for atom in atoms {
                out.push_str(if world.value(atom) { "1;" } else { "0;" });
            }
            out.push_str(&rank.to_string());
            out.push('\n');
        }
        out
    }

    /// Reads a CSV rendering back onto the given world set, restoring the
    /// world-to-rank mapping.
    pub fn from_csv(text: &str, worlds: Arc<WorldSet>) -> Result<RankingFunction, CsvError> {
        let n = worlds.space().len();
        let mut lines = text.lines().enumerate();

        let (_, header) = lines.next().ok_or(CsvError::MissingHeader)?;
        let expected = worlds
            .space()
            .atoms()
            .iter()
            .map(|a| a.to_string())
            .chain(std::iter::once("k".to_string()))
            .collect_vec();
        let found = header.split(';').map(str::trim).collect_vec();
        if found != expected.iter().map(String::as_str).collect_vec() {
            return Err(CsvError::HeaderMismatch);
        }

        let mut kappa = RankingFunction::new(worlds);
        for (lineno, line) in lines {
            let line_number = lineno + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields = line.split(';').map(str::trim).collect_vec();
            if fields.len() != n + 1 {
                return Err(CsvError::WrongColumnCount { line: line_number });
            }
            let mut index = 0usize;
            for (j, field) in fields[..n].iter().enumerate() {
                match *field {
                    "0" => {}
                    "1" => index |= 1 << (n - 1 - j),
                    _ => return Err(CsvError::BadTruthValue { line: line_number }),
                }
            }
            let rank = if fields[n] == "inf" {
                Rank::INFINITY
            } else {
                fields[n]
                    .parse::<u64>()
                    .map(Rank::finite)
                    .map_err(|_| CsvError::BadRank { line: line_number })?
            };
            kappa.set_rank_at(index, rank);
        }
        Ok(kappa)
    }
}

impl fmt::Display for RankingFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        for (world, rank) in self.worlds.iter().zip(&self.ranks) {
            writeln!(f, "k{} = {}", world, rank)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worlds::{create_possible_worlds, DEFAULT_ATOM_LIMIT};
    use kappa_fol::parser::{parse_formula, parse_knowledge_base};
    use kappa_fol::syntax::{Formula, Sig};

    fn small_sig() -> Sig {
        let text = r#"
signature

D={t,p}
B(D)

conditionals

Conditionals{
  (B(X) | true)
}
Facts{
  (B(p))
}
"#;
        parse_knowledge_base(text).unwrap().0
    }

    fn zero_ranking(sig: &Sig) -> RankingFunction {
        let worlds = create_possible_worlds(
            sig.ground_atoms(),
            sig.domain().to_vec(),
            DEFAULT_ATOM_LIMIT,
        )
        .unwrap();
        RankingFunction::new(Arc::new(worlds))
    }

    #[test]
    fn formula_rank_is_minimum_over_satisfying_worlds() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        // worlds over B(t), B(p): indices 00, 01, 10, 11
        kappa.set_rank_at(0, Rank::finite(2));
        kappa.set_rank_at(1, Rank::finite(1));
        kappa.set_rank_at(2, Rank::finite(3));
        kappa.set_rank_at(3, Rank::ZERO);

        let b_t = parse_formula("B(t)", &sig).unwrap();
        let b_p = parse_formula("B(p)", &sig).unwrap();
        let none = parse_formula("B(t) && !B(t)", &sig).unwrap();

        assert_eq!(
            Rank::ZERO,
            kappa.rank_formula(&b_t, &mut Explanation::Off)
        );
        assert_eq!(Rank::ZERO, kappa.rank_formula(&b_p, &mut Explanation::Off));
        assert_eq!(
            Rank::INFINITY,
            kappa.rank_formula(&none, &mut Explanation::Off)
        );
    }

    #[test]
    fn open_formula_rank_is_minimum_over_groundings() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::finite(5)); // B(t)=0 B(p)=0
        kappa.set_rank_at(1, Rank::finite(4)); // B(t)=0 B(p)=1
        kappa.set_rank_at(2, Rank::finite(3)); // B(t)=1 B(p)=0
        kappa.set_rank_at(3, Rank::finite(6)); // B(t)=1 B(p)=1

        let open = parse_formula("B(Y)", &sig).unwrap();
        // min(κ(B(t)), κ(B(p))) = min(3, 4)
        assert_eq!(
            Rank::finite(3),
            kappa.rank_formula(&open, &mut Explanation::Off)
        );
    }

    #[test]
    fn formula_acceptance_checks_rank_zero_worlds() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::finite(1));
        kappa.set_rank_at(1, Rank::ZERO);
        kappa.set_rank_at(2, Rank::finite(1));
        kappa.set_rank_at(3, Rank::ZERO);

        // both rank-0 worlds have B(p)=1
        let b_p = parse_formula("B(p)", &sig).unwrap();
        assert!(kappa.accepts_formula(&b_p, &mut Explanation::Off));

        // but only one has B(t)=1
        let b_t = parse_formula("B(t)", &sig).unwrap();
        assert!(!kappa.accepts_formula(&b_t, &mut Explanation::Off));
    }

    #[test]
    fn closed_formula_complement() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::finite(1));
        kappa.set_rank_at(3, Rank::finite(2));

        for f in ["B(t)", "B(t) || B(p)", "\\forall X: B(X)"] {
            let formula = parse_formula(f, &sig).unwrap();
            let negation = Formula::not(formula.clone());
            for world in kappa.worlds().worlds() {
                assert_eq!(world.satisfies(&formula), !world.satisfies(&negation));
            }
        }
    }

    #[test]
    fn explanation_does_not_change_results() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::finite(2));
        kappa.set_rank_at(1, Rank::ZERO);
        kappa.set_rank_at(2, Rank::INFINITY);
        kappa.set_rank_at(3, Rank::finite(1));

        let open = parse_formula("B(Y)", &sig).unwrap();
        let mut exp = Explanation::root();
        let with_tree = kappa.rank_formula(&open, &mut exp);
        let without = kappa.rank_formula(&open, &mut Explanation::Off);
        assert_eq!(without, with_tree);
        assert!(exp.text().contains("k( B(Y) )"));
        assert!(!exp.children().is_empty());
    }

    #[test]
    fn csv_round_trip() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::INFINITY);
        kappa.set_rank_at(1, Rank::finite(2));
        kappa.set_rank_at(2, Rank::ZERO);
        kappa.set_rank_at(3, Rank::finite(7));

        let csv = kappa.to_csv();
        assert!(csv.starts_with("B(t);B(p);k\n"));
        let restored =
            RankingFunction::from_csv(&csv, Arc::new(crate::worlds::create_possible_worlds(
                sig.ground_atoms(),
                sig.domain().to_vec(),
                DEFAULT_ATOM_LIMIT,
            )
            .unwrap()))
            .unwrap();
        for i in 0..4 {
            assert_eq!(kappa.rank_at(i), restored.rank_at(i));
        }
    }

    #[test]
    fn csv_header_is_checked() {
        let sig = small_sig();
        let kappa = zero_ranking(&sig);
        let mut csv = kappa.to_csv();
        csv = csv.replacen("B(t)", "B(q)", 1);
        let worlds = Arc::new(
            create_possible_worlds(sig.ground_atoms(), sig.domain().to_vec(), DEFAULT_ATOM_LIMIT)
                .unwrap(),
        );
        assert_eq!(
            Err(CsvError::HeaderMismatch),
            RankingFunction::from_csv(&csv, worlds).map(|_| ())
        );
    }

    #[test]
    fn sorted_listing_omits_impossible_worlds() {
        let sig = small_sig();
        let mut kappa = zero_ranking(&sig);
        kappa.set_rank_at(0, Rank::INFINITY);
        kappa.set_rank_at(1, Rank::finite(1));
        kappa.set_rank_at(2, Rank::ZERO);
        kappa.set_rank_at(3, Rank::finite(1));

        let listing = kappa.to_string_sorted();
        assert!(!listing.contains("inf"));
        let first = listing.lines().next().unwrap();
        assert!(first.ends_with("= 0"));
    }
}
