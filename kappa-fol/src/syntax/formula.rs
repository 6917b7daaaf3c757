/*! Defines the syntax of formulae over relational atoms, from atoms and
literals up to quantified formulae. */
use super::{Pred, Term, Var};
use itertools::Itertools;
use std::fmt;

/// Represents an atomic formula, obtained by applying a predicate on a list
/// of terms. The list is empty for a nullary predicate and holds exactly one
/// term for a monadic predicate.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Atom {
    /// Is the predicate that is applied on the terms of this atom.
    pub predicate: Pred,

    /// Is the list of terms on which the predicate is applied.
    pub terms: Vec<Term>,
}

impl Atom {
    /// Returns a nullary atom for `predicate`.
    pub fn nullary(predicate: Pred) -> Self {
        Self {
            predicate,
            terms: Vec::new(),
        }
    }

    /// Returns a monadic atom, applying `predicate` on `term`.
    pub fn monadic(predicate: Pred, term: Term) -> Self {
        Self {
            predicate,
            terms: vec![term],
        }
    }

    /// Returns the variable symbols appearing in the receiver.
    pub fn vars(&self) -> Vec<&Var> {
        self.terms.iter().filter_map(Term::var).collect()
    }

    /// Returns true if the receiver contains no variable.
    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_const)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.terms.is_empty() {
            write!(f, "{}", self.predicate)
        } else {
            let ts = self.terms.iter().map(|t| t.to_string()).collect_vec();
            write!(f, "{}({})", self.predicate, ts.join(", "))
        }
    }
}

/// Represents a literal: an atom or a negated atom.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Literal {
    /// Is the atom of this literal.
    pub atom: Atom,

    /// Is true if the atom appears negated.
    pub negated: bool,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.negated {
            write!(f, "¬{}", self.atom)
        } else {
            write!(f, "{}", self.atom)
        }
    }
}

/// Represents a conjunction of literals.
///
/// **Note**: Conjoining two literal formulae yields an instance of this type
/// rather than a nested [`And`]. The literal list is owned; conjunction
/// always allocates a fresh list, so derived formulae never share storage
/// with the formulae they were built from.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ElementaryConjunction {
    literals: Vec<Literal>,
}

impl ElementaryConjunction {
    /// Returns an elementary conjunction over the given literals.
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// Returns the literals of the receiver.
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }
}

impl fmt::Display for ElementaryConjunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let ls = self.literals.iter().map(|l| l.to_string()).collect_vec();
        write!(f, "{}", ls.join(" ∧ "))
    }
}

/// Represents the negation of a formula.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Not {
    /// Is the negated formula.
    pub formula: Formula,
}

/// Represents the conjunction of two formulae.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct And {
    /// Is the formula on left of this conjunction.
    pub left: Formula,

    /// Is the formula on right of this conjunction.
    pub right: Formula,
}

/// Represents the disjunction of two formulae.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Or {
    /// Is the formula on left of this disjunction.
    pub left: Formula,

    /// Is the formula on right of this disjunction.
    pub right: Formula,
}

/// Represents an implication between two formulae.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Implies {
    /// Is the premise (formula) of this implication.
    pub premise: Formula,

    /// Is the consequence (formula) of this implication.
    pub consequence: Formula,
}

/// Represents an existentially quantified formula.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Exists {
    /// Is the variable bound by this quantifier.
    pub variable: Var,

    /// Is the scope (formula) of the quantified formula.
    pub formula: Formula,
}

/// Represents a universally quantified formula.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Forall {
    /// Is the variable bound by this quantifier.
    pub variable: Var,

    /// Is the scope (formula) of the quantified formula.
    pub formula: Formula,
}

/// Is an abstract syntax tree (AST) for formulae of the restricted language.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Formula {
    /// Is logical top (⊤) or truth.
    Top,

    /// Is logical bottom (⟘) or falsehood.
    Bottom,

    /// Is an atomic formula, wrapping an [`Atom`].
    Atom(Atom),

    /// Is a literal, wrapping a [`Literal`].
    Literal(Literal),

    /// Is a conjunction of literals, wrapping an [`ElementaryConjunction`].
    Elementary(ElementaryConjunction),

    /// Is the negation of a formula, wrapping a [`Not`].
    Not(Box<Not>),

    /// Is a conjunction of two formulae, wrapping an [`And`].
    And(Box<And>),

    /// Is a disjunction of two formulae, wrapping an [`Or`].
    Or(Box<Or>),

    /// Is an implication between two formulae, wrapping an [`Implies`].
    Implies(Box<Implies>),

    /// Is an existentially quantified formula, wrapping an [`Exists`].
    Exists(Box<Exists>),

    /// Is a universally quantified formula, wrapping a [`Forall`].
    Forall(Box<Forall>),
}

impl From<Atom> for Formula {
    fn from(value: Atom) -> Self {
        Self::Atom(value)
    }
}

impl From<Literal> for Formula {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<ElementaryConjunction> for Formula {
    fn from(value: ElementaryConjunction) -> Self {
        Self::Elementary(value)
    }
}

impl From<Not> for Formula {
    fn from(value: Not) -> Self {
        Self::Not(Box::new(value))
    }
}

impl From<And> for Formula {
    fn from(value: And) -> Self {
        Self::And(Box::new(value))
    }
}

impl From<Or> for Formula {
    fn from(value: Or) -> Self {
        Self::Or(Box::new(value))
    }
}

impl From<Implies> for Formula {
    fn from(value: Implies) -> Self {
        Self::Implies(Box::new(value))
    }
}

impl From<Exists> for Formula {
    fn from(value: Exists) -> Self {
        Self::Exists(Box::new(value))
    }
}

impl From<Forall> for Formula {
    fn from(value: Forall) -> Self {
        Self::Forall(Box::new(value))
    }
}

impl Formula {
    /// Returns the negation of `formula`. Negating an atom or a literal
    /// yields a literal (or an atom, when a negation cancels out); any other
    /// formula is wrapped in a [`Not`].
    #[allow(clippy::should_implement_trait)]
    // Disallow `formula.not()` intentionally:
    pub fn not(formula: Self) -> Self {
        match formula {
            Formula::Atom(atom) => Literal {
                atom,
                negated: true,
            }
            .into(),
            Formula::Literal(l) => {
                if l.negated {
                    Formula::Atom(l.atom)
                } else {
                    Literal {
                        atom: l.atom,
                        negated: true,
                    }
                    .into()
                }
            }
            other => Not { formula: other }.into(),
        }
    }

    /// Returns an existentially quantified formula binding `variable` in
    /// `formula`.
    pub fn exists(variable: Var, formula: Self) -> Self {
        Exists { variable, formula }.into()
    }

    /// Returns a universally quantified formula binding `variable` in
    /// `formula`.
    pub fn forall(variable: Var, formula: Self) -> Self {
        Forall { variable, formula }.into()
    }

    /// Returns a conjunction of the receiver and `formula`. When both
    /// operands consist of literals, the result is an
    /// [`ElementaryConjunction`] over a freshly allocated literal list.
    pub fn and(self, formula: Self) -> Self {
        if self.is_elementary() && formula.is_elementary() {
            let mut literals = self.into_literals();
            literals.extend(formula.into_literals());
            ElementaryConjunction::new(literals).into()
        } else {
            And {
                left: self,
                right: formula,
            }
            .into()
        }
    }

    /// Returns a disjunction of the receiver and `formula`.
    pub fn or(self, formula: Self) -> Self {
        Or {
            left: self,
            right: formula,
        }
        .into()
    }

    /// Returns an implication between the receiver and `formula`.
    pub fn implies(self, formula: Self) -> Self {
        Implies {
            premise: self,
            consequence: formula,
        }
        .into()
    }

    fn is_elementary(&self) -> bool {
        matches!(
            self,
            Formula::Atom(_) | Formula::Literal(_) | Formula::Elementary(_)
        )
    }

    fn into_literals(self) -> Vec<Literal> {
        match self {
            Formula::Atom(atom) => vec![Literal {
                atom,
                negated: false,
            }],
            Formula::Literal(l) => vec![l],
            Formula::Elementary(ec) => ec.literals,
            _ => unreachable!("only literal formulae can be turned into literal lists"),
        }
    }

    /// Returns all atoms appearing in the receiver, in order of appearance
    /// and without duplicates.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut atoms = Vec::new();
        self.collect_atoms(&mut atoms);
        atoms.into_iter().unique().collect()
    }

    fn collect_atoms<'a>(&'a self, atoms: &mut Vec<&'a Atom>) {
        match self {
            Formula::Top | Formula::Bottom => {}
            Formula::Atom(a) => atoms.push(a),
            Formula::Literal(l) => atoms.push(&l.atom),
            Formula::Elementary(ec) => atoms.extend(ec.literals().iter().map(|l| &l.atom)),
            Formula::Not(n) => n.formula.collect_atoms(atoms),
            Formula::And(a) => {
                a.left.collect_atoms(atoms);
                a.right.collect_atoms(atoms);
            }
            Formula::Or(o) => {
                o.left.collect_atoms(atoms);
                o.right.collect_atoms(atoms);
            }
            Formula::Implies(i) => {
                i.premise.collect_atoms(atoms);
                i.consequence.collect_atoms(atoms);
            }
            Formula::Exists(q) => q.formula.collect_atoms(atoms),
            Formula::Forall(q) => q.formula.collect_atoms(atoms),
        }
    }

    /// Returns the list of free variable symbols in the receiver.
    ///
    /// **Note**: Each variable symbol appears only once in the list, even if
    /// it is present at multiple positions of the receiver.
    pub fn free_vars(&self) -> Vec<&Var> {
        match self {
            Formula::Top | Formula::Bottom => Vec::new(),
            Formula::Atom(a) => a.vars().into_iter().unique().collect(),
            Formula::Literal(l) => l.atom.vars().into_iter().unique().collect(),
            Formula::Elementary(ec) => ec
                .literals()
                .iter()
                .flat_map(|l| l.atom.vars())
                .unique()
                .collect(),
            Formula::Not(n) => n.formula.free_vars(),
            Formula::And(a) => a
                .left
                .free_vars()
                .into_iter()
                .chain(a.right.free_vars())
                .unique()
                .collect(),
            Formula::Or(o) => o
                .left
                .free_vars()
                .into_iter()
                .chain(o.right.free_vars())
                .unique()
                .collect(),
            Formula::Implies(i) => i
                .premise
                .free_vars()
                .into_iter()
                .chain(i.consequence.free_vars())
                .unique()
                .collect(),
            Formula::Exists(q) => q
                .formula
                .free_vars()
                .into_iter()
                .filter(|v| **v != q.variable)
                .collect(),
            Formula::Forall(q) => q
                .formula
                .free_vars()
                .into_iter()
                .filter(|v| **v != q.variable)
                .collect(),
        }
    }

    /// Returns true if the receiver has no free variable.
    pub fn is_ground(&self) -> bool {
        self.free_vars().is_empty()
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Formula::And(_)
            | Formula::Or(_)
            | Formula::Implies(_)
            | Formula::Elementary(_)
            | Formula::Exists(_)
            | Formula::Forall(_) => write!(f, "({})", self),
            _ => write!(f, "{}", self),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Formula::Top => write!(f, "⊤"),
            Formula::Bottom => write!(f, "⟘"),
            Formula::Atom(a) => write!(f, "{}", a),
            Formula::Literal(l) => write!(f, "{}", l),
            Formula::Elementary(ec) => write!(f, "{}", ec),
            Formula::Not(n) => {
                write!(f, "¬")?;
                n.formula.fmt_operand(f)
            }
            Formula::And(a) => {
                a.left.fmt_operand(f)?;
                write!(f, " ∧ ")?;
                a.right.fmt_operand(f)
            }
            Formula::Or(o) => {
                o.left.fmt_operand(f)?;
                write!(f, " ∨ ")?;
                o.right.fmt_operand(f)
            }
            Formula::Implies(i) => {
                i.premise.fmt_operand(f)?;
                write!(f, " → ")?;
                i.consequence.fmt_operand(f)
            }
            Formula::Exists(q) => {
                write!(f, "∃ {}. ", q.variable)?;
                q.formula.fmt_operand(f)
            }
            Formula::Forall(q) => {
                write!(f, "∀ {}. ", q.variable)?;
                q.formula.fmt_operand(f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Const;
    use super::*;

    fn b_of(t: Term) -> Formula {
        Atom::monadic(Pred::from("B"), t).into()
    }

    fn x() -> Term {
        Var::from("X").into()
    }

    fn t() -> Term {
        Const::from("t").into()
    }

    #[test]
    fn atom_to_string() {
        assert_eq!("B(X)", b_of(x()).to_string());
        assert_eq!("Q", Formula::from(Atom::nullary(Pred::from("Q"))).to_string());
    }

    #[test]
    fn negation_of_atom_is_literal() {
        let f = Formula::not(b_of(t()));
        assert_eq!("¬B(t)", f.to_string());
        assert!(matches!(f, Formula::Literal(_)));

        // negation cancels out on literals
        let g = Formula::not(f);
        assert_eq!(b_of(t()), g);
    }

    #[test]
    fn conjunction_of_literals_is_elementary() {
        let f = b_of(t()).and(Formula::not(b_of(x())));
        assert!(matches!(f, Formula::Elementary(_)));
        assert_eq!("B(t) ∧ ¬B(X)", f.to_string());
    }

    #[test]
    fn conjunction_does_not_share_literals() {
        let ec: Formula = ElementaryConjunction::new(vec![Literal {
            atom: Atom::monadic(Pred::from("B"), t()),
            negated: false,
        }])
        .into();
        let extended = ec.clone().and(Formula::not(b_of(x())));
        // the original conjunction is unchanged
        assert_eq!("B(t)", ec.to_string());
        assert_eq!("B(t) ∧ ¬B(X)", extended.to_string());
    }

    #[test]
    fn free_vars_of_quantified_formula() {
        let open = b_of(x());
        assert_eq!(vec![&Var::from("X")], open.free_vars());

        let closed = Formula::forall(Var::from("X"), b_of(x()));
        assert!(closed.free_vars().is_empty());
        assert!(closed.is_ground());
    }

    #[test]
    fn atoms_are_unique_and_ordered() {
        let f = b_of(t()).and(b_of(x())).and(b_of(t()));
        let atoms = f.atoms();
        assert_eq!(2, atoms.len());
        assert_eq!("B(t)", atoms[0].to_string());
        assert_eq!("B(X)", atoms[1].to_string());
    }
}
