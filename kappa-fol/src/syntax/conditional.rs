/*! Defines defeasible conditionals `(B | A)` and knowledge bases. */
use super::{Atom, Formula, Var};
use itertools::Itertools;
use std::fmt;

/// Represents a defeasible conditional `(B | A)`: "if A holds, then
/// typically B".
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Conditional {
    antecedent: Formula,
    consequent: Formula,
}

impl Conditional {
    /// Returns the conditional `(consequent | antecedent)`.
    pub fn new(antecedent: Formula, consequent: Formula) -> Self {
        Self {
            antecedent,
            consequent,
        }
    }

    /// Returns the conditional fact `(formula | ⊤)`.
    pub fn fact(consequent: Formula) -> Self {
        Self {
            antecedent: Formula::Top,
            consequent,
        }
    }

    /// Returns the antecedent A of the receiver `(B | A)`.
    pub fn antecedent(&self) -> &Formula {
        &self.antecedent
    }

    /// Returns the consequent B of the receiver `(B | A)`.
    pub fn consequent(&self) -> &Formula {
        &self.consequent
    }

    /// Returns the conditional `(¬B | A)` with the negated consequent.
    pub fn negated(&self) -> Conditional {
        Conditional {
            antecedent: self.antecedent.clone(),
            consequent: Formula::not(self.consequent.clone()),
        }
    }

    /// Returns the verification formula `A ∧ B` of the receiver. The
    /// antecedent is cloned, so the result shares no storage with the
    /// receiver.
    pub fn verification(&self) -> Formula {
        self.antecedent.clone().and(self.consequent.clone())
    }

    /// Returns the falsification formula `A ∧ ¬B` of the receiver.
    pub fn falsification(&self) -> Formula {
        self.antecedent
            .clone()
            .and(Formula::not(self.consequent.clone()))
    }

    /// Returns all atoms appearing in the receiver, antecedent first,
    /// without duplicates.
    pub fn atoms(&self) -> Vec<&Atom> {
        self.antecedent
            .atoms()
            .into_iter()
            .chain(self.consequent.atoms())
            .unique()
            .collect()
    }

    /// Returns the free variables of the receiver.
    pub fn free_vars(&self) -> Vec<&Var> {
        self.antecedent
            .free_vars()
            .into_iter()
            .chain(self.consequent.free_vars())
            .unique()
            .collect()
    }

    /// Returns true if neither antecedent nor consequent has a free
    /// variable.
    pub fn is_ground(&self) -> bool {
        self.antecedent.is_ground() && self.consequent.is_ground()
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({} | {})", self.consequent, self.antecedent)
    }
}

/// Is a first-order knowledge base: a set of conditionals together with a
/// set of closed formulae, the facts.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct KnowledgeBase {
    conditionals: Vec<Conditional>,
    facts: Vec<Formula>,
}

impl KnowledgeBase {
    /// Returns a knowledge base over the given conditionals and facts.
    pub fn new(conditionals: Vec<Conditional>, facts: Vec<Formula>) -> Self {
        Self {
            conditionals,
            facts,
        }
    }

    /// Returns the conditionals of the receiver.
    pub fn conditionals(&self) -> &[Conditional] {
        &self.conditionals
    }

    /// Returns the facts of the receiver.
    pub fn facts(&self) -> &[Formula] {
        &self.facts
    }
}

impl fmt::Display for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(
            f,
            "Conditionals: {}",
            self.conditionals.iter().map(|c| c.to_string()).join(", ")
        )?;
        write!(
            f,
            "Facts: {}",
            self.facts.iter().map(|c| c.to_string()).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Const, Pred, Term};
    use super::*;

    fn cond() -> Conditional {
        // (F(t) | B(t))
        let b = Formula::from(Atom::monadic(Pred::from("B"), Term::Const(Const::from("t"))));
        let fl = Formula::from(Atom::monadic(Pred::from("F"), Term::Const(Const::from("t"))));
        Conditional::new(b, fl)
    }

    #[test]
    fn conditional_to_string() {
        assert_eq!("(F(t) | B(t))", cond().to_string());
    }

    #[test]
    fn verification_and_falsification() {
        let c = cond();
        assert_eq!("B(t) ∧ F(t)", c.verification().to_string());
        assert_eq!("B(t) ∧ ¬F(t)", c.falsification().to_string());
        // the conditional itself is untouched
        assert_eq!("(F(t) | B(t))", c.to_string());
    }

    #[test]
    fn negated_conditional() {
        assert_eq!("(¬F(t) | B(t))", cond().negated().to_string());
    }

    #[test]
    fn fact_has_top_antecedent() {
        let f = Conditional::fact(Formula::from(Atom::nullary(Pred::from("Q"))));
        assert_eq!(&Formula::Top, f.antecedent());
    }
}
