/*! Defines the signature of a knowledge base: the domain of individuals and
the declared predicates. */
use super::{Atom, Const, Error, Pred, Term};
use itertools::Itertools;
use std::fmt;

/// Contains the declaration of a predicate symbol.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PredDecl {
    /// Is the declared predicate symbol.
    pub symbol: Pred,

    /// Is the declared arity (0 or 1).
    pub arity: u8,
}

impl fmt::Display for PredDecl {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}/{}", self.symbol, self.arity)
    }
}

/// Is the signature of a knowledge base: an ordered domain of constants over
/// a single sort and an ordered list of predicate declarations. Declaration
/// order is preserved so that the ground-atom enumeration (and with it the
/// possible-world order) is stable.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Sig {
    domain: Vec<Const>,
    predicates: Vec<PredDecl>,
}

impl Sig {
    /// Returns an empty signature.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constant to the domain. Re-declaring a constant is harmless.
    pub fn add_constant(&mut self, constant: Const) {
        if !self.domain.contains(&constant) {
            self.domain.push(constant);
        }
    }

    /// Adds a predicate declaration. It fails if the arity is above one or
    /// conflicts with an earlier declaration of the same symbol.
    pub fn add_predicate(&mut self, symbol: Pred, arity: u8) -> Result<(), Error> {
        if arity > 1 {
            return Err(Error::UnsupportedArity { predicate: symbol });
        }
        if let Some(decl) = self.predicates.iter().find(|d| d.symbol == symbol) {
            if decl.arity != arity {
                return Err(Error::ConflictingArity {
                    predicate: symbol,
                    first: decl.arity,
                    second: arity,
                });
            }
            return Ok(());
        }
        self.predicates.push(PredDecl { symbol, arity });
        Ok(())
    }

    /// Returns the domain of individuals in declaration order.
    pub fn domain(&self) -> &[Const] {
        &self.domain
    }

    /// Returns the predicate declarations in declaration order.
    pub fn predicates(&self) -> &[PredDecl] {
        &self.predicates
    }

    /// Looks a constant up by name.
    pub fn constant(&self, name: &str) -> Option<&Const> {
        self.domain.iter().find(|c| c.name() == name)
    }

    /// Returns the declared arity of `predicate`, if it is declared.
    pub fn arity(&self, predicate: &Pred) -> Option<u8> {
        self.predicates
            .iter()
            .find(|d| &d.symbol == predicate)
            .map(|d| d.arity)
    }

    /// Checks that `atom` applies a declared predicate to the right number
    /// of arguments.
    pub fn check_atom(&self, atom: &Atom) -> Result<(), Error> {
        let arity = self
            .arity(&atom.predicate)
            .ok_or_else(|| Error::UnknownPredicate {
                predicate: atom.predicate.clone(),
            })?;
        if atom.terms.len() != arity as usize {
            return Err(Error::ArityMismatch {
                predicate: atom.predicate.clone(),
                arity,
                found: atom.terms.len(),
            });
        }
        Ok(())
    }

    /// Returns the ground atoms of the signature in canonical order: for
    /// each predicate in declaration order, one atom per domain constant in
    /// domain order (or a single atom for a nullary predicate). This order
    /// defines the interpretable order of all possible worlds.
    pub fn ground_atoms(&self) -> Vec<Atom> {
        let mut atoms = Vec::new();
        for decl in &self.predicates {
            if decl.arity == 1 {
                for constant in &self.domain {
                    atoms.push(Atom::monadic(
                        decl.symbol.clone(),
                        Term::Const(constant.clone()),
                    ));
                }
            } else {
                atoms.push(Atom::nullary(decl.symbol.clone()));
            }
        }
        atoms
    }
}

impl fmt::Display for Sig {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(
            f,
            "D = {{{}}}",
            self.domain.iter().map(|c| c.to_string()).join(", ")
        )?;
        write!(
            f,
            "{}",
            self.predicates.iter().map(|p| p.to_string()).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_above_one_is_rejected() {
        let mut sig = Sig::new();
        assert!(sig.add_predicate(Pred::from("R"), 2).is_err());
    }

    #[test]
    fn conflicting_arity_is_rejected() {
        let mut sig = Sig::new();
        sig.add_predicate(Pred::from("B"), 1).unwrap();
        assert!(sig.add_predicate(Pred::from("B"), 0).is_err());
        // re-declaring with the same arity is fine
        assert!(sig.add_predicate(Pred::from("B"), 1).is_ok());
    }

    #[test]
    fn ground_atoms_follow_declaration_order() {
        let mut sig = Sig::new();
        sig.add_constant(Const::from("t"));
        sig.add_constant(Const::from("p"));
        sig.add_predicate(Pred::from("B"), 1).unwrap();
        sig.add_predicate(Pred::from("Q"), 0).unwrap();

        let atoms = sig.ground_atoms();
        let names = atoms.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        assert_eq!(vec!["B(t)", "B(p)", "Q"], names);
    }
}
