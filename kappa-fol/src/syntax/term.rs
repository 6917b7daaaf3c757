/*! Defines the syntax of terms. The language has no function symbols, so a
term is either a constant or a variable. */
use super::{Const, Var};
use std::fmt;

/// Is a term of the restricted language: a constant or a variable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Is a constant term, wrapping a [`Const`].
    Const(Const),

    /// Is a variable term, wrapping a [`Var`].
    Var(Var),
}

impl Term {
    /// Returns the variable symbol of the receiver if it is a variable term.
    pub fn var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            Term::Const(_) => None,
        }
    }

    /// Returns true if the receiver is a constant term.
    pub fn is_const(&self) -> bool {
        matches!(self, Term::Const(_))
    }
}

impl From<Const> for Term {
    fn from(c: Const) -> Self {
        Term::Const(c)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Term::Const(c) => write!(f, "{}", c),
            Term::Var(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
