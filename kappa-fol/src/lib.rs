/*! Provides the syntax of restricted first-order conditional knowledge bases:
signatures over a single sort with predicates of arity at most one, formulae
with at most one free variable, defeasible conditionals `(B | A)`, grounding,
and a reader for the textual knowledge-base format. */
pub mod grounding;
pub mod parser;
pub mod syntax;
