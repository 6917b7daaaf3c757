/*! Provides ranking-function semantics for restricted first-order
conditional knowledge bases: possible worlds, satisfaction, ranking
functions, tolerance-pair search and the System-Z-like construction of a
ranking function from a valid tolerance pair.

Reasoning proceeds in stages: the ground atoms of a signature span the set
of [possible worlds](worlds); a [search](tolerance) over partition pairs of
the conditionals and the domain yields the valid
[tolerance pairs](tolerance::TolerancePair); from a valid pair, the
[System-Z constructor](systemz::SystemZ) builds a
[ranking function](ranking::RankingFunction), which then answers queries
about formulae and conditionals, optionally growing an
[explanation tree](explain::Explanation). */
pub mod explain;
pub mod ranking;
pub mod systemz;
pub mod tolerance;
pub mod trace;
pub mod worlds;
