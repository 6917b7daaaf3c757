/*! Defines possible worlds over the ground atoms of a signature and the
satisfaction relation, including quantification over the domain. */
use kappa_fol::grounding;
use kappa_fol::syntax::{Atom, Conditional, Const, Formula};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Is the default bound on the number of interpretable atoms when building
/// worlds; `2^22` worlds is in the order of a gigabyte of resident memory.
pub const DEFAULT_ATOM_LIMIT: usize = 22;

/// Is returned when the possible-world set would not fit in memory. The
/// caller can retry with a larger limit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{atoms} ground atoms span 2^{atoms} possible worlds, above the limit of 2^{limit}; \
     rerun with a larger world limit"
)]
pub struct CapacityError {
    /// Number of interpretable atoms.
    pub atoms: usize,
    /// Largest supported number of atoms.
    pub limit: usize,
}

/// Is the shared context of all possible worlds of a session: the ordered
/// interpretable atoms, their positions, and the domain of individuals. The
/// atom order is fixed once and defines the canonical world order, the CSV
/// column order and the printing order.
#[derive(PartialEq, Eq, Debug)]
pub struct AtomSpace {
    atoms: Vec<Atom>,
    index: HashMap<Atom, usize>,
    domain: Vec<Const>,
}

impl AtomSpace {
    /// Returns an atom space over the given interpretables and domain.
    pub fn new(atoms: Vec<Atom>, domain: Vec<Const>) -> Self {
        let index = atoms
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, a)| (a, i))
            .collect();
        Self {
            atoms,
            index,
            domain,
        }
    }

    /// Returns the interpretable atoms in canonical order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Returns the domain of individuals.
    pub fn domain(&self) -> &[Const] {
        &self.domain
    }

    /// Returns the number of interpretable atoms.
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Returns true if there are no interpretable atoms.
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Returns the canonical position of `atom`, if it is interpretable.
    pub fn position(&self, atom: &Atom) -> Option<usize> {
        self.index.get(atom).copied()
    }
}

/// Is a compact bitset indexed by interpretable position.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct Bits {
    len: usize,
    words: Vec<u64>,
}

impl Bits {
    fn zeros(len: usize) -> Self {
        Self {
            len,
            words: vec![0; (len + 63) / 64],
        }
    }

    fn get(&self, i: usize) -> bool {
        self.words[i / 64] >> (i % 64) & 1 == 1
    }

    fn set(&mut self, i: usize, value: bool) {
        if value {
            self.words[i / 64] |= 1 << (i % 64);
        } else {
            self.words[i / 64] &= !(1 << (i % 64));
        }
    }
}

/// Is a possible world: a total assignment of truth values to the
/// interpretable atoms of its [`AtomSpace`]. All worlds of a session share
/// one space.
#[derive(Clone, Debug)]
pub struct PossibleWorld {
    space: Arc<AtomSpace>,
    bits: Bits,
}

impl PossibleWorld {
    /// Returns the shared atom space of the receiver.
    pub fn space(&self) -> &AtomSpace {
        &self.space
    }

    /// Returns the truth value the receiver assigns to `atom`.
    ///
    /// # Panics
    /// Panics if `atom` is not interpretable in this world; reaching a
    /// non-interpretable atom during satisfaction is a bug in the caller.
    pub fn value(&self, atom: &Atom) -> bool {
        let position = self
            .space
            .position(atom)
            .unwrap_or_else(|| panic!("atom {} is not interpretable in this world", atom));
        self.bits.get(position)
    }

    /// Returns the canonical index of the receiver in the world order of
    /// its space.
    pub fn canonical_index(&self) -> usize {
        let n = self.space.len();
        let mut index = 0;
        for j in 0..n {
            if self.bits.get(j) {
                index |= 1 << (n - 1 - j);
            }
        }
        index
    }

    /// Decides `w ⊨ F` by structural recursion. Quantifiers range over the
    /// domain of the receiver's space: `∃` over an empty domain is false,
    /// `∀` is vacuously true.
    pub fn satisfies(&self, formula: &Formula) -> bool {
        match formula {
            Formula::Top => true,
            Formula::Bottom => false,
            Formula::Atom(a) => self.value(a),
            Formula::Literal(l) => self.value(&l.atom) != l.negated,
            Formula::Elementary(ec) => ec
                .literals()
                .iter()
                .all(|l| self.value(&l.atom) != l.negated),
            Formula::Not(n) => !self.satisfies(&n.formula),
            Formula::And(a) => self.satisfies(&a.left) && self.satisfies(&a.right),
            Formula::Or(o) => self.satisfies(&o.left) || self.satisfies(&o.right),
            Formula::Implies(i) => !self.satisfies(&i.premise) || self.satisfies(&i.consequence),
            Formula::Exists(q) => self.space.domain.iter().any(|a| {
                self.satisfies(&grounding::ground_var(&q.formula, &q.variable, a))
            }),
            Formula::Forall(q) => self.space.domain.iter().all(|a| {
                self.satisfies(&grounding::ground_var(&q.formula, &q.variable, a))
            }),
        }
    }

    /// Returns true if the receiver satisfies every formula of `facts`.
    pub fn satisfies_all(&self, facts: &[Formula]) -> bool {
        facts.iter().all(|f| self.satisfies(f))
    }

    /// Returns true if the receiver verifies `conditional`, i.e. satisfies
    /// its verification formula `A ∧ B`.
    pub fn verifies(&self, conditional: &Conditional) -> bool {
        self.satisfies(&conditional.verification())
    }

    /// Returns true if the receiver falsifies `conditional`, i.e. satisfies
    /// its falsification formula `A ∧ ¬B`.
    pub fn falsifies(&self, conditional: &Conditional) -> bool {
        self.satisfies(&conditional.falsification())
    }
}

impl PartialEq for PossibleWorld {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
            && (Arc::ptr_eq(&self.space, &other.space) || self.space == other.space)
    }
}

impl Eq for PossibleWorld {}

impl Hash for PossibleWorld {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl fmt::Display for PossibleWorld {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "(")?;
        for (j, atom) in self.space.atoms.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}={}", atom, self.bits.get(j) as u8)?;
        }
        write!(f, ")")
    }
}

/// Is the set of all possible worlds over an atom space, in canonical
/// order.
#[derive(PartialEq, Debug)]
pub struct WorldSet {
    space: Arc<AtomSpace>,
    worlds: Vec<PossibleWorld>,
}

impl WorldSet {
    /// Returns the shared atom space.
    pub fn space(&self) -> &Arc<AtomSpace> {
        &self.space
    }

    /// Returns the domain of individuals.
    pub fn domain(&self) -> &[Const] {
        self.space.domain()
    }

    /// Returns the worlds in canonical order.
    pub fn worlds(&self) -> &[PossibleWorld] {
        &self.worlds
    }

    /// Returns the number of worlds.
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// Returns true if the set is empty. A freshly generated world set is
    /// never empty: zero atoms still span one (empty) world.
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Returns an iterator over the worlds in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, PossibleWorld> {
        self.worlds.iter()
    }
}

impl<'a> IntoIterator for &'a WorldSet {
    type Item = &'a PossibleWorld;
    type IntoIter = std::slice::Iter<'a, PossibleWorld>;

    fn into_iter(self) -> Self::IntoIter {
        self.worlds.iter()
    }
}

/// Generates the `2^n` possible worlds over the given interpretable atoms
/// by iterative doubling: starting from a single empty world, each atom in
/// turn splits every partial world into its false and true extension. The
/// resulting order is the canonical world order.
///
/// Fails with a [`CapacityError`] when more than `2^limit` worlds would be
/// needed.
pub fn create_possible_worlds(
    atoms: Vec<Atom>,
    domain: Vec<Const>,
    limit: usize,
) -> Result<WorldSet, CapacityError> {
    let n = atoms.len();
    if n > limit {
        return Err(CapacityError { atoms: n, limit });
    }
    let space = Arc::new(AtomSpace::new(atoms, domain));

    let mut worlds = vec![PossibleWorld {
        space: space.clone(),
        bits: Bits::zeros(n),
    }];
    for j in 0..n {
        let mut extended = Vec::with_capacity(worlds.len() * 2);
        for world in worlds {
            for value in [false, true] {
                let mut bits = world.bits.clone();
                bits.set(j, value);
                extended.push(PossibleWorld {
                    space: space.clone(),
                    bits,
                });
            }
        }
        worlds = extended;
    }
    debug!(
        event = crate::trace::WORLDS,
        atoms = n,
        worlds = worlds.len()
    );

    Ok(WorldSet { space, worlds })
}
