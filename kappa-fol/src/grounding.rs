/*! Implements grounding: the substitution of constants for free variables
in formulae and conditionals. */
use crate::syntax::{
    Atom, Conditional, Const, ElementaryConjunction, Formula, Literal, Term, Var,
};

/// Is the variable filter of a substitution: either every free variable or
/// one specific variable.
#[derive(Clone, Copy)]
enum Target<'a> {
    All,
    One(&'a Var),
}

impl<'a> Target<'a> {
    fn applies_to(&self, v: &Var, shadowed: &[&Var]) -> bool {
        if shadowed.contains(&v) {
            return false;
        }
        match self {
            Target::All => true,
            Target::One(target) => *target == v,
        }
    }
}

fn subst_term(term: &Term, target: Target, constant: &Const, shadowed: &[&Var]) -> Term {
    match term {
        Term::Const(_) => term.clone(),
        Term::Var(v) => {
            if target.applies_to(v, shadowed) {
                Term::Const(constant.clone())
            } else {
                term.clone()
            }
        }
    }
}

fn subst_atom(atom: &Atom, target: Target, constant: &Const, shadowed: &[&Var]) -> Atom {
    Atom {
        predicate: atom.predicate.clone(),
        terms: atom
            .terms
            .iter()
            .map(|t| subst_term(t, target, constant, shadowed))
            .collect(),
    }
}

fn subst<'a>(
    formula: &'a Formula,
    target: Target,
    constant: &Const,
    shadowed: &mut Vec<&'a Var>,
) -> Formula {
    match formula {
        Formula::Top | Formula::Bottom => formula.clone(),
        Formula::Atom(a) => Formula::Atom(subst_atom(a, target, constant, shadowed)),
        Formula::Literal(l) => Formula::Literal(Literal {
            atom: subst_atom(&l.atom, target, constant, shadowed),
            negated: l.negated,
        }),
        Formula::Elementary(ec) => Formula::Elementary(ElementaryConjunction::new(
            ec.literals()
                .iter()
                .map(|l| Literal {
                    atom: subst_atom(&l.atom, target, constant, shadowed),
                    negated: l.negated,
                })
                .collect(),
        )),
        Formula::Not(n) => Formula::not(subst(&n.formula, target, constant, shadowed)),
        Formula::And(a) => subst(&a.left, target, constant, shadowed)
            .and(subst(&a.right, target, constant, shadowed)),
        Formula::Or(o) => subst(&o.left, target, constant, shadowed)
            .or(subst(&o.right, target, constant, shadowed)),
        Formula::Implies(i) => subst(&i.premise, target, constant, shadowed)
            .implies(subst(&i.consequence, target, constant, shadowed)),
        Formula::Exists(q) => {
            shadowed.push(&q.variable);
            let body = subst(&q.formula, target, constant, shadowed);
            shadowed.pop();
            Formula::exists(q.variable.clone(), body)
        }
        Formula::Forall(q) => {
            shadowed.push(&q.variable);
            let body = subst(&q.formula, target, constant, shadowed);
            shadowed.pop();
            Formula::forall(q.variable.clone(), body)
        }
    }
}

/// Replaces every free variable of `formula` by `constant`, returning a new
/// formula. A ground formula is returned unchanged.
pub fn ground(formula: &Formula, constant: &Const) -> Formula {
    subst(formula, Target::All, constant, &mut Vec::new())
}

/// Replaces the free occurrences of `variable` in `formula` by `constant`.
/// Occurrences bound by an inner quantifier over the same symbol are left
/// alone.
pub fn ground_var(formula: &Formula, variable: &Var, constant: &Const) -> Formula {
    subst(formula, Target::One(variable), constant, &mut Vec::new())
}

/// Grounds a conditional by replacing every free variable of antecedent and
/// consequent jointly by `constant`.
pub fn ground_conditional(conditional: &Conditional, constant: &Const) -> Conditional {
    Conditional::new(
        ground(conditional.antecedent(), constant),
        ground(conditional.consequent(), constant),
    )
}

/// Returns the groundings of `formula`, one per constant of `domain`. A
/// ground formula yields itself as its only grounding.
pub fn groundings(formula: &Formula, domain: &[Const]) -> Vec<Formula> {
    if formula.is_ground() {
        return vec![formula.clone()];
    }
    domain.iter().map(|a| ground(formula, a)).collect()
}

/// Returns the groundings of `conditional`, one per constant of `domain`. A
/// ground conditional yields itself as its only grounding.
pub fn conditional_groundings(conditional: &Conditional, domain: &[Const]) -> Vec<Conditional> {
    if conditional.is_ground() {
        return vec![conditional.clone()];
    }
    domain
        .iter()
        .map(|a| ground_conditional(conditional, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Pred;

    fn open_atom() -> Formula {
        Atom::monadic(Pred::from("B"), Term::Var(Var::from("X"))).into()
    }

    #[test]
    fn ground_replaces_the_free_variable() {
        let f = ground(&open_atom(), &Const::from("t"));
        assert_eq!("B(t)", f.to_string());
        assert!(f.is_ground());
    }

    #[test]
    fn ground_leaves_ground_formulae_unchanged() {
        let f: Formula = Atom::monadic(Pred::from("B"), Term::Const(Const::from("p"))).into();
        assert_eq!(f, ground(&f, &Const::from("t")));
    }

    #[test]
    fn ground_var_respects_shadowing() {
        // ∃ X. B(X) has no free occurrence of X
        let f = Formula::exists(Var::from("X"), open_atom());
        let g = ground_var(&f, &Var::from("X"), &Const::from("t"));
        assert_eq!(f, g);
    }

    #[test]
    fn conditional_grounding_is_joint() {
        let c = Conditional::new(
            open_atom(),
            Atom::monadic(Pred::from("F"), Term::Var(Var::from("X"))).into(),
        );
        let cg = ground_conditional(&c, &Const::from("t"));
        assert_eq!("(F(t) | B(t))", cg.to_string());
    }

    #[test]
    fn groundings_over_a_domain() {
        let domain = vec![Const::from("t"), Const::from("p")];
        let gs = groundings(&open_atom(), &domain);
        assert_eq!(2, gs.len());
        assert_eq!("B(t)", gs[0].to_string());
        assert_eq!("B(p)", gs[1].to_string());
    }

    #[test]
    fn groundings_of_closed_formula() {
        let closed = Formula::forall(Var::from("X"), open_atom());
        let domain = vec![Const::from("t"), Const::from("p")];
        assert_eq!(vec![closed.clone()], groundings(&closed, &domain));
    }
}
