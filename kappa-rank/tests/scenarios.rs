//! End-to-end scenarios: knowledge bases from the literature driven through
//! world generation, tolerance-pair search, System-Z ranking construction
//! and query answering.
use kappa_fol::parser::{parse_knowledge_base, parse_query, Query};
use kappa_fol::syntax::{KnowledgeBase, Sig};
use kappa_rank::explain::Explanation;
use kappa_rank::ranking::{Rank, RankingFunction};
use kappa_rank::systemz::SystemZ;
use kappa_rank::tolerance::{create_pairs, SearchStrategy, TolerancePair, ValidPair};
use kappa_rank::worlds::{create_possible_worlds, WorldSet, DEFAULT_ATOM_LIMIT};
use std::collections::HashSet;
use std::sync::Arc;

const TWEETY: &str = r#"
signature

D={t,p}
B(D)
P(D)
F(D)

conditionals

Conditionals{
  (F(X) | B(X))
  (!F(X) | P(X))
  (B(X) | P(X))
}
Facts{
  (B(p))
  (P(t))
}
"#;

const PENGUIN: &str = r#"
signature

D={t,p}
B(D)
P(D)
F(D)

conditionals

Conditionals{
  (F(X) | B(X))
  (!F(X) | P(X))
}
Facts{
  (B(p))
  (P(t))
}
"#;

fn load(text: &str) -> (Sig, KnowledgeBase, Arc<WorldSet>) {
    let (sig, kb) = parse_knowledge_base(text).unwrap();
    let worlds = Arc::new(
        create_possible_worlds(sig.ground_atoms(), sig.domain().to_vec(), DEFAULT_ATOM_LIMIT)
            .unwrap(),
    );
    (sig, kb, worlds)
}

fn pairs_of(
    kb: &KnowledgeBase,
    worlds: &Arc<WorldSet>,
    strategy: SearchStrategy,
) -> Vec<ValidPair> {
    create_pairs(kb, worlds, strategy, None)
}

fn pair_set(results: &[ValidPair]) -> HashSet<TolerancePair> {
    results.iter().map(|r| r.pair.clone()).collect()
}

fn ranking_for(kb: &KnowledgeBase, worlds: &Arc<WorldSet>, pair: &TolerancePair) -> RankingFunction {
    let system = SystemZ::new(kb, worlds.clone(), pair.clone());
    assert!(system.tolerance_pair().is_some());
    system.into_ranking()
}

fn accepts(kappa: &RankingFunction, sig: &Sig, query: &str) -> bool {
    match parse_query(query, sig).unwrap() {
        Query::Formula(f) => kappa.accepts_formula(&f, &mut Explanation::Off),
        Query::Conditional(c) => kappa.accepts_conditional(&c, &mut Explanation::Off),
    }
}

#[test]
fn tweety_has_a_unique_minimal_tolerance_pair() {
    let (sig, kb, worlds) = load(TWEETY);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    assert_eq!(1, results.len());

    let pair = &results[0].pair;
    assert_eq!(2, pair.n_parts());
    // ({(F(X)|B(X))}, {p}) --- ({(¬F(X)|P(X)), (B(X)|P(X))}, {t})
    assert!(pair.conditional_part(0).contains(&kb.conditionals()[0]));
    assert_eq!(1, pair.conditional_part(0).len());
    assert!(pair.constant_part(0).contains(sig.constant("p").unwrap()));
    assert_eq!(2, pair.conditional_part(1).len());
    assert!(pair.constant_part(1).contains(sig.constant("t").unwrap()));

    // one witness per conditional
    assert_eq!(3, results[0].witnesses.len());
}

#[test]
fn tweety_strategies_agree() {
    let (_, kb, worlds) = load(TWEETY);
    let brute = pairs_of(&kb, &worlds, SearchStrategy::BruteForce);
    let all = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let min = pairs_of(&kb, &worlds, SearchStrategy::SearchMin);
    assert_eq!(pair_set(&brute), pair_set(&all));
    assert_eq!(pair_set(&min), pair_set(&all));
}

#[test]
fn tweety_ranking_answers_queries() {
    let (sig, kb, worlds) = load(TWEETY);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchMin);
    let kappa = ranking_for(&kb, &worlds, &results[0].pair);

    // the most plausible situation: the penguin does not fly, the bird does
    let situation = kappa_fol::parser::parse_formula("B(p) && P(t) && !F(t) && F(p)", &sig).unwrap();
    assert_eq!(
        Rank::ZERO,
        kappa.rank_formula(&situation, &mut Explanation::Off)
    );

    // birds typically fly
    assert!(accepts(&kappa, &sig, "(F(X) | B(X))"));
    // but this particular bird is a penguin
    assert!(!accepts(&kappa, &sig, "F(t)"));

    assert!(kappa.accepts_kb(&kb));
}

#[test]
fn penguin_strategies_agree_and_min_is_the_minimum() {
    let (_, kb, worlds) = load(PENGUIN);
    let brute = pairs_of(&kb, &worlds, SearchStrategy::BruteForce);
    let all = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let min = pairs_of(&kb, &worlds, SearchStrategy::SearchMin);

    assert_eq!(3, all.len());
    assert_eq!(pair_set(&brute), pair_set(&all));

    // the unique minimum is the single-subset pair
    assert_eq!(1, min.len());
    assert_eq!(1, min[0].pair.n_parts());
    assert!(pair_set(&all).contains(&min[0].pair));

    // the sorted all-pairs list starts with the minimum
    assert_eq!(min[0].pair, all[0].pair);
    // and the minimum weakly precedes every other result
    for other in &all {
        assert_ne!(
            std::cmp::Ordering::Greater,
            min[0].pair.order(&other.pair)
        );
    }
}

#[test]
fn penguin_ranking_blocks_inheritance() {
    let (sig, kb, worlds) = load(PENGUIN);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchMin);
    let system = SystemZ::new(&kb, worlds.clone(), results[0].pair.clone());
    assert!(system.tolerance_pair().is_some());
    // the raw minimum is already 0
    assert_eq!(0, system.kappa_zero());

    let kappa = system.ranking();
    assert!(!accepts(kappa, &sig, "(F(X) | P(X))"));
    assert!(accepts(kappa, &sig, "(!F(X) | P(X))"));
}

#[test]
fn propositional_kb_yields_a_pair_with_empty_constant_parts() {
    let text = r#"
signature

D={}
a
b

conditionals

Conditionals{
  (b | a)
  (!b | true)
}
Facts{
}
"#;
    let (_, kb, worlds) = load(text);
    for strategy in [
        SearchStrategy::BruteForce,
        SearchStrategy::SearchAll,
        SearchStrategy::SearchMin,
    ] {
        let results = pairs_of(&kb, &worlds, strategy);
        assert_eq!(1, results.len(), "{:?}", strategy);
        let pair = &results[0].pair;
        assert_eq!(2, pair.n_parts());
        assert!(pair.constant_part(0).is_empty());
        assert!(pair.constant_part(1).is_empty());
        // the general rule is tolerated first, the exception later
        assert!(pair.conditional_part(0).contains(&kb.conditionals()[1]));
        assert!(pair.conditional_part(1).contains(&kb.conditionals()[0]));
        // witnesses carry no constant in the propositional case
        assert!(results[0].witnesses.iter().all(|w| w.constant.is_none()));
    }

    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let kappa = ranking_for(&kb, &worlds, &results[0].pair);
    // no facts, so every world stays finite
    assert_eq!(4, kappa.worlds().len());
    for index in 0..kappa.worlds().len() {
        assert!(!kappa.rank_at(index).is_infinite());
    }
    assert!(kappa.accepts_kb(&kb));
}

#[test]
fn propositional_facts_gate_worlds_to_infinity() {
    let text = r#"
signature

D={}
a
b

conditionals

Conditionals{
  (b | a)
}
Facts{
  (a)
}
"#;
    let (_, kb, worlds) = load(text);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    assert_eq!(1, results.len());

    let kappa = ranking_for(&kb, &worlds, &results[0].pair);
    let finite = (0..kappa.worlds().len())
        .filter(|i| !kappa.rank_at(*i).is_infinite())
        .count();
    assert_eq!(2, finite);
}

#[test]
fn inconsistent_kb_yields_no_pairs() {
    let text = r#"
signature

D={}
a

conditionals

Conditionals{
  (a | true)
  (!a | true)
}
Facts{
}
"#;
    let (_, kb, worlds) = load(text);
    for strategy in [
        SearchStrategy::BruteForce,
        SearchStrategy::SearchAll,
        SearchStrategy::SearchMin,
    ] {
        assert!(pairs_of(&kb, &worlds, strategy).is_empty(), "{:?}", strategy);
    }
}

#[test]
fn formula_and_fact_conditional_acceptance_agree() {
    let (sig, kb, worlds) = load(TWEETY);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let kappa = ranking_for(&kb, &worlds, &results[0].pair);

    for query in ["F(t)", "F(p)", "B(p)", "!F(t)", "B(p) && P(t)"] {
        let as_formula = accepts(&kappa, &sig, query);
        let as_conditional = accepts(&kappa, &sig, &format!("({})", query));
        assert_eq!(as_formula, as_conditional, "{}", query);
    }
}

#[test]
fn a_ground_conditional_and_its_negation_are_never_both_accepted() {
    let (sig, kb, worlds) = load(TWEETY);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let kappa = ranking_for(&kb, &worlds, &results[0].pair);

    for query in ["(F(t) | B(t))", "(F(p) | B(p))", "(B(t) | P(t))", "(F(t))"] {
        let conditional = match parse_query(query, &sig).unwrap() {
            Query::Conditional(c) => c,
            Query::Formula(_) => unreachable!(),
        };
        let accepted = kappa.accepts_conditional(&conditional, &mut Explanation::Off);
        let negation_accepted =
            kappa.accepts_conditional(&conditional.negated(), &mut Explanation::Off);
        assert!(!(accepted && negation_accepted), "{}", query);
    }
}

#[test]
fn csv_round_trip_restores_the_ranking() {
    let (sig, kb, worlds) = load(TWEETY);
    let results = pairs_of(&kb, &worlds, SearchStrategy::SearchAll);
    let kappa = ranking_for(&kb, &worlds, &results[0].pair);

    let csv = kappa.to_csv();
    let restored = RankingFunction::from_csv(&csv, worlds.clone()).unwrap();
    assert_eq!(kappa, restored);

    // the header lists the interpretables in canonical order plus `k`
    let header = csv.lines().next().unwrap();
    let expected: Vec<String> = sig
        .ground_atoms()
        .iter()
        .map(|a| a.to_string())
        .chain(std::iter::once("k".into()))
        .collect();
    assert_eq!(expected.join(";"), header);
}

#[test]
fn cancellation_returns_an_empty_result() {
    let (_, kb, worlds) = load(TWEETY);
    for strategy in [
        SearchStrategy::BruteForce,
        SearchStrategy::SearchAll,
        SearchStrategy::SearchMin,
    ] {
        let mut sink = |_p: f64| false;
        let results = create_pairs(&kb, &worlds, strategy, Some(&mut sink));
        assert!(results.is_empty(), "{:?}", strategy);
    }
}
