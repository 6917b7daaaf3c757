/*! Implements a reader for knowledge bases and queries in the textual
format.

A knowledge base is given as a `signature` section declaring the domain and
the predicates, followed by a `conditionals` section with a `Conditionals`
and a `Facts` block:

```text
signature

D={t,p}
B(D)
P(D)
F(D)

conditionals

Conditionals{
  (F(X) | B(X))
  (¬F(X) | P(X))
}
Facts{
  (B(p))
  (P(t))
}
```

`#` starts a line comment. Formulae use `!`/`¬` for negation, `&&`/`&`/`∧`
for conjunction, `||`/`∨` for disjunction and `->`/`→` for implication; a
single `|` only separates the consequent from the antecedent of a
conditional. `\forall v:` and `\exists v:` (or `∀`/`∃`) introduce
quantifiers in queries. A query starting with `(` is a conditional,
otherwise it is a formula.

Identifiers appearing as arguments are resolved against the signature: a
declared constant denotes itself, anything else is a variable. */
use crate::syntax::{
    Atom, Conditional, Const, Error, Formula, KnowledgeBase, Pred, Sig, Term, Var,
};
use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{multispace0, satisfy},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

/// Is a query against a ranking function: a formula or a conditional.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Query {
    /// Is a formula query.
    Formula(Formula),

    /// Is a conditional query.
    Conditional(Conditional),
}

/// Reads a knowledge base from its textual representation, checking the
/// language restrictions: predicates have arity 0 or 1, each conditional has
/// at most one free variable and every fact is closed.
pub fn parse_knowledge_base(text: &str) -> Result<(Sig, KnowledgeBase), Error> {
    let text = strip_comments(text);
    let (_, raw) = all_consuming(p_kb)(text.as_str()).map_err(|e| syntax_error(&text, e))?;

    let mut sig = Sig::new();
    for name in raw.domain {
        sig.add_constant(Const::from(name));
    }
    for (name, arity) in raw.predicates {
        sig.add_predicate(Pred::from(name), arity)?;
    }

    let conditionals = raw
        .conditionals
        .iter()
        .map(|c| resolve_conditional(c, &sig))
        .collect::<Result<Vec<_>, _>>()?;
    let facts = raw
        .facts
        .iter()
        .map(|f| resolve_formula(f, &sig, &mut Vec::new()))
        .collect::<Result<Vec<_>, _>>()?;

    for c in &conditionals {
        if c.free_vars().len() > 1 {
            return Err(Error::ExtraFreeVariables {
                conditional: c.to_string(),
            });
        }
    }
    for f in &facts {
        if !f.is_ground() {
            return Err(Error::OpenFact {
                fact: f.to_string(),
            });
        }
    }

    Ok((sig, KnowledgeBase::new(conditionals, facts)))
}

/// Reads a query: a conditional if the text starts with `(`, a formula
/// otherwise.
pub fn parse_query(text: &str, sig: &Sig) -> Result<Query, Error> {
    let text = strip_comments(text);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyQuery);
    }
    if trimmed.starts_with('(') {
        parse_conditional(trimmed, sig).map(Query::Conditional)
    } else {
        parse_formula(trimmed, sig).map(Query::Formula)
    }
}

/// Reads a single formula.
pub fn parse_formula(text: &str, sig: &Sig) -> Result<Formula, Error> {
    let text = strip_comments(text);
    let (_, ast) = all_consuming(terminated(p_formula, multispace0))(text.as_str())
        .map_err(|e| syntax_error(&text, e))?;
    resolve_formula(&ast, sig, &mut Vec::new())
}

/// Reads a single conditional `(B | A)`; the antecedent may be omitted, in
/// which case it is `⊤`.
pub fn parse_conditional(text: &str, sig: &Sig) -> Result<Conditional, Error> {
    let text = strip_comments(text);
    let (_, ast) = all_consuming(terminated(p_conditional, multispace0))(text.as_str())
        .map_err(|e| syntax_error(&text, e))?;
    resolve_conditional(&ast, sig)
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(line))
        .join("\n")
}

// ------------------------------------------------------------------------
// raw syntax tree, before identifiers are resolved against the signature
// ------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Ast {
    Top,
    Bottom,
    Atom { predicate: String, args: Vec<String> },
    Not(Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Implies(Box<Ast>, Box<Ast>),
    Exists(String, Box<Ast>),
    Forall(String, Box<Ast>),
}

#[derive(Debug)]
struct AstConditional {
    antecedent: Option<Ast>,
    consequent: Ast,
}

#[derive(Debug)]
struct RawKb {
    domain: Vec<String>,
    predicates: Vec<(String, u8)>,
    conditionals: Vec<AstConditional>,
    facts: Vec<Ast>,
}

fn sp<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(multispace0, inner)
}

fn ident(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        many0(satisfy(|c: char| c.is_alphanumeric() || c == '_')),
    ))(i)
}

fn p_formula(i: &str) -> IResult<&str, Ast> {
    p_implication(i)
}

fn p_implication(i: &str) -> IResult<&str, Ast> {
    let (i, left) = p_disjunction(i)?;
    let (i, right) = opt(preceded(sp(alt((tag("->"), tag("→")))), p_implication))(i)?;
    Ok((
        i,
        match right {
            Some(r) => Ast::Implies(Box::new(left), Box::new(r)),
            None => left,
        },
    ))
}

fn p_disjunction(i: &str) -> IResult<&str, Ast> {
    let (i, first) = p_conjunction(i)?;
    let (i, rest) = many0(preceded(sp(alt((tag("||"), tag("∨")))), p_conjunction))(i)?;
    Ok((
        i,
        rest.into_iter()
            .fold(first, |acc, f| Ast::Or(Box::new(acc), Box::new(f))),
    ))
}

fn p_conjunction(i: &str) -> IResult<&str, Ast> {
    let (i, first) = p_unary(i)?;
    let (i, rest) = many0(preceded(sp(alt((tag("&&"), tag("&"), tag("∧")))), p_unary))(i)?;
    Ok((
        i,
        rest.into_iter()
            .fold(first, |acc, f| Ast::And(Box::new(acc), Box::new(f))),
    ))
}

fn p_unary(i: &str) -> IResult<&str, Ast> {
    alt((p_not, p_quantified, p_parenthesized, p_constant_formula, p_atom))(i)
}

fn p_not(i: &str) -> IResult<&str, Ast> {
    map(preceded(sp(alt((tag("!"), tag("¬")))), p_unary), |f| {
        Ast::Not(Box::new(f))
    })(i)
}

fn p_quantified(i: &str) -> IResult<&str, Ast> {
    let (i, universal) = sp(alt((
        value(true, tag("\\forall")),
        value(true, tag("∀")),
        value(false, tag("\\exists")),
        value(false, tag("∃")),
    )))(i)?;
    let (i, variable) = sp(ident)(i)?;
    let (i, _) = sp(tag(":"))(i)?;
    let (i, body) = p_formula(i)?;
    let body = Box::new(body);
    Ok((
        i,
        if universal {
            Ast::Forall(variable.to_string(), body)
        } else {
            Ast::Exists(variable.to_string(), body)
        },
    ))
}

fn p_parenthesized(i: &str) -> IResult<&str, Ast> {
    delimited(sp(tag("(")), p_formula, sp(tag(")")))(i)
}

fn p_constant_formula(i: &str) -> IResult<&str, Ast> {
    sp(alt((value(Ast::Top, tag("⊤")), value(Ast::Bottom, tag("⟘")))))(i)
}

fn p_atom(i: &str) -> IResult<&str, Ast> {
    let (i, name) = sp(ident)(i)?;
    match name {
        "true" => Ok((i, Ast::Top)),
        "false" => Ok((i, Ast::Bottom)),
        _ => {
            let (i, arg) = opt(delimited(sp(tag("(")), sp(ident), sp(tag(")"))))(i)?;
            Ok((
                i,
                Ast::Atom {
                    predicate: name.to_string(),
                    args: arg.into_iter().map(String::from).collect(),
                },
            ))
        }
    }
}

fn p_conditional(i: &str) -> IResult<&str, AstConditional> {
    let (i, _) = sp(tag("("))(i)?;
    let (i, consequent) = p_formula(i)?;
    let (i, antecedent) = opt(preceded(sp(tag("|")), p_formula))(i)?;
    let (i, _) = sp(tag(")"))(i)?;
    Ok((
        i,
        AstConditional {
            antecedent,
            consequent,
        },
    ))
}

fn p_domain(i: &str) -> IResult<&str, Vec<String>> {
    let (i, _) = sp(tag("D"))(i)?;
    let (i, _) = sp(tag("="))(i)?;
    let (i, _) = sp(tag("{"))(i)?;
    let (i, names) = separated_list0(sp(tag(",")), sp(ident))(i)?;
    let (i, _) = sp(tag("}"))(i)?;
    Ok((i, names.into_iter().map(String::from).collect()))
}

fn p_pred_decl(i: &str) -> IResult<&str, (String, u8)> {
    let (rest, name) = sp(ident)(i)?;
    // the bare keyword ends the declaration list
    if name == "conditionals" {
        return Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Tag,
        )));
    }
    let (rest, arg) = opt(delimited(sp(tag("(")), sp(tag("D")), sp(tag(")"))))(rest)?;
    Ok((rest, (name.to_string(), if arg.is_some() { 1 } else { 0 })))
}

fn p_kb(i: &str) -> IResult<&str, RawKb> {
    let (i, _) = sp(tag("signature"))(i)?;
    let (i, domain) = p_domain(i)?;
    let (i, predicates) = many0(p_pred_decl)(i)?;
    let (i, _) = sp(tag("conditionals"))(i)?;
    let (i, _) = sp(tag("Conditionals"))(i)?;
    let (i, _) = sp(tag("{"))(i)?;
    let (i, conditionals) = many0(p_conditional)(i)?;
    let (i, _) = sp(tag("}"))(i)?;
    let (i, _) = sp(tag("Facts"))(i)?;
    let (i, _) = sp(tag("{"))(i)?;
    let (i, facts) = many0(p_formula)(i)?;
    let (i, _) = sp(tag("}"))(i)?;
    let (i, _) = multispace0(i)?;
    Ok((
        i,
        RawKb {
            domain,
            predicates,
            conditionals,
            facts,
        },
    ))
}

// ------------------------------------------------------------------------
// resolution against the signature
// ------------------------------------------------------------------------

fn resolve_term(name: &str, sig: &Sig, bound: &[String]) -> Term {
    if bound.iter().any(|b| b == name) {
        return Term::Var(Var::from(name));
    }
    match sig.constant(name) {
        Some(c) => Term::Const(c.clone()),
        None => Term::Var(Var::from(name)),
    }
}

fn resolve_formula(ast: &Ast, sig: &Sig, bound: &mut Vec<String>) -> Result<Formula, Error> {
    Ok(match ast {
        Ast::Top => Formula::Top,
        Ast::Bottom => Formula::Bottom,
        Ast::Atom { predicate, args } => {
            let terms = args
                .iter()
                .map(|a| resolve_term(a, sig, bound))
                .collect_vec();
            let atom = Atom {
                predicate: Pred::from(predicate.as_str()),
                terms,
            };
            sig.check_atom(&atom)?;
            atom.into()
        }
        Ast::Not(f) => Formula::not(resolve_formula(f, sig, bound)?),
        Ast::And(l, r) => {
            resolve_formula(l, sig, bound)?.and(resolve_formula(r, sig, bound)?)
        }
        Ast::Or(l, r) => resolve_formula(l, sig, bound)?.or(resolve_formula(r, sig, bound)?),
        Ast::Implies(l, r) => {
            resolve_formula(l, sig, bound)?.implies(resolve_formula(r, sig, bound)?)
        }
        Ast::Exists(v, body) => {
            bound.push(v.clone());
            let b = resolve_formula(body, sig, bound);
            bound.pop();
            Formula::exists(Var::from(v.as_str()), b?)
        }
        Ast::Forall(v, body) => {
            bound.push(v.clone());
            let b = resolve_formula(body, sig, bound);
            bound.pop();
            Formula::forall(Var::from(v.as_str()), b?)
        }
    })
}

fn resolve_conditional(ast: &AstConditional, sig: &Sig) -> Result<Conditional, Error> {
    let antecedent = match &ast.antecedent {
        Some(a) => resolve_formula(a, sig, &mut Vec::new())?,
        None => Formula::Top,
    };
    let consequent = resolve_formula(&ast.consequent, sig, &mut Vec::new())?;
    Ok(Conditional::new(antecedent, consequent))
}

fn syntax_error(input: &str, err: nom::Err<nom::error::Error<&str>>) -> Error {
    let rest = match &err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => "",
    };
    let offset = input.len() - rest.len();
    let consumed = &input[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed.chars().rev().take_while(|c| *c != '\n').count() + 1;
    Error::Syntax { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn parse_tweety() {
        let (sig, kb) = parse_knowledge_base(TWEETY).unwrap();
        assert_eq!(2, sig.domain().len());
        assert_eq!(3, sig.predicates().len());
        assert_eq!(3, kb.conditionals().len());
        assert_eq!(2, kb.facts().len());
        assert_eq!("(F(X) | B(X))", kb.conditionals()[0].to_string());
        assert_eq!("(¬F(X) | P(X))", kb.conditionals()[1].to_string());
        assert_eq!("B(p)", kb.facts()[0].to_string());
    }

    #[test]
    fn parse_with_comments() {
        let text = TWEETY.replace("(B(p))", "(B(p))  # a penguin");
        let (_, kb) = parse_knowledge_base(&text).unwrap();
        assert_eq!(2, kb.facts().len());
    }

    #[test]
    fn parse_propositional_kb() {
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
  (a)
}
"#;
        let (sig, kb) = parse_knowledge_base(text).unwrap();
        assert!(sig.domain().is_empty());
        assert_eq!("(b | a)", kb.conditionals()[0].to_string());
        assert_eq!("(¬b | ⊤)", kb.conditionals()[1].to_string());
        assert!(kb.facts()[0].is_ground());
    }

    #[test]
    fn undeclared_predicate_is_rejected() {
        let text = TWEETY.replace("(B(p))", "(G(p))");
        assert!(parse_knowledge_base(&text).is_err());
    }

    #[test]
    fn open_fact_is_rejected() {
        let text = TWEETY.replace("(B(p))", "(B(X))");
        assert!(matches!(
            parse_knowledge_base(&text),
            Err(Error::OpenFact { .. })
        ));
    }

    #[test]
    fn two_variable_conditional_is_rejected() {
        let text = TWEETY.replace("(F(X) | B(X))", "(F(X) | B(Y))");
        assert!(matches!(
            parse_knowledge_base(&text),
            Err(Error::ExtraFreeVariables { .. })
        ));
    }

    #[test]
    fn queries_are_classified_by_leading_parenthesis() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();

        let q = parse_query("F(t)", &sig).unwrap();
        assert!(matches!(q, Query::Formula(_)));

        let q = parse_query("(F(X) | B(X))", &sig).unwrap();
        match q {
            Query::Conditional(c) => assert_eq!("(F(X) | B(X))", c.to_string()),
            _ => panic!("expected a conditional"),
        }

        // a parenthesized formula is a conditional fact
        let q = parse_query("(F(t))", &sig).unwrap();
        match q {
            Query::Conditional(c) => assert_eq!(&Formula::Top, c.antecedent()),
            _ => panic!("expected a conditional"),
        }
    }

    #[test]
    fn quantified_query() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();
        let f = parse_formula("\\forall X: B(X) -> F(X)", &sig).unwrap();
        assert!(f.is_ground());
        assert_eq!("∀ X. (B(X) → F(X))", f.to_string());

        let g = parse_formula("\\exists X: B(X) && !F(X)", &sig).unwrap();
        assert!(matches!(g, Formula::Exists(_)));
    }

    #[test]
    fn constants_resolve_to_terms() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();
        let f = parse_formula("B(t)", &sig).unwrap();
        assert!(f.is_ground());
        let g = parse_formula("B(Y)", &sig).unwrap();
        assert!(!g.is_ground());
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();
        assert!(matches!(
            parse_formula("B", &sig),
            Err(Error::ArityMismatch { .. })
        ));
    }

    #[test]
    fn syntax_error_carries_a_position() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();
        assert!(matches!(
            parse_formula("B(t) &&", &sig),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn disjunction_and_implication_bind_as_expected() {
        let (sig, _) = parse_knowledge_base(TWEETY).unwrap();
        let f = parse_formula("B(t) || P(t) -> F(t)", &sig).unwrap();
        // (B(t) ∨ P(t)) → F(t)
        assert!(matches!(f, Formula::Implies(_)));
    }
}
