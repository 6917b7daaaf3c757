//! Styled console reports for a solver run: the loaded knowledge base, the
//! tolerance pairs, the ranking function, per-world rank breakdowns and
//! query verdicts. Each section knows its own layout; colors degrade to
//! plain text when stdout is not a terminal or `--no-color` is given.
use itertools::Itertools;
use kappa_fol::syntax::{KnowledgeBase, Sig};
use kappa_rank::explain::Explanation;
use kappa_rank::systemz::SystemZ;
use kappa_rank::tolerance::ValidPair;
use kappa_rank::worlds::PossibleWorld;

const HEADING_COLOR: term::color::Color = term::color::BRIGHT_CYAN;
const PAIR_COLOR: term::color::Color = term::color::GREEN;
const RANK_COLOR: term::color::Color = term::color::BRIGHT_YELLOW;
const VERDICT_COLOR: term::color::Color = term::color::BRIGHT_BLUE;

/// Writes the sections of a solver report to stdout.
pub struct Report {
    term: Option<Box<term::StdoutTerminal>>,
}

impl Report {
    /// Returns a report writer; colored only if requested and stdout is a
    /// terminal.
    pub fn new(colored: bool) -> Self {
        Self {
            term: if colored { term::stdout() } else { None },
        }
    }

    /// Prints one line in the given color, bold for headings, and resets
    /// the terminal right away.
    fn colored_line(&mut self, color: term::color::Color, bold: bool, line: &str) {
        match self.term.as_mut() {
            Some(t) => {
                let _ = t.fg(color);
                if bold {
                    let _ = t.attr(term::Attr::Bold);
                }
                println!("{}", line);
                let _ = t.reset();
            }
            None => println!("{}", line),
        }
    }

    fn heading(&mut self, text: &str) {
        self.colored_line(HEADING_COLOR, true, text);
    }

    /// The signature, knowledge base and world count of a loaded session.
    pub fn knowledge_base(&mut self, sig: &Sig, kb: &KnowledgeBase, world_count: usize) {
        self.heading("Loaded knowledge base:");
        println!(
            "  Predicates: {}",
            sig.predicates().iter().map(|p| p.to_string()).join(", ")
        );
        println!(
            "  Domain: {{{}}}",
            sig.domain().iter().map(|c| c.to_string()).join(", ")
        );
        println!(
            "  Conditionals: {}",
            kb.conditionals().iter().map(|c| c.to_string()).join(", ")
        );
        println!(
            "  Facts: {}",
            kb.facts().iter().map(|f| f.to_string()).join(", ")
        );
        println!("  Possible worlds: {}", world_count);
        println!();
    }

    /// The tolerance pairs found by a search, numbered from 1, each with
    /// its subset listing and optionally the tolerance witnesses. An empty
    /// result is reported as an inconsistent knowledge base.
    pub fn pairs(&mut self, results: &[ValidPair], with_witnesses: bool) {
        if results.is_empty() {
            self.heading("No tolerance pair exists: the knowledge base is inconsistent.");
            println!();
            return;
        }
        self.heading(&format!("{} tolerance pair(s) found", results.len()));
        println!();

        for (number, valid) in results.iter().enumerate() {
            self.colored_line(
                PAIR_COLOR,
                false,
                &format!("Pair {} (m={})", number + 1, valid.pair.n_parts() - 1),
            );
            print!("{}", valid.pair);
            if with_witnesses {
                println!("Tolerance witnesses:");
                for witness in &valid.witnesses {
                    println!("{}", witness);
                }
            }
            println!();
        }
    }

    /// The ranking function computed for the selected pair: the pair, the
    /// normalization offset and the finite worlds sorted by rank.
    pub fn ranking(&mut self, pair_number: usize, system: &SystemZ) {
        self.heading(&format!("Ranking function for pair {}:", pair_number));
        if let Some(pair) = system.tolerance_pair() {
            print!("{}", pair);
        }
        println!("k_0 = {}", system.kappa_zero());
        println!("(worlds with finite rank, sorted by rank)");
        self.colored_line(RANK_COLOR, false, &system.ranking().to_string_sorted());
        println!();
    }

    /// The rank computation of one world: fact satisfaction, each λ digit,
    /// and the positional weighted sum the rank normalizes from.
    pub fn world_breakdown(
        &mut self,
        kb: &KnowledgeBase,
        system: &SystemZ,
        index: usize,
        world: &PossibleWorld,
    ) {
        self.heading(&format!("World {}:", index));
        println!("w = {}", world);
        println!("Satisfies facts: {}", world.satisfies_all(kb.facts()));
        let rank = system.ranking().rank_of(world);
        println!("Rank: {}", rank);

        if let Some(pair) = system.tolerance_pair() {
            if !rank.is_infinite() {
                let m = pair.n_parts() - 1;
                for i in 0..=m {
                    println!("lambda({}, w) = {}", i, system.lambda(i, world));
                }
                let weighted = (0..=m)
                    .map(|i| {
                        format!(
                            "{} * {}",
                            (m as u64 + 2).pow(i as u32),
                            system.lambda(i, world)
                        )
                    })
                    .join(" + ");
                println!("k_0 = {}", system.kappa_zero());
                println!("k(w) = {} - {} = {}", weighted, system.kappa_zero(), rank);
            }
        }
        println!();
    }

    /// The verdict of one query, followed by its evaluation tree when one
    /// was grown.
    pub fn verdict(&mut self, query: &str, accepted: bool, exp: &Explanation) {
        self.colored_line(
            VERDICT_COLOR,
            true,
            &format!("{} -> {}", query.trim(), accepted),
        );
        if exp.is_enabled() {
            print!("{}", exp);
        }
        println!();
    }
}
