mod logger;
mod report;

use crate::logger::JsonLogger;
use crate::report::Report;
use anyhow::{anyhow, Context, Error};
use kappa_fol::parser::{parse_knowledge_base, parse_query, Query};
use kappa_fol::syntax::Sig;
use kappa_rank::explain::Explanation;
use kappa_rank::systemz::SystemZ;
use kappa_rank::tolerance::{create_pairs, SearchStrategy};
use kappa_rank::worlds::create_possible_worlds;
use std::io::Read;
use std::sync::Arc;
use std::{fs, io};
use structopt::StructOpt;

#[derive(Clone, Copy)]
enum StrategyOption {
    Brute,
    All,
    Min,
}

impl std::str::FromStr for StrategyOption {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brute" => Ok(StrategyOption::Brute),
            "all" => Ok(StrategyOption::All),
            "min" => Ok(StrategyOption::Min),
            _ => Err("invalid strategy, expected one of 'brute', 'all', 'min'"),
        }
    }
}

impl From<StrategyOption> for SearchStrategy {
    fn from(option: StrategyOption) -> Self {
        match option {
            StrategyOption::Brute => SearchStrategy::BruteForce,
            StrategyOption::All => SearchStrategy::SearchAll,
            StrategyOption::Min => SearchStrategy::SearchMin,
        }
    }
}

#[derive(StructOpt)]
enum ProcessCommand {
    #[structopt(
        name = "solve",
        about = "Compute tolerance pairs and a ranking function for the input knowledge base"
    )]
    Solve {
        #[structopt(
            short = "i",
            long = "input",
            parse(from_os_str),
            help = "Path to the input knowledge-base file"
        )]
        input: Option<std::path::PathBuf>,
        #[structopt(
            short = "s",
            long = "strategy",
            default_value = "min",
            help = "Tolerance-pair strategy: 'brute', 'all' or 'min'"
        )]
        strategy: StrategyOption,
        #[structopt(
            long = "pair",
            default_value = "1",
            help = "1-based index of the tolerance pair to build the ranking from"
        )]
        pair: usize,
        #[structopt(short = "q", long = "query", help = "Query to evaluate; repeatable")]
        queries: Vec<String>,
        #[structopt(
            long = "world",
            help = "Canonical index of a world to show the rank computation for"
        )]
        world: Option<usize>,
        #[structopt(long = "explain", help = "Show proofs and evaluation trees")]
        explain: bool,
        #[structopt(
            long = "csv",
            parse(from_os_str),
            help = "Write the ranking function to a CSV file"
        )]
        csv: Option<std::path::PathBuf>,
        #[structopt(
            long = "max-atoms",
            default_value = "22",
            help = "Largest number of ground atoms to build worlds for"
        )]
        max_atoms: usize,
    },
}

#[derive(StructOpt)]
#[structopt(
    name = "kappa",
    about = "A reasoner for first-order conditional knowledge bases with ranking semantics"
)]
struct Command {
    #[structopt(subcommand, name = "command")]
    command: ProcessCommand,
    #[structopt(long = "no-color", help = "Makes it dim.")]
    no_color: bool,
    #[structopt(
        short = "l",
        long = "log",
        parse(from_os_str),
        help = "Path to a JSON event-log file."
    )]
    log: Option<std::path::PathBuf>,
}

fn main() -> Result<(), Error> {
    let args = Command::from_args();
    let color = !args.no_color;
    let log = args.log;

    match args.command {
        ProcessCommand::Solve {
            input,
            strategy,
            pair,
            queries,
            world,
            explain,
            csv,
            max_atoms,
        } => {
            let text = if let Some(input) = input {
                fs::read_to_string(&input).context("failed to read the input file")?
            } else {
                // input from the pipe
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read from stdin")?;
                buf
            };

            let run = || {
                process_solve(
                    &text,
                    strategy.into(),
                    pair,
                    &queries,
                    world,
                    explain,
                    csv.as_deref(),
                    max_atoms,
                    color,
                )
            };

            if let Some(log) = log {
                let log = fs::File::create(&log).context("cannot create the log file")?;
                let logger = JsonLogger::new(log);
                tracing::subscriber::with_default(logger, run)
            } else {
                run()
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn process_solve(
    text: &str,
    strategy: SearchStrategy,
    pair_index: usize,
    queries: &[String],
    world: Option<usize>,
    explain: bool,
    csv: Option<&std::path::Path>,
    max_atoms: usize,
    color: bool,
) -> Result<(), Error> {
    let mut report = Report::new(color);

    let (sig, kb) = parse_knowledge_base(text)
        .map_err(Error::new)
        .context("failed to parse the knowledge base")?;
    let worlds = Arc::new(
        create_possible_worlds(sig.ground_atoms(), sig.domain().to_vec(), max_atoms)
            .map_err(Error::new)
            .context("failed to build the possible worlds")?,
    );
    report.knowledge_base(&sig, &kb, worlds.len());

    let results = create_pairs(&kb, &worlds, strategy, None);
    report.pairs(&results, explain);
    if results.is_empty() {
        // an inconsistent knowledge base is an answer, not an error
        return Ok(());
    }

    if pair_index == 0 || pair_index > results.len() {
        return Err(anyhow!(
            "pair index {} is out of range 1..={}",
            pair_index,
            results.len()
        ));
    }
    let selected = &results[pair_index - 1];
    let system = SystemZ::new(&kb, worlds.clone(), selected.pair.clone());
    report.ranking(pair_index, &system);

    if let Some(index) = world {
        let chosen = worlds.worlds().get(index).ok_or_else(|| {
            anyhow!("world index {} is out of range 0..{}", index, worlds.len())
        })?;
        report.world_breakdown(&kb, &system, index, chosen);
    }

    for query in queries {
        evaluate_query(&mut report, &sig, &system, query, explain)?;
    }

    if let Some(path) = csv {
        fs::write(path, system.ranking().to_csv()).context("failed to write the CSV file")?;
    }

    Ok(())
}

fn evaluate_query(
    report: &mut Report,
    sig: &Sig,
    system: &SystemZ,
    query: &str,
    explain: bool,
) -> Result<(), Error> {
    let parsed = parse_query(query, sig)
        .map_err(Error::new)
        .with_context(|| format!("failed to parse the query `{}`", query))?;
    let mut exp = if explain {
        Explanation::root()
    } else {
        Explanation::Off
    };

    let kappa = system.ranking();
    let accepted = match &parsed {
        Query::Formula(f) => kappa.accepts_formula(f, &mut exp),
        Query::Conditional(c) => kappa.accepts_conditional(c, &mut exp),
    };

    report.verdict(query, accepted, &exp);
    Ok(())
}
