use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lazypipe::{Enumerable, Enumerator, Error};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lazypipe", about = "Run lazy filter/map/order pipelines over integers")]
struct Cli {
    /// Log pipeline construction and finalizer errors.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Filter, map and order the input, then print the result.
    Query {
        /// Integers, one per line (`#` starts a comment). Reads stdin when absent.
        input: Option<PathBuf>,
        /// Filter rule: even, odd, positive, negative, gt:N, lt:N. Repeatable.
        #[arg(long = "filter")]
        filters: Vec<FilterRule>,
        /// Map rule: double, square, negate, add:N, mul:N, div:N. Repeatable.
        #[arg(long = "map")]
        maps: Vec<MapRule>,
        /// Sort the result.
        #[arg(long, value_enum)]
        order: Option<Order>,
        /// Which values to print.
        #[arg(long, value_enum, default_value_t = Take::All)]
        take: Take,
    },
    /// Print the position of the first occurrence of a value.
    Find {
        /// Integers, one per line (`#` starts a comment). Reads stdin when absent.
        input: Option<PathBuf>,
        /// Value to look for.
        #[arg(long, allow_negative_numbers = true)]
        value: i64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Order {
    Asc,
    Desc,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Take {
    First,
    Last,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FilterRule {
    Even,
    Odd,
    Positive,
    Negative,
    GreaterThan(i64),
    LessThan(i64),
}

impl FilterRule {
    fn matches(self, value: i64) -> bool {
        match self {
            FilterRule::Even => value % 2 == 0,
            FilterRule::Odd => value % 2 != 0,
            FilterRule::Positive => value > 0,
            FilterRule::Negative => value < 0,
            FilterRule::GreaterThan(bound) => value > bound,
            FilterRule::LessThan(bound) => value < bound,
        }
    }
}

impl FromStr for FilterRule {
    type Err = String;

    fn from_str(rule: &str) -> std::result::Result<Self, Self::Err> {
        match split_rule(rule)? {
            ("even", None) => Ok(FilterRule::Even),
            ("odd", None) => Ok(FilterRule::Odd),
            ("positive", None) => Ok(FilterRule::Positive),
            ("negative", None) => Ok(FilterRule::Negative),
            ("gt", Some(bound)) => Ok(FilterRule::GreaterThan(bound)),
            ("lt", Some(bound)) => Ok(FilterRule::LessThan(bound)),
            _ => Err(format!("unknown filter rule `{rule}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum MapRule {
    Double,
    Square,
    Negate,
    Add(i64),
    Mul(i64),
    Div(i64),
}

impl MapRule {
    fn apply(self, value: i64) -> lazypipe::Result<i64> {
        let mapped = match self {
            MapRule::Double => value.checked_mul(2),
            MapRule::Square => value.checked_mul(value),
            MapRule::Negate => value.checked_neg(),
            MapRule::Add(n) => value.checked_add(n),
            MapRule::Mul(n) => value.checked_mul(n),
            MapRule::Div(0) => return Err(Error::function("division by zero")),
            MapRule::Div(n) => value.checked_div(n),
        };
        mapped.ok_or_else(|| Error::function(format!("{self:?} overflows on {value}")))
    }
}

impl FromStr for MapRule {
    type Err = String;

    fn from_str(rule: &str) -> std::result::Result<Self, Self::Err> {
        match split_rule(rule)? {
            ("double", None) => Ok(MapRule::Double),
            ("square", None) => Ok(MapRule::Square),
            ("negate", None) => Ok(MapRule::Negate),
            ("add", Some(n)) => Ok(MapRule::Add(n)),
            ("mul", Some(n)) => Ok(MapRule::Mul(n)),
            ("div", Some(n)) => Ok(MapRule::Div(n)),
            _ => Err(format!("unknown map rule `{rule}`")),
        }
    }
}

/// Split `name[:N]`.
fn split_rule(rule: &str) -> std::result::Result<(&str, Option<i64>), String> {
    match rule.split_once(':') {
        None => Ok((rule, None)),
        Some((name, arg)) => {
            let arg = arg
                .trim()
                .parse()
                .map_err(|_| format!("rule `{rule}` needs an integer argument"))?;
            Ok((name, Some(arg)))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            input,
            filters,
            maps,
            order,
            take,
        } => run_query(input, &filters, &maps, order, take)?,
        Commands::Find { input, value } => run_find(input, value)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_query(
    input: Option<PathBuf>,
    filters: &[FilterRule],
    maps: &[MapRule],
    order: Option<Order>,
    take: Take,
) -> Result<()> {
    let values = read_values(input.as_ref())?;
    info!(values = values.len(), "loaded input");

    let mut pipeline = build_pipeline(values, filters, maps, order);
    match take {
        Take::First => {
            if let Some(value) = pipeline.first().context("query failed")? {
                println!("{value}");
            }
        }
        Take::Last => {
            if let Some(value) = pipeline.last().context("query failed")? {
                println!("{value}");
            }
        }
        Take::All => {
            pipeline
                .for_each(|value| println!("{value}"))
                .context("query failed")?;
        }
    }
    pipeline.dispose();
    Ok(())
}

/// Stage-by-stage construction; each step re-boxes so the pipeline keeps
/// one type however many rules are given.
fn build_pipeline(
    values: Vec<i64>,
    filters: &[FilterRule],
    maps: &[MapRule],
    order: Option<Order>,
) -> Enumerator<'static, i64> {
    let mut pipeline = Enumerable::from_vec(values).into_enumerator();
    for &rule in filters {
        debug!(?rule, "adding filter stage");
        pipeline = pipeline
            .into_enumerable()
            .filter(move |value: &i64| rule.matches(*value))
            .into_enumerator();
    }
    for &rule in maps {
        debug!(?rule, "adding map stage");
        pipeline = pipeline
            .into_enumerable()
            .try_map(move |value| rule.apply(value))
            .into_enumerator();
    }
    if let Some(order) = order {
        debug!(?order, "adding order stage");
        let staged = pipeline.into_enumerable();
        pipeline = match order {
            Order::Asc => staged.order_by(|a: &i64, b: &i64| a < b).into_enumerator(),
            Order::Desc => staged.order_by(|a: &i64, b: &i64| a > b).into_enumerator(),
        };
    }
    pipeline
}

fn run_find(input: Option<PathBuf>, value: i64) -> Result<()> {
    let values = read_values(input.as_ref())?;
    let position = Enumerable::from_vec(values)
        .find_index_eql(&value)
        .context("search failed")?;
    match position {
        Some(index) => println!("{index}"),
        None => println!("not found"),
    }
    Ok(())
}

fn read_values(input: Option<&PathBuf>) -> Result<Vec<i64>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("failed to open input file {}", path.display())
        })?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    parse_values(reader)
}

fn parse_values<R: BufRead>(reader: R) -> Result<Vec<i64>> {
    let mut values = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let value = content
            .parse()
            .with_context(|| format!("line {}: `{content}` is not an integer", idx + 1))?;
        values.push(value);
    }
    Ok(values)
}
