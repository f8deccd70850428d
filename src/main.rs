//! sweepmap CLI - sensitivity-sweep logs to heatmaps
//!
//! Three subcommands over the library pipeline:
//!
//! 1. heatmap: parse logs (in parallel), build one grid per family, write PNGs
//! 2. summary: print each family's grid as a table (or JSON) and flag records
//!    whose reported statistics disagree with their trial values
//! 3. lines: chart per-step metrics from a CSV
//!
//! Design philosophy:
//! - One bad log fails that log, never silently a partial figure
//! - Missing configurations stay visibly missing
//! - Verbose mode narrates on stderr; stdout carries only results

use std::collections::{HashMap, HashSet};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sweepmap::aggregation::{
    audit, audit::DEFAULT_TOLERANCE, build_grid, stats::sample_std_dev, Discrepancy, Grid,
};
use sweepmap::config::Config;
use sweepmap::extraction::LogParser;
use sweepmap::rendering::{
    figure_file_name, render_heatmap, render_series, FigureLabels, TerminalRenderer,
};
use sweepmap::series::SeriesTable;
use sweepmap::types::{FamilyDataset, FamilySchema, ParamKey, ParsedLog};

/// Parameter-sweep logs to sensitivity heatmaps
///
/// sweepmap reads the result logs of two-parameter sensitivity sweeps
/// (a Delta section and an Epsilon section of `key=value` result lines),
/// averages the repeated trials per configuration and renders one
/// annotated heatmap per family.
///
/// Examples:
///   sweepmap heatmap results.txt                 # Two PNGs in the current dir
///   sweepmap heatmap runs/*.txt -o figs --keep-going
///   sweepmap summary results.txt                 # Tables in the terminal
///   sweepmap lines metrics.csv --columns L_t,delta
#[derive(Parser, Debug)]
#[command(name = "sweepmap")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: sweepmap.toml or pyproject.toml [tool.sweepmap])
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    ///
    /// Shows progress on stderr and enables info-level logs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug-level logs (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one heatmap per family for each log
    Heatmap(HeatmapArgs),
    /// Print grids as terminal tables or JSON
    Summary(SummaryArgs),
    /// Render a line chart of per-step metrics from a CSV
    Lines(LinesArgs),
}

#[derive(Args, Debug)]
pub struct HeatmapArgs {
    /// Result logs to plot
    #[arg(required = true, value_name = "LOG")]
    pub logs: Vec<PathBuf>,

    /// Output directory
    ///
    /// With more than one log, each log gets a sub-directory named after
    /// its file stem.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output: PathBuf,

    /// Continue with the remaining logs when one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Which families to render
    #[arg(long, value_enum, default_value_t = FamilySelect::Both)]
    pub family: FamilySelect,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Result log to summarize
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Emit JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug)]
pub struct LinesArgs {
    /// Metrics CSV with a header row
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Output PNG
    #[arg(short, long, default_value = "metrics_plot.png", value_name = "FILE")]
    pub output: PathBuf,

    /// Rows to plot from the start of the table
    #[arg(long)]
    pub limit: Option<usize>,

    /// Columns to plot, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilySelect {
    First,
    Second,
    Both,
}

impl FamilySelect {
    fn includes_first(self) -> bool {
        matches!(self, FamilySelect::First | FamilySelect::Both)
    }

    fn includes_second(self) -> bool {
        matches!(self, FamilySelect::Second | FamilySelect::Both)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(cli.config.as_deref())?;
    if cli.verbose {
        eprintln!("🗺️  sweepmap v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("{}", config.display_summary());
    }

    match &cli.command {
        Command::Heatmap(args) => run_heatmap(args, &config, cli.verbose),
        Command::Summary(args) => run_summary(args, &config),
        Command::Lines(args) => run_lines(args, &config, cli.verbose),
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::from_path(path),
        None => {
            let cwd = std::env::current_dir().context("resolving current directory")?;
            Config::load(&cwd)
        }
    }
}

fn read_and_parse(parser: &LogParser, path: &Path) -> Result<ParsedLog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parser
        .parse(&text)
        .with_context(|| format!("parsing {}", path.display()))
}

/// Selected `(dataset, schema)` pairs of a parsed log, in source order.
fn selected<'a>(
    log: &'a ParsedLog,
    parser: &'a LogParser,
    select: FamilySelect,
) -> Vec<(&'a FamilyDataset, &'a FamilySchema)> {
    let schema = parser.schema();
    let mut out = Vec::with_capacity(2);
    if select.includes_first() {
        out.push((&log.first, &schema.first));
    }
    if select.includes_second() {
        out.push((&log.second, &schema.second));
    }
    out
}

/// Output directory for each log of a batch, in input order.
///
/// A single log writes straight into `base`. In a batch each log gets a
/// sub-directory named after its file stem; stems shared by several logs are
/// prefixed with the parent directory name, and any clash left after that
/// gets a numeric suffix.
fn output_dirs(base: &Path, logs: &[PathBuf]) -> Vec<PathBuf> {
    if logs.len() <= 1 {
        return vec![base.to_path_buf(); logs.len()];
    }
    let name = |s: Option<&std::ffi::OsStr>| s.map(|s| s.to_string_lossy().into_owned());
    let stems: Vec<String> = logs
        .iter()
        .map(|log| name(log.file_stem()).unwrap_or_else(|| "log".to_string()))
        .collect();

    let mut stem_counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *stem_counts.entry(stem.as_str()).or_default() += 1;
    }

    let mut taken: HashSet<String> = HashSet::new();
    logs.iter()
        .zip(&stems)
        .map(|(log, stem)| {
            let mut dir = stem.clone();
            if stem_counts[stem.as_str()] > 1 {
                if let Some(parent) = name(log.parent().and_then(|p| p.file_name())) {
                    dir = format!("{}_{}", parent, stem);
                }
            }
            let mut unique = dir.clone();
            let mut n = 2;
            while !taken.insert(unique.clone()) {
                unique = format!("{}-{}", dir, n);
                n += 1;
            }
            base.join(unique)
        })
        .collect()
}

/// Parse one log and write a heatmap per selected family.
///
/// Returns the written paths. A family with no records is reported and
/// skipped; it does not fail the log.
fn heatmap_one(
    path: &Path,
    parser: &LogParser,
    config: &Config,
    out_dir: &Path,
    select: FamilySelect,
) -> Result<Vec<PathBuf>> {
    let log = read_and_parse(parser, path)?;
    let mut written = Vec::new();

    for (dataset, schema) in selected(&log, parser, select) {
        let grid = build_grid(dataset);
        if grid.is_empty() {
            eprintln!(
                "⚠️  {}: no data for family {}, skipping",
                path.display(),
                schema.name
            );
            continue;
        }

        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;
        let target = out_dir.join(figure_file_name(&schema.title, "png"));
        render_heatmap(&grid, &FigureLabels::from(schema), &config.render, &target)
            .with_context(|| format!("rendering {} heatmap for {}", schema.name, path.display()))?;
        info!(family = %schema.name, output = %target.display(), "wrote heatmap");
        written.push(target);
    }

    Ok(written)
}

fn run_heatmap(args: &HeatmapArgs, config: &Config, verbose: bool) -> Result<()> {
    let parser = config.parser()?;
    let batch = args.logs.len();
    let start = std::time::Instant::now();

    if verbose {
        eprintln!("📂 Processing {} log(s) → {}", batch, args.output.display());
    }

    let jobs: Vec<(&PathBuf, PathBuf)> = args
        .logs
        .iter()
        .zip(output_dirs(&args.output, &args.logs))
        .collect();
    let process = |(path, out_dir): &(&PathBuf, PathBuf)| {
        heatmap_one(path, &parser, config, out_dir, args.family)
    };

    let written: Vec<PathBuf> = if args.keep_going {
        let results: Vec<(&PathBuf, Result<Vec<PathBuf>>)> =
            jobs.par_iter().map(|job| (job.0, process(job))).collect();

        let mut written = Vec::new();
        let mut failed = 0;
        for (path, result) in results {
            match result {
                Ok(files) => written.extend(files),
                Err(err) => {
                    failed += 1;
                    eprintln!("✗ {}: {:#}", path.display(), err);
                }
            }
        }
        if failed > 0 {
            print_written(&written);
            bail!("{} of {} logs failed", failed, batch);
        }
        written
    } else {
        let per_log: Vec<Vec<PathBuf>> = jobs
            .par_iter()
            .map(process)
            .collect::<Result<_>>()?;
        per_log.into_iter().flatten().collect()
    };

    print_written(&written);
    if verbose {
        eprintln!(
            "✓ Wrote {} figure(s) from {} log(s) ({:.2?})",
            written.len(),
            batch,
            start.elapsed()
        );
    }
    Ok(())
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

#[derive(Serialize)]
struct FamilySummary<'a> {
    family: &'a str,
    title: &'a str,
    records: usize,
    coverage: f64,
    rows: Vec<f64>,
    cols: Vec<f64>,
    /// Cell means, `null` where the configuration was not run.
    means: Vec<Vec<Option<f64>>>,
    /// Sample std dev of each cell's trials; `null` below two trials.
    sample_std: Vec<Vec<Option<f64>>>,
    discrepancies: Vec<Discrepancy>,
    #[serde(skip)]
    grid: Grid,
}

#[derive(Serialize)]
struct LogSummary<'a> {
    file: String,
    families: Vec<FamilySummary<'a>>,
}

fn summarize<'a>(path: &Path, log: &'a ParsedLog, parser: &'a LogParser) -> LogSummary<'a> {
    let families = selected(log, parser, FamilySelect::Both)
        .into_iter()
        .map(|(dataset, schema)| {
            let grid = build_grid(dataset);
            FamilySummary {
                family: &dataset.family,
                title: &schema.title,
                records: dataset.len(),
                coverage: grid.coverage(),
                rows: grid.row_keys().to_vec(),
                cols: grid.col_keys().to_vec(),
                means: grid.to_matrix(),
                sample_std: spread_matrix(dataset, &grid),
                discrepancies: audit(dataset, DEFAULT_TOLERANCE),
                grid,
            }
        })
        .collect();
    LogSummary {
        file: path.display().to_string(),
        families,
    }
}

/// Per-cell sample std dev, laid out like `Grid::to_matrix`.
fn spread_matrix(dataset: &FamilyDataset, grid: &Grid) -> Vec<Vec<Option<f64>>> {
    grid.row_keys()
        .iter()
        .map(|&r| {
            grid.col_keys()
                .iter()
                .map(|&c| {
                    dataset
                        .get(&ParamKey::new(r, c))
                        .and_then(|record| sample_std_dev(&record.trials))
                })
                .collect()
        })
        .collect()
}

fn run_summary(args: &SummaryArgs, config: &Config) -> Result<()> {
    let parser = config.parser()?;
    let log = read_and_parse(&parser, &args.log)?;
    let summary = summarize(&args.log, &log, &parser);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let color = !args.no_color && std::io::stdout().is_terminal();
    let renderer = TerminalRenderer::new(config.render.clone(), color);
    let schema = parser.schema();

    for (family, schema) in summary.families.iter().zip([&schema.first, &schema.second]) {
        println!("{}", renderer.render(&family.grid, &FigureLabels::from(schema)));
        for d in &family.discrepancies {
            println!(
                "  ⚠ line {}: ({}, {}) reported {:?} {} but trials give {:.4}",
                d.line, d.axis1, d.axis2, d.statistic, d.reported, d.recomputed
            );
        }
        println!();
    }
    Ok(())
}

fn run_lines(args: &LinesArgs, config: &Config, verbose: bool) -> Result<()> {
    let mut table = SeriesTable::from_path(&args.csv)?;
    let spec = {
        let mut spec = config.series.clone();
        if args.limit.is_some() {
            spec.limit = args.limit;
        }
        if !args.columns.is_empty() {
            spec.columns = args.columns.clone();
        }
        spec
    };

    if let Some(limit) = spec.limit {
        table.truncate(limit);
    }
    let columns = if spec.columns.is_empty() {
        table.plottable()
    } else {
        table.select(&spec.columns)
    };
    if columns.is_empty() {
        bail!(
            "none of the requested columns are in {} (available: {})",
            args.csv.display(),
            table.names().collect::<Vec<_>>().join(", ")
        );
    }

    if verbose {
        eprintln!(
            "📈 Plotting {} column(s) over {} row(s)",
            columns.len(),
            table.len()
        );
    }
    render_series(&columns, &spec, &config.render, &args.output)?;
    println!("{}", args.output.display());
    Ok(())
}
