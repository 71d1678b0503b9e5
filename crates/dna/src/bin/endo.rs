//! `endo` - run an Endo DNA program and print the RNA it emits.
//!
//! ```text
//! endo endo.dna > endo.rna
//! endo --prefix IIPIFFCPICICIICPIICIPPPICIIC --max-iterations 100000 endo.dna.gz
//! endo --format json - < small.dna
//! endo --coverage endo.cov endo.dna > /dev/null
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use endo_dna::{load_dna, Coverage, EngineConfig, Error, Machine, Rna, SpliceStrategy};
use endo_rope::Rope;
use serde::Serialize;
use tracing::Level;

#[derive(Parser)]
#[command(name = "endo")]
#[command(about = "Run an Endo DNA program and print the RNA it emits")]
struct Args {
    /// DNA file to run (`.gz` is decompressed), or `-` to read stdin
    dna: PathBuf,

    /// Bases placed in front of the DNA before running
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// TOML file with engine settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many iterations
    #[arg(short = 'n', long)]
    max_iterations: Option<u64>,

    /// How matches are written back into the DNA
    #[arg(long, value_enum)]
    splice: Option<Splice>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write an annotated source listing with per-base usage to this file
    #[arg(long, value_name = "FILE")]
    coverage: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Splice {
    Collapse,
    Full,
}

impl From<Splice> for SpliceStrategy {
    fn from(splice: Splice) -> Self {
        match splice {
            Splice::Collapse => SpliceStrategy::Collapse,
            Splice::Full => SpliceStrategy::Full,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// One RNA per line
    Text,
    /// A single JSON report
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    iterations: u64,
    emitted: u64,
    finished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    halted: Option<String>,
    rna: &'a [Rna],
    #[serde(skip_serializing_if = "Option::is_none")]
    coverage: Option<&'a Coverage>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();
}

fn run(args: &Args) -> Result<(), Error> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(max) = args.max_iterations {
        config.max_iterations = Some(max);
    }
    if let Some(splice) = args.splice {
        config.splice = splice.into();
    }
    if args.coverage.is_some() {
        config.coverage = true;
    }

    let dna = load_dna(&args.dna)?;
    let prefix: Rope = args.prefix.parse()?;
    let mut machine = Machine::with_prefix(&prefix, &dna, config);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.format {
        Format::Text => {
            while !machine.is_finished() && !machine.limit_reached() {
                for rna in machine.step() {
                    writeln!(out, "{rna}")?;
                }
            }
            out.flush()?;
            let summary = machine.summary();
            let note = if summary.finished { "" } else { " (iteration limit)" };
            eprintln!("{} iterations, {} RNA{note}", summary.iterations, summary.emitted);
        }
        Format::Json => {
            let mut rna = Vec::new();
            let summary = machine.run(|r| rna.push(r));
            let report = Report {
                iterations: summary.iterations,
                emitted: summary.emitted,
                finished: summary.finished,
                halted: machine.error().map(ToString::to_string),
                rna: &rna,
                coverage: machine.coverage(),
            };
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
            out.flush()?;
        }
    }

    if let (Some(path), Some(coverage)) = (&args.coverage, machine.coverage()) {
        let mut listing = BufWriter::new(File::create(path)?);
        coverage.write_listing(&dna, &mut listing)?;
        listing.flush()?;
    }
    match machine.error() {
        Some(err) => Err(err.clone().into()),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("endo: {err}");
            ExitCode::FAILURE
        }
    }
}
