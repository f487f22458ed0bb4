use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_enrichment::app::{AnalysisReport, Pipeline};
use kira_enrichment::config::ConfigLoader;
use kira_enrichment::enrichment::EnrichmentTable;
use kira_enrichment::error::KiraError;
use kira_enrichment::fs_util::output_dir_status;
use kira_enrichment::meta::MetaTable;
use kira_enrichment::output::{JsonOutput, LogSink};
use kira_enrichment::quant::{QuantColumns, QuantTable};

#[derive(Parser)]
#[command(name = "kira-enrich")]
#[command(about = "Validate and consolidate enrichment results across experiments")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the full analysis described by kira-enrich.json")]
    Run(RunArgs),
    #[command(about = "Validate a single table and report its status")]
    Check(CheckArgs),
    #[command(about = "Report whether an output directory can be used")]
    Outdir(OutdirArgs),
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    out: Option<Utf8PathBuf>,

    #[arg(long)]
    min_support: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TableKind {
    Meta,
    Enrichment,
    Quant,
}

#[derive(Args)]
struct CheckArgs {
    kind: TableKind,

    path: Utf8PathBuf,

    #[arg(long, default_value = "experiment")]
    experiment: String,

    #[arg(long, default_value_t = 0)]
    gene_col: usize,

    #[arg(long, default_value_t = 1)]
    value_col: usize,
}

#[derive(Args)]
struct OutdirArgs {
    path: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(kira) = report.downcast_ref::<KiraError>() {
            return ExitCode::from(map_exit_code(kira));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &KiraError) -> u8 {
    match error {
        KiraError::Meta(_) | KiraError::Enrichment(_) | KiraError::Quant(_) => 2,
        KiraError::MissingConfig | KiraError::InvalidExperimentId(_) => 2,
        KiraError::InvalidOutputDir { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_analysis(args),
        Commands::Check(args) => run_check(args),
        Commands::Outdir(args) => {
            let status = output_dir_status(&args.path)?;
            println!("{status}");
            Ok(())
        }
    }
}

fn run_analysis(args: RunArgs) -> miette::Result<()> {
    let mut resolved = ConfigLoader::resolve(args.config.as_deref())?;
    if let Some(min_support) = args.min_support {
        resolved.min_support = min_support;
    }

    let report = Pipeline::run(&resolved, &LogSink)?;
    match args.out {
        Some(out) => {
            JsonOutput::write_report(&report, &out)?;
            print_summary(&report);
        }
        None => JsonOutput::print_report(&report).into_diagnostic()?,
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> miette::Result<()> {
    let outcome = match args.kind {
        TableKind::Meta => MetaTable::read(&args.path)
            .map(|table| format!("{} experiments", table.experiments.len())),
        TableKind::Enrichment => EnrichmentTable::read(&args.path, &args.experiment, None)
            .map(|table| format!("{} terms", table.terms.len())),
        TableKind::Quant => {
            let columns = QuantColumns {
                gene: args.gene_col,
                value: args.value_col,
            };
            QuantTable::read(&args.path, &args.experiment, columns)
                .map(|table| format!("{} genes", table.values.len()))
        }
    };

    match outcome {
        Ok(summary) => {
            println!("status=0 {}: {summary}", args.path);
            Ok(())
        }
        Err(err) => {
            let rejection = match &err {
                KiraError::Meta(inner) => Some((inner.status(), inner.message())),
                KiraError::Enrichment(inner) => Some((inner.status(), inner.message())),
                KiraError::Quant(inner) => Some((inner.status(), inner.message())),
                _ => None,
            };
            if let Some((status, message)) = rejection {
                println!("status={status} {}: {message}", args.path);
            }
            Err(err.into())
        }
    }
}

fn print_summary(report: &AnalysisReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}KIRA-ENRICH summary{reset}");
    for experiment in &report.experiments {
        println!(
            "{green}{}: {} terms, {} retained{reset}",
            experiment.id, experiment.terms, experiment.retained_terms
        );
    }
    println!(
        "{yellow}Removed {} terms with fewer than {} genes{reset}",
        report.removed_terms.len(),
        report.min_support
    );
}
