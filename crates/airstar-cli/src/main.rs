//! airstar CLI: clean, reshape, load and query airline flight data.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use airstar_core::config::{EtlConfig, WarehouseBackend};
use airstar_core::schema::ColumnTypes;
use airstar_core::RunReport;
use airstar_exec::Pipeline;
use airstar_model::{load_artifact, DimensionalModel, ExportSummary};
use airstar_warehouse::{open_sink, run_catalog, LoadReport, WarehouseLoader};

#[derive(Parser)]
#[command(name = "airstar")]
#[command(about = "Airline flight ETL: batch cleaning, star schema, warehouse load", long_about = None)]
struct Cli {
    /// YAML config file, applied over the built-in defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that take precedence over the config file and `AIRSTAR_*` variables.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Raw source CSV
    #[arg(long, global = true)]
    source: Option<String>,

    /// Compressed cleaned artifact
    #[arg(long, global = true)]
    artifact: Option<String>,

    /// Rows per cleaning batch
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Rows re-read by the integrity check
    #[arg(long, global = true)]
    sample_rows: Option<usize>,

    /// zstd level for the artifact
    #[arg(long, global = true, allow_hyphen_values = true)]
    compression_level: Option<i32>,

    /// Output directory for model tables
    #[arg(long, global = true)]
    tables_dir: Option<String>,

    /// Warehouse backend: sqlite or postgres
    #[arg(long, global = true)]
    warehouse: Option<WarehouseBackend>,

    /// Warehouse table name
    #[arg(long, global = true)]
    table: Option<String>,

    /// Rows per warehouse append
    #[arg(long, global = true)]
    load_batch_size: Option<usize>,

    /// SQLite database file
    #[arg(long, global = true)]
    sqlite_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the source file into the compressed artifact
    Clean {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the star schema from the artifact and write one CSV per table
    Model,

    /// Load the artifact into the warehouse table
    Load,

    /// Run the canned analytical queries against the warehouse
    Report {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean, model, load and report in one go
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let mut cfg = EtlConfig::load(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&mut cfg, &cli.overrides);
    cfg.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Clean { json } => {
            let report = clean(&cfg)?;
            print_report(&report, json)?;
            Ok(exit_for(&report))
        }
        Commands::Model => {
            let summary = model(&cfg)?;
            Ok(if summary.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Load => {
            load(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Report { json } => {
            report(&cfg, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { json } => {
            let run = clean(&cfg)?;
            print_report(&run, json)?;
            if !run.is_success() {
                return Ok(ExitCode::FAILURE);
            }
            let summary = model(&cfg)?;
            load(&cfg)?;
            report(&cfg, false)?;
            Ok(if summary.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn apply_overrides(cfg: &mut EtlConfig, o: &Overrides) {
    if let Some(v) = &o.source {
        cfg.clean.source_path = v.clone();
    }
    if let Some(v) = &o.artifact {
        cfg.clean.artifact_path = v.clone();
    }
    if let Some(v) = o.batch_size {
        cfg.clean.batch_size = v;
    }
    if let Some(v) = o.sample_rows {
        cfg.clean.sample_rows = v;
    }
    if let Some(v) = o.compression_level {
        cfg.clean.compression_level = v;
    }
    if let Some(v) = &o.tables_dir {
        cfg.model.tables_dir = v.clone();
    }
    if let Some(v) = o.warehouse {
        cfg.warehouse.backend = v;
    }
    if let Some(v) = &o.table {
        cfg.warehouse.table = v.clone();
    }
    if let Some(v) = o.load_batch_size {
        cfg.warehouse.load_batch_size = v;
    }
    if let Some(v) = &o.sqlite_path {
        cfg.warehouse.sqlite_path = v.clone();
    }
}

fn clean(cfg: &EtlConfig) -> Result<RunReport> {
    let mut pipeline = Pipeline::from_config(cfg);
    let report = pipeline.run().context("cleaning could not start")?;
    Ok(report)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if report.is_success() {
        println!("✓ Cleaning completed");
    } else {
        println!("✗ Cleaning stopped: {}", report.error.as_deref().unwrap_or("unknown error"));
    }
    println!("  Batches: {}", report.batches);
    println!("  Rows read: {}", report.rows_read);
    println!("  Rows written: {}", report.rows_written);
    println!("  Integrity: {:?}", report.integrity);
    if let Some(digest) = &report.artifact_digest {
        println!("  Artifact digest: {digest}");
    }
    println!("  Duration: {}ms", report.duration_ms());
    Ok(())
}

fn exit_for(report: &RunReport) -> ExitCode {
    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn model(cfg: &EtlConfig) -> Result<ExportSummary> {
    let artifact = Path::new(&cfg.clean.artifact_path);
    let data = load_artifact(artifact, cfg.clean.batch_size, &ColumnTypes::cleaned_airline())
        .with_context(|| format!("reading {}", artifact.display()))?;
    let model = DimensionalModel::build(&data).context("building the dimensional model")?;
    let summary = model.export(Path::new(&cfg.model.tables_dir))?;

    for (name, rows) in &summary.written {
        println!("✓ {name}: {rows} rows");
    }
    for name in &summary.skipped {
        println!("- {name}: empty, not written");
    }
    for (name, err) in &summary.failed {
        println!("✗ {name}: {err}");
    }
    Ok(summary)
}

fn load(cfg: &EtlConfig) -> Result<LoadReport> {
    let mut sink = open_sink(&cfg.warehouse).context("opening the warehouse")?;
    let loader = WarehouseLoader::from_config(&cfg.warehouse);
    let report = loader
        .load(Path::new(&cfg.clean.artifact_path), sink.as_mut())
        .context("loading the warehouse")?;
    println!(
        "✓ Loaded {} rows into '{}' in {} batches",
        report.rows, report.table, report.batches
    );
    Ok(report)
}

fn report(cfg: &EtlConfig, json: bool) -> Result<()> {
    let mut sink = open_sink(&cfg.warehouse).context("opening the warehouse")?;
    let results = run_catalog(sink.as_mut(), &cfg.warehouse.table)?;
    if json {
        let doc: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(name, rs)| Ok((name.to_string(), serde_json::to_value(rs)?)))
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }
    for (name, rs) in &results {
        println!("\n{name}");
        print!("{rs}");
    }
    Ok(())
}
