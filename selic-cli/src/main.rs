use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use selic_cli::app::{self, Notice, SimulationRequest};
use selic_cli::config::{Config, Overrides};
use selic_cli::utils::parse_decimal;
use selic_cli::{logging, report};
use selic_core::db::{DbConfig, RepositoryRegistry};
use selic_core::{ProjectionEngine, ProjectionInput};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Selic-indexed fixed-income simulator.
///
/// Projects the balance of an investment compounding at an annual rate,
/// withholds regressive income tax on the gain, and keeps a history of
/// saved simulations.
#[derive(Debug, Parser)]
#[command(name = "selic", version, about)]
struct Cli {
    /// Configuration file. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "selic.toml")]
    config: PathBuf,

    /// Storage backend for the history (overrides the config file).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// History connection string (overrides the config file).
    /// For SQLite this is a file path (e.g. `selic-history.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or filter directive (overrides the config file and RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Project an investment and print its summary.
    Simulate(SimulateArgs),
    /// List saved simulations, oldest first.
    History,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Amount invested at month 0.
    #[arg(long, value_parser = parse_decimal, allow_negative_numbers = true)]
    principal: Decimal,

    /// Amount added at the end of every month.
    #[arg(long, value_parser = parse_decimal, default_value = "0", allow_negative_numbers = true)]
    contribution: Decimal,

    /// Annual rate in percent, e.g. `12.75`.
    #[arg(long, value_parser = parse_decimal, allow_negative_numbers = true)]
    rate: Decimal,

    /// Investment term in months.
    #[arg(long)]
    months: u32,

    /// Alternative annual rate to compare against; repeat up to five times.
    #[arg(long = "compare", value_name = "RATE", value_parser = parse_decimal)]
    compare: Vec<Decimal>,

    /// Append the result to the history.
    #[arg(long)]
    save: bool,

    /// Write the month-by-month balances to a spreadsheet (.xlsx, or CSV when
    /// PATH ends in .csv).
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Print the month-by-month balance table.
    #[arg(long)]
    table: bool,
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn simulate(
    args: SimulateArgs,
    config: &Config,
    registry: &RepositoryRegistry,
    db: &DbConfig,
) -> anyhow::Result<()> {
    let request = SimulationRequest {
        input: ProjectionInput::new(args.principal, args.contribution, args.rate, args.months),
        comparison_rates: (!args.compare.is_empty()).then_some(args.compare),
        save: args.save,
        export_path: args.export,
    };

    let engine = ProjectionEngine::default();
    let ctx = app::Context {
        engine: &engine,
        registry,
        db,
        max_term_months: config.simulation.max_term_months,
    };
    let outcome = app::run_simulation(&ctx, &request, Utc::now())
        .await
        .context("simulation failed")?;

    print!("{}", report::render_summary(&outcome.simulation.base));
    if !outcome.simulation.scenarios.is_empty() {
        println!();
        print!("{}", report::render_comparison(&outcome.simulation.scenarios));
    }
    if args.table {
        println!();
        print!("{}", report::render_table(&outcome.simulation));
    }

    if let Some(id) = outcome.saved_id {
        println!();
        println!("Saved as simulation #{id}.");
    }
    if let Some(path) = &outcome.exported_to {
        println!("Exported to {}.", path.display());
    }
    print_notices(&outcome.notices);

    Ok(())
}

async fn history(
    registry: &RepositoryRegistry,
    db: &DbConfig,
) -> anyhow::Result<()> {
    match app::list_history(registry, db).await {
        Ok(records) => print!("{}", report::render_history(&records)),
        Err(e) => {
            warn!(error = %e, "could not read history");
            print_notices(&[Notice::PersistenceUnavailable(e.to_string())]);
        }
    }
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("notice: {notice}");
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default_logging();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?
        .with_overrides(Overrides {
            backend: cli.backend,
            connection_string: cli.db,
            log_level: cli.log_level.clone(),
        })?;

    // RUST_LOG wins over the file, an explicit flag wins over both.
    if cli.log_level.is_some() || !logging::env_filter_overridden() {
        logging::set_log_level(&config.logging.level)?;
    }
    if let Some(file) = &config.logging.file {
        logging::enable_file_logging(file)?;
    }

    let db_config = config.db_config();
    debug!(backend = %db_config.backend, "using history backend");
    let registry = app::build_registry();

    match cli.command {
        Command::Simulate(args) => simulate(args, &config, &registry, &db_config).await,
        Command::History => history(&registry, &db_config).await,
    }
}
