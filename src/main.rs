use clap::Parser;
use hub_populate::config::AppConfig;
use hub_populate::error::AppError;
use hub_populate::pipeline::{self, PipelineOptions};
use hub_populate::store::SqliteStore;
use hub_populate::telemetry;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "hub-populate",
    about = "Populate the membership hub database from exported source files",
    version
)]
struct Cli {
    /// Directory holding the source data files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Directory receiving the per-run log file
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
    /// Run only the named importer
    #[arg(long)]
    importer: Option<String>,
    /// Override the configured database path
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn main() {
    match run_cli() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("application error: {err}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every importer that ran succeeded.
fn run_cli() -> Result<bool, AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    let log_path = telemetry::init(&config.telemetry, &cli.log_dir)?;
    info!(
        "populating {} from {} (log file {})",
        config.db_path.display(),
        cli.data_dir.display(),
        log_path.display()
    );

    let mut store = SqliteStore::open(&config.db_path)?;
    let options = PipelineOptions {
        data_dir: cli.data_dir,
        only: cli.importer,
    };
    let report = pipeline::run(&mut store, &options)?;

    if !report.all_succeeded() {
        for run in report.runs.iter().filter(|run| !run.succeeded()) {
            error!("{} importer did not succeed", run.name);
        }
        return Ok(false);
    }
    Ok(true)
}
