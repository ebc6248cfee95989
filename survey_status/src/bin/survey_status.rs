//! Command-line entry point.
//!
//! Usage:
//!   survey-status [--config survey.toml] make-fields
//!   survey-status progress [--json]
//!   survey-status obstime
//!   survey-status skymap
//!
//! Live exposure queries need the `postgres-repo` feature and
//! `DATABASE_URL` (or `PG_DATABASE_URL`); otherwise the exposure cache
//! must already exist.

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use survey_status::db;
use survey_status::pipeline::{self, StepOutput};
use survey_status::SurveyConfig;

#[derive(Parser)]
#[command(
    name = "survey-status",
    about = "Survey field completion and progress reporting",
    version
)]
struct Cli {
    /// Configuration file (default: survey.toml in the usual places)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label catalog fields from the exposure log and write the field-status file
    MakeFields,
    /// Print the progress table per program and band
    Progress {
        /// Emit the rows as JSON instead of text tables
        #[arg(long)]
        json: bool,
    },
    /// Summarise allocated, observed and good observing time
    Obstime,
    /// Build sky-coverage maps from the latest field-status file
    Skymap,
}

impl Commands {
    /// Steps that read the exposure log and so may need the live database.
    fn loads_exposures(&self) -> bool {
        !matches!(self, Commands::Skymap)
    }
}

fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = SurveyConfig::load(cli.config.as_deref())?;

    let live = if cli.command.loads_exposures() {
        db::live_source()
    } else {
        None
    };
    let live = live.as_deref();

    let output: StepOutput = match cli.command {
        Commands::MakeFields => {
            let today = chrono::Utc::now().date_naive();
            pipeline::run_make_fields(&config, live, today)?
        }
        Commands::Progress { json } => pipeline::run_progress(&config, live, json)?,
        Commands::Obstime => pipeline::run_obstime(&config, live)?,
        Commands::Skymap => pipeline::run_skymap(&config)?,
    };

    println!("{}", output.report);
    for path in &output.artifacts {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
