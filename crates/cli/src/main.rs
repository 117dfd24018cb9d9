//! Atlas inventory CLI
//!
//! Collects cluster inventory and utilization for a MongoDB Atlas
//! organization or a single project, and inspects the tier table used to
//! classify it.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{check, collect, tiers, OutputTarget};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// MongoDB Atlas cluster inventory and utilization
#[derive(Parser)]
#[command(name = "atlas-inventory")]
#[command(author, version, about = "MongoDB Atlas cluster inventory and utilization", long_about = None)]
pub struct Cli {
    /// Settings file (default: ~/.config/atlas-inventory/config.toml)
    #[arg(long, global = true, env = "ATLAS_INVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Atlas API public key
    #[arg(long, global = true)]
    pub public_key: Option<String>,

    /// Atlas API private key
    #[arg(long, global = true)]
    pub private_key: Option<String>,

    /// Atlas base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Tier table CSV
    #[arg(long = "tiers", global = true)]
    pub tiers_path: Option<PathBuf>,

    /// Threshold overrides CSV
    #[arg(long = "thresholds", global = true)]
    pub thresholds_path: Option<PathBuf>,

    /// Output format (inferred from --output when omitted)
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Log progress at info level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect every cluster of an organization
    Collect {
        /// Organization id
        #[arg(long)]
        org_id: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Check the clusters of a single project
    Check {
        /// Project (group) id
        project_id: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the tier table and effective thresholds
    Tiers,
}

/// Options shared by collection runs
#[derive(Args)]
pub struct RunArgs {
    /// Time window start, HH:MM (UTC)
    #[arg(long, requires = "end_time")]
    pub start_time: Option<String>,

    /// Time window end, HH:MM (UTC)
    #[arg(long, requires = "start_time")]
    pub end_time: Option<String>,

    /// Measurement granularity, ISO-8601 duration
    #[arg(long)]
    pub granularity: Option<String>,

    /// Measurement period, ISO-8601 duration
    #[arg(long)]
    pub period: Option<String>,

    /// Clusters of a project built concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-measurement timeout in seconds (0 disables)
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    pub http_timeout: Option<u64>,

    /// Output file; .csv writes CSV, anything else JSON
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        let mut overrides = config::Overrides {
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            base_url: self.base_url.clone(),
            tiers_path: self.tiers_path.clone(),
            thresholds_path: self.thresholds_path.clone(),
            ..Default::default()
        };

        let run = match &self.command {
            Commands::Collect { org_id, run } => {
                overrides.org_id = org_id.clone();
                run
            }
            Commands::Check { run, .. } => run,
            Commands::Tiers => return overrides,
        };

        overrides.window_start = run.start_time.clone();
        overrides.window_end = run.end_time.clone();
        overrides.granularity = run.granularity.clone();
        overrides.period = run.period.clone();
        overrides.concurrency = run.concurrency;
        overrides.fetch_timeout_secs = run.fetch_timeout;
        overrides.http_timeout_secs = run.http_timeout;
        overrides
    }

    fn target(&self, run: &RunArgs) -> OutputTarget {
        OutputTarget {
            format: self.format,
            output: run.output.clone(),
            pretty: run.pretty,
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let settings = config::Settings::load(cli.config.as_deref(), &cli.overrides())?;

    match &cli.command {
        Commands::Collect { run, .. } => {
            collect::run(&settings, &cli.target(run)).await?;
        }
        Commands::Check { project_id, run } => {
            check::run(&settings, project_id, &cli.target(run)).await?;
        }
        Commands::Tiers => {
            tiers::run(&settings, cli.format)?;
        }
    }

    Ok(())
}
