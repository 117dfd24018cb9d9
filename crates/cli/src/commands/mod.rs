//! CLI subcommands and the plumbing they share

pub mod check;
pub mod collect;
pub mod tiers;

use anyhow::{Context, Result};
use inventory_lib::{
    ClusterRecordBuilder, FlatClusterRow, InventoryCollector, RunLogger, ThresholdConfig,
    TierTable,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::AtlasClient;
use crate::config::Settings;
use crate::output::{self, OutputFormat};

/// Where and how a report is written
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub pretty: bool,
}

/// Tier and threshold tables; either failing to parse aborts before any API call
pub fn load_tables(settings: &Settings) -> Result<(TierTable, ThresholdConfig)> {
    let tiers = TierTable::load(&settings.tiers_path)?;
    let thresholds = ThresholdConfig::load(settings.thresholds_path.as_deref())?;
    Ok((tiers, thresholds))
}

/// Validate settings and wire the collector for a run scoped to `scope`
pub fn build_collector(settings: &Settings, scope: &str) -> Result<InventoryCollector> {
    let (public_key, private_key) = settings.credentials()?;
    let options = settings.collection_options()?;
    let (tiers, thresholds) = load_tables(settings)?;

    let client = AtlasClient::new(
        &settings.base_url,
        public_key,
        private_key,
        settings.http_timeout(),
    )?;

    let builder = ClusterRecordBuilder::new(
        Arc::new(client),
        Arc::new(tiers),
        Arc::new(thresholds),
        options,
        RunLogger::new(scope),
    );
    Ok(InventoryCollector::new(builder).with_concurrency(settings.concurrency))
}

/// Write a report: nested JSON, flat CSV, or a terminal table
pub fn emit<T: Serialize>(report: &T, rows: &[FlatClusterRow], target: &OutputTarget) -> Result<()> {
    let format = OutputFormat::resolve(target.format, target.output.as_deref());

    match &target.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            write_report(report, rows, format, target.pretty, BufWriter::new(file))?;
            output::print_success(&format!("Results written to: {}", path.display()));
        }
        None if format == OutputFormat::Table => output::print_cluster_table(rows),
        None => write_report(report, rows, format, target.pretty, io::stdout().lock())?,
    }
    Ok(())
}

fn write_report<T: Serialize, W: io::Write>(
    report: &T,
    rows: &[FlatClusterRow],
    format: OutputFormat,
    pretty: bool,
    writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Csv => output::write_csv(rows, writer),
        // A table in a file is written as JSON
        OutputFormat::Json | OutputFormat::Table => output::write_json(report, pretty, writer),
    }
}
