//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use inventory_lib::FlatClusterRow;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default on a terminal)
    #[default]
    Table,
    /// Nested JSON report
    Json,
    /// One CSV row per cluster
    Csv,
}

impl OutputFormat {
    /// Explicit `--format` wins; otherwise the output file's extension,
    /// falling back to JSON for files and a table for stdout
    pub fn resolve(explicit: Option<Self>, output: Option<&Path>) -> Self {
        if let Some(format) = explicit {
            return format;
        }
        match output {
            None => Self::Table,
            Some(path) => match path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .as_deref()
            {
                Some("csv") => Self::Csv,
                _ => Self::Json,
            },
        }
    }
}

/// Condensed per-cluster row for terminal output
#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "CPU avg %")]
    cpu_avg: String,
    #[tabled(rename = "Mem max GB")]
    memory_max: String,
    #[tabled(rename = "IOPS avg")]
    iops_avg: String,
    #[tabled(rename = "Disk max GB")]
    disk_max: String,
    #[tabled(rename = "Conns max")]
    connections_max: String,
    #[tabled(rename = "Low use")]
    low_use: String,
    #[tabled(rename = "Fits lower")]
    fits_lower: String,
}

impl From<&FlatClusterRow> for ClusterRow {
    fn from(row: &FlatClusterRow) -> Self {
        let low: Vec<&str> = [
            (row.low_cpu_use, "cpu"),
            (row.low_memory_use, "mem"),
            (row.low_iops_use, "iops"),
            (row.low_disk_use, "disk"),
            (row.low_connections_use, "conns"),
        ]
        .into_iter()
        .filter(|(flag, _)| *flag == Some(true))
        .map(|(_, name)| name)
        .collect();

        let project = if row.project_name.is_empty() {
            row.project_id.clone()
        } else {
            row.project_name.clone()
        };

        Self {
            project,
            cluster: row.cluster_name.clone(),
            tier: row.tier.clone().unwrap_or_else(|| "-".to_string()),
            cpu_avg: format_number(row.cpu_avg_percent),
            memory_max: format_number(row.memory_max_gb),
            iops_avg: format_number(row.iops_avg),
            disk_max: format_number(row.disk_usage_max_gb),
            connections_max: format_number(row.connections_max),
            low_use: if low.is_empty() {
                "-".to_string()
            } else {
                low.join(",")
            },
            fits_lower: color_fit(row.fits_lower_tier, row.lower_tier_name.as_deref()),
        }
    }
}

/// Print cluster rows as a table
pub fn print_cluster_table(rows: &[FlatClusterRow]) {
    if rows.is_empty() {
        println!("{}", "No clusters found".yellow());
        return;
    }
    let rows: Vec<ClusterRow> = rows.iter().map(ClusterRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Serialize `value` as JSON
pub fn write_json<T: Serialize, W: Write>(value: &T, pretty: bool, mut writer: W) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)
    } else {
        serde_json::to_writer(&mut writer, value)
    }
    .context("Failed to serialize JSON output")?;
    writeln!(writer)?;
    Ok(())
}

/// Write one CSV row per cluster, header first
pub fn write_csv<W: Write>(rows: &[FlatClusterRow], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        writer
            .write_record(CSV_HEADER)
            .context("Failed to write CSV header")?;
    }
    for row in rows {
        writer.serialize(row).context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Header used when there is no row to derive it from
const CSV_HEADER: &[&str] = &[
    "project_name",
    "project_id",
    "cluster_name",
    "cluster_id",
    "cluster_type",
    "mongodb_version",
    "state",
    "provider",
    "region",
    "tier",
    "disk_size_gb",
    "created_at",
    "process_hostname",
    "cpu_max_percent",
    "cpu_avg_percent",
    "memory_max_gb",
    "memory_avg_gb",
    "iops_max",
    "iops_avg",
    "connections_max",
    "connections_avg",
    "read_ops_max",
    "read_ops_avg",
    "write_ops_max",
    "write_ops_avg",
    "disk_usage_max_gb",
    "disk_usage_avg_gb",
    "disk_available_gb",
    "low_cpu_use",
    "low_memory_use",
    "low_iops_use",
    "low_disk_use",
    "low_connections_use",
    "fits_lower_tier",
    "lower_tier_name",
];

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an optional statistic, `-` when unknown
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

/// Color a lower-tier verdict
pub fn color_fit(fits: Option<bool>, lower_tier: Option<&str>) -> String {
    match (fits, lower_tier) {
        (Some(true), Some(tier)) => format!("yes ({})", tier).green().to_string(),
        (Some(false), _) => "no".red().to_string(),
        (None, Some(_)) => "unknown".yellow().to_string(),
        _ => "-".to_string(),
    }
}
