//! Tier table inspection

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use tabled::{settings::Style, Table, Tabled};

use super::load_tables;
use crate::config::Settings;
use crate::output::{print_warning, write_json, OutputFormat};
use inventory_lib::{ThresholdSpec, TierTable};

/// A tier with the tier directly below it
#[derive(Debug, Serialize, Tabled)]
struct TierRow {
    #[tabled(rename = "Rank")]
    sort_rank: i64,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "CPU")]
    cpu_cores: f64,
    #[tabled(rename = "RAM GB")]
    ram_gb: f64,
    #[tabled(rename = "IOPS")]
    iops: f64,
    #[tabled(rename = "Connections")]
    max_connections: f64,
    #[tabled(rename = "Next lower")]
    next_lower: String,
}

#[derive(Tabled)]
struct ThresholdRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Low usage %")]
    low_usage: f64,
    #[tabled(rename = "Lower tier %")]
    lower_tier: f64,
}

#[derive(Serialize)]
struct TierListing<'a> {
    tiers: &'a [TierRow],
    thresholds: BTreeMap<&'a str, ThresholdSpec>,
}

fn tier_rows(tiers: &TierTable) -> Vec<TierRow> {
    tiers
        .iter()
        .map(|spec| TierRow {
            sort_rank: spec.sort_rank,
            tier: spec.tier_name.clone(),
            cpu_cores: spec.cpu_cores,
            ram_gb: spec.ram_gb,
            iops: spec.iops,
            max_connections: spec.max_connections,
            next_lower: tiers
                .next_lower(&spec.tier_name)
                .map(|lower| lower.tier_name.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Print the loaded tier table and effective thresholds
pub fn run(settings: &Settings, format: Option<OutputFormat>) -> Result<()> {
    let (tiers, thresholds) = load_tables(settings)?;
    let rows = tier_rows(&tiers);

    match format.unwrap_or_default() {
        OutputFormat::Json => {
            let listing = TierListing {
                tiers: &rows,
                thresholds: thresholds.iter().map(|(m, s)| (m, *s)).collect(),
            };
            write_json(&listing, true, io::stdout().lock())?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout().lock());
            for row in &rows {
                writer.serialize(row).context("Failed to write CSV row")?;
            }
            writer.flush().context("Failed to flush CSV output")?;
        }
        OutputFormat::Table => {
            println!(
                "{} ({})",
                "Tier Table".bold(),
                settings.tiers_path.display().to_string().cyan()
            );
            if rows.is_empty() {
                print_warning("No tiers loaded; every cluster's flags will be unknown");
            } else {
                println!("{}", Table::new(&rows).with(Style::rounded()));
            }

            println!();
            println!("{}", "Thresholds".bold());
            let threshold_rows: Vec<ThresholdRow> = thresholds
                .iter()
                .map(|(metric, spec)| ThresholdRow {
                    metric: metric.to_string(),
                    low_usage: spec.low_usage_threshold,
                    lower_tier: spec.lower_tier_threshold,
                })
                .collect();
            println!("{}", Table::new(threshold_rows).with(Style::rounded()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_lib::TierSpec;

    #[test]
    fn test_rows_pair_each_tier_with_next_lower() {
        let spec = |name: &str, rank: i64| TierSpec {
            tier_name: name.to_string(),
            cpu_cores: 2.0,
            ram_gb: 2.0,
            iops: 3000.0,
            max_connections: 1500.0,
            sort_rank: rank,
        };
        let tiers = TierTable::from_specs(vec![spec("M20", 2), spec("M10", 1)], "test").unwrap();

        let rows = tier_rows(&tiers);

        assert_eq!(rows[0].tier, "M10");
        assert_eq!(rows[0].next_lower, "");
        assert_eq!(rows[1].tier, "M20");
        assert_eq!(rows[1].next_lower, "M10");
    }
}
