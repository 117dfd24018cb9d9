//! Organization-wide collection

use anyhow::{Context, Result};
use colored::Colorize;

use super::{build_collector, emit, OutputTarget};
use crate::config::Settings;
use crate::output::print_info;

/// Collect every cluster of the configured organization
pub async fn run(settings: &Settings, target: &OutputTarget) -> Result<()> {
    let org_id = settings.org_id()?;
    let collector = build_collector(settings, org_id)?;

    print_info(&format!("Collecting inventory for organization {}", org_id.cyan()));
    let report = collector
        .collect_organization(org_id)
        .await
        .context("Inventory collection failed")?;

    emit(&report, &report.rows(), target)?;
    print_info(&format!(
        "Total clusters processed: {} across {} projects",
        report.total_clusters(),
        report.projects.len()
    ));
    Ok(())
}
