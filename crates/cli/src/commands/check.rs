//! Single-project check

use anyhow::{Context, Result};
use colored::Colorize;

use super::{build_collector, emit, OutputTarget};
use crate::config::Settings;
use crate::output::{print_info, print_warning};

/// Check the clusters of one project
pub async fn run(settings: &Settings, project_id: &str, target: &OutputTarget) -> Result<()> {
    let collector = build_collector(settings, project_id)?;

    print_info(&format!("Checking project {}", project_id.cyan()));
    let report = collector
        .check_project(project_id)
        .await
        .with_context(|| format!("Check of project {} failed", project_id))?;

    if report.total_clusters == 0 {
        print_warning("Project has no clusters");
    }
    emit(&report, &report.rows(), target)
}
