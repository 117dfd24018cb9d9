//! Structured run logging
//!
//! Every lifecycle event of a collection run is emitted through `tracing`
//! with an `event` field so JSON log consumers can filter on it.

use crate::error::InventoryError;
use crate::models::ClusterUsageRecord;
use tracing::{info, warn};

/// Structured logger scoped to one collection run
#[derive(Debug, Clone)]
pub struct RunLogger {
    scope: String,
}

impl RunLogger {
    /// `scope` is the organization or project id the run covers
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn log_run_start(&self, tiers: usize, window: Option<String>) {
        info!(
            event = "run_started",
            scope = %self.scope,
            tiers = tiers,
            time_window = ?window,
            "Starting inventory collection"
        );
    }

    pub fn log_project(&self, project_id: &str, project_name: &str, clusters: usize) {
        info!(
            event = "project_listed",
            scope = %self.scope,
            project_id = %project_id,
            project_name = %project_name,
            clusters = clusters,
            "Processing project"
        );
    }

    pub fn log_process_unmatched(&self, project_id: &str, cluster: &str) {
        warn!(
            event = "process_unmatched",
            scope = %self.scope,
            project_id = %project_id,
            cluster = %cluster,
            "No process matched cluster, metrics unavailable"
        );
    }

    pub fn log_metric_degraded(&self, project_id: &str, cluster: &str, error: &InventoryError) {
        warn!(
            event = "metric_degraded",
            scope = %self.scope,
            project_id = %project_id,
            cluster = %cluster,
            error = %error,
            "Metric fetch failed, statistics left empty"
        );
    }

    pub fn log_unknown_tier(&self, cluster: &str, tier: Option<&str>) {
        warn!(
            event = "tier_unknown",
            scope = %self.scope,
            cluster = %cluster,
            tier = ?tier,
            "Tier not in tier table, flags left empty"
        );
    }

    pub fn log_cluster(&self, project_id: &str, record: &ClusterUsageRecord) {
        info!(
            event = "cluster_collected",
            scope = %self.scope,
            project_id = %project_id,
            cluster = %record.identity.name,
            tier = ?record.identity.tier,
            state = ?record.identity.state,
            cpu_avg_percent = ?record.metrics.cpu.avg,
            memory_max_gb = ?record.metrics.memory.max,
            fits_lower_tier = ?record.flags.fits_lower_tier,
            "Collected cluster usage"
        );
    }

    pub fn log_run_complete(&self, projects: usize, clusters: usize) {
        info!(
            event = "run_completed",
            scope = %self.scope,
            projects = projects,
            clusters = clusters,
            "Inventory collection complete"
        );
    }
}
