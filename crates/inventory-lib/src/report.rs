//! Report model
//!
//! Two shapes of the same data:
//! - nested reports ([`InventoryReport`], [`ProjectCheckReport`]) for JSON
//! - [`FlatClusterRow`], one row per cluster, for CSV and terminal tables

use crate::metrics::TimeWindow;
use crate::models::{ClusterUsageRecord, MetricStats};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of an organization-wide collection run
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub organization_id: String,
    pub collection_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    pub projects: Vec<ProjectReport>,
}

impl InventoryReport {
    pub fn total_clusters(&self) -> usize {
        self.projects.iter().map(|p| p.clusters.len()).sum()
    }

    /// Flatten to one row per cluster, in report order
    pub fn rows(&self) -> Vec<FlatClusterRow> {
        self.projects
            .iter()
            .flat_map(|project| {
                project
                    .clusters
                    .iter()
                    .map(|c| FlatClusterRow::from_record(&project.project_name, &project.project_id, c))
            })
            .collect()
    }
}

/// Clusters of one project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project_id: String,
    pub project_name: String,
    pub clusters: Vec<ClusterUsageRecord>,
}

/// Result of checking a single project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectCheckReport {
    pub project_id: String,
    pub check_timestamp: DateTime<Utc>,
    pub total_clusters: usize,
    pub clusters: Vec<ClusterUsageRecord>,
}

impl ProjectCheckReport {
    pub fn new(project_id: impl Into<String>, clusters: Vec<ClusterUsageRecord>) -> Self {
        Self {
            project_id: project_id.into(),
            check_timestamp: Utc::now(),
            total_clusters: clusters.len(),
            clusters,
        }
    }

    /// The project name is not known to a check run; it is left blank
    pub fn rows(&self) -> Vec<FlatClusterRow> {
        self.clusters
            .iter()
            .map(|c| FlatClusterRow::from_record("", &self.project_id, c))
            .collect()
    }
}

/// One cluster as a flat row; numeric values rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatClusterRow {
    pub project_name: String,
    pub project_id: String,
    pub cluster_name: String,
    pub cluster_id: String,
    pub cluster_type: Option<String>,
    pub mongodb_version: Option<String>,
    pub state: Option<String>,
    pub provider: Option<String>,
    pub region: Option<String>,
    pub tier: Option<String>,
    pub disk_size_gb: Option<f64>,
    pub created_at: Option<String>,
    pub process_hostname: Option<String>,
    pub cpu_max_percent: Option<f64>,
    pub cpu_avg_percent: Option<f64>,
    pub memory_max_gb: Option<f64>,
    pub memory_avg_gb: Option<f64>,
    pub iops_max: Option<f64>,
    pub iops_avg: Option<f64>,
    pub connections_max: Option<f64>,
    pub connections_avg: Option<f64>,
    pub read_ops_max: Option<f64>,
    pub read_ops_avg: Option<f64>,
    pub write_ops_max: Option<f64>,
    pub write_ops_avg: Option<f64>,
    pub disk_usage_max_gb: Option<f64>,
    pub disk_usage_avg_gb: Option<f64>,
    pub disk_available_gb: Option<f64>,
    pub low_cpu_use: Option<bool>,
    pub low_memory_use: Option<bool>,
    pub low_iops_use: Option<bool>,
    pub low_disk_use: Option<bool>,
    pub low_connections_use: Option<bool>,
    pub fits_lower_tier: Option<bool>,
    pub lower_tier_name: Option<String>,
}

impl FlatClusterRow {
    pub fn from_record(project_name: &str, project_id: &str, record: &ClusterUsageRecord) -> Self {
        let identity = &record.identity;
        let metrics = &record.metrics;
        let flags = &record.flags;
        let (cpu_max_percent, cpu_avg_percent) = rounded(metrics.cpu);
        let (memory_max_gb, memory_avg_gb) = rounded(metrics.memory);
        let (iops_max, iops_avg) = rounded(metrics.iops);
        let (connections_max, connections_avg) = rounded(metrics.connections);
        let (read_ops_max, read_ops_avg) = rounded(metrics.read_ops);
        let (write_ops_max, write_ops_avg) = rounded(metrics.write_ops);
        let (disk_usage_max_gb, disk_usage_avg_gb) = rounded(metrics.disk);

        Self {
            project_name: project_name.to_string(),
            project_id: project_id.to_string(),
            cluster_name: identity.name.clone(),
            cluster_id: identity.id.clone(),
            cluster_type: identity.cluster_type.clone(),
            mongodb_version: identity.mongodb_version.clone(),
            state: identity.state.clone(),
            provider: identity.provider.clone(),
            region: identity.region.clone(),
            tier: identity.tier.clone(),
            disk_size_gb: identity.disk_size_gb,
            created_at: identity.created_at.clone(),
            process_hostname: record.process_hostname.clone(),
            cpu_max_percent,
            cpu_avg_percent,
            memory_max_gb,
            memory_avg_gb,
            iops_max,
            iops_avg,
            connections_max,
            connections_avg,
            read_ops_max,
            read_ops_avg,
            write_ops_max,
            write_ops_avg,
            disk_usage_max_gb,
            disk_usage_avg_gb,
            disk_available_gb: record.disk_available_gb.map(round2),
            low_cpu_use: flags.low_cpu_use,
            low_memory_use: flags.low_memory_use,
            low_iops_use: flags.low_iops_use,
            low_disk_use: flags.low_disk_use,
            low_connections_use: flags.low_connections_use,
            fits_lower_tier: flags.fits_lower_tier,
            lower_tier_name: flags.lower_tier.as_ref().map(|l| l.tier.clone()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn rounded(stats: MetricStats) -> (Option<f64>, Option<f64>) {
    (stats.max.map(round2), stats.avg.map(round2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterIdentity, LowerTierAssessment, UsageFlags, UsageStats};

    fn record(name: &str) -> ClusterUsageRecord {
        let identity = ClusterIdentity {
            name: name.to_string(),
            id: format!("id-{}", name),
            tier: Some("M30".to_string()),
            disk_size_gb: Some(40.0),
            mongo_uri: Some("mongodb://secret-host:27017".to_string()),
            ..Default::default()
        };
        let metrics = UsageStats {
            cpu: MetricStats {
                max: Some(33.3333),
                avg: Some(12.005),
            },
            disk: MetricStats {
                max: Some(10.0),
                avg: Some(9.0),
            },
            ..Default::default()
        };
        let flags = UsageFlags {
            low_cpu_use: Some(true),
            fits_lower_tier: Some(false),
            lower_tier: Some(LowerTierAssessment {
                tier: "M20".to_string(),
                cpu: Some(true),
                memory: Some(false),
                iops: Some(true),
                connections: Some(true),
            }),
            ..Default::default()
        };
        ClusterUsageRecord::new(identity, Some("host-0".to_string()), metrics, flags)
    }

    fn report() -> InventoryReport {
        InventoryReport {
            organization_id: "org-1".to_string(),
            collection_timestamp: Utc::now(),
            time_window: None,
            projects: vec![
                ProjectReport {
                    project_id: "p1".to_string(),
                    project_name: "Shop".to_string(),
                    clusters: vec![record("orders"), record("carts")],
                },
                ProjectReport {
                    project_id: "p2".to_string(),
                    project_name: "Empty".to_string(),
                    clusters: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_rows_follow_report_order() {
        let report = report();
        let rows = report.rows();

        assert_eq!(report.total_clusters(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cluster_name, "orders");
        assert_eq!(rows[1].cluster_name, "carts");
        assert_eq!(rows[0].project_name, "Shop");
    }

    #[test]
    fn test_row_rounds_and_keeps_nulls() {
        let row = FlatClusterRow::from_record("Shop", "p1", &record("orders"));

        assert_eq!(row.cpu_max_percent, Some(33.33));
        assert_eq!(row.memory_max_gb, None);
        assert_eq!(row.disk_available_gb, Some(30.0));
        assert_eq!(row.low_memory_use, None);
        assert_eq!(row.fits_lower_tier, Some(false));
        assert_eq!(row.lower_tier_name.as_deref(), Some("M20"));
    }

    #[test]
    fn test_nested_json_shape() {
        let json = serde_json::to_value(report()).unwrap();

        assert!(json.get("time_window").is_none());
        let cluster = &json["projects"][0]["clusters"][0];
        assert_eq!(cluster["cluster_name"], "orders");
        assert_eq!(cluster["metrics"]["memory"]["max"], serde_json::Value::Null);
        assert_eq!(cluster["lower_tier"]["memory"], false);
        assert_eq!(cluster["low_disk_use"], serde_json::Value::Null);
        assert!(cluster.get("mongo_uri").is_none());
    }

    #[test]
    fn test_window_serialized_when_set() {
        let mut report = report();
        report.time_window = Some(TimeWindow::parse("14:00", "23:59").unwrap());

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["time_window"], "14:00-23:59");
    }

    #[test]
    fn test_check_report_counts_clusters() {
        let check = ProjectCheckReport::new("p1", vec![record("orders")]);

        assert_eq!(check.total_clusters, 1);
        assert_eq!(check.rows()[0].project_id, "p1");
    }
}
