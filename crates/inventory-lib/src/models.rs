//! Core data models for cluster inventory

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped measurement value; `value` is `None` for gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl MetricSample {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// Summary statistics of one logical metric
///
/// Both fields are `None` when no qualifying sample existed; `Some(0.0)` is
/// a real measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl MetricStats {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.max.is_none() && self.avg.is_none()
    }

    /// Divide both statistics by `divisor` (unit conversion)
    pub fn scaled(self, divisor: f64) -> Self {
        Self {
            max: self.max.map(|v| v / divisor),
            avg: self.avg.map(|v| v / divisor),
        }
    }
}

/// Atlas project (group) in an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

/// A mongod/mongos process reported for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: String,
    pub hostname: String,
    pub user_alias: Option<String>,
    pub type_name: Option<String>,
}

impl ProcessInfo {
    pub fn is_primary(&self) -> bool {
        self.type_name.as_deref() == Some("REPLICA_PRIMARY")
    }
}

/// Identity fields of a cluster as listed by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    #[serde(rename = "cluster_name")]
    pub name: String,
    #[serde(rename = "cluster_id")]
    pub id: String,
    pub cluster_type: Option<String>,
    pub mongodb_version: Option<String>,
    pub state: Option<String>,
    pub provider: Option<String>,
    pub region: Option<String>,
    pub tier: Option<String>,
    pub disk_size_gb: Option<f64>,
    pub created_at: Option<String>,
    /// Connection string used to match processes; not part of the report
    #[serde(skip)]
    pub mongo_uri: Option<String>,
}

/// Aggregated statistics for every metric of one cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Normalized CPU, percent
    pub cpu: MetricStats,
    /// Used system memory, GB
    pub memory: MetricStats,
    /// Disk partition IOPS
    pub iops: MetricStats,
    /// Storage used, GB
    pub disk: MetricStats,
    pub connections: MetricStats,
    /// Read operations per second
    pub read_ops: MetricStats,
    /// Write operations per second
    pub write_ops: MetricStats,
}

/// Per-metric verdicts against the next lower tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LowerTierAssessment {
    pub tier: String,
    pub cpu: Option<bool>,
    pub memory: Option<bool>,
    pub iops: Option<bool>,
    pub connections: Option<bool>,
}

impl LowerTierAssessment {
    /// Three-valued AND: `false` if any metric fails, `None` if none fail
    /// but at least one is unknown, `true` otherwise
    pub fn fits(&self) -> Option<bool> {
        let verdicts = [self.cpu, self.memory, self.iops, self.connections];
        if verdicts.contains(&Some(false)) {
            Some(false)
        } else if verdicts.contains(&None) {
            None
        } else {
            Some(true)
        }
    }
}

/// Derived utilization flags
///
/// Low-usage flags are `Some(true)` or `None`, never `Some(false)`.
/// `fits_lower_tier` uses all three states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageFlags {
    pub low_cpu_use: Option<bool>,
    pub low_memory_use: Option<bool>,
    pub low_iops_use: Option<bool>,
    pub low_disk_use: Option<bool>,
    pub low_connections_use: Option<bool>,
    pub fits_lower_tier: Option<bool>,
    pub lower_tier: Option<LowerTierAssessment>,
}

impl UsageFlags {
    /// Flags for a cluster whose tier is unknown
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Final per-cluster record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterUsageRecord {
    #[serde(flatten)]
    pub identity: ClusterIdentity,
    /// Hostname of the process whose measurements represent the cluster
    pub process_hostname: Option<String>,
    pub metrics: UsageStats,
    pub disk_available_gb: Option<f64>,
    #[serde(flatten)]
    pub flags: UsageFlags,
}

impl ClusterUsageRecord {
    pub fn new(
        identity: ClusterIdentity,
        process_hostname: Option<String>,
        metrics: UsageStats,
        flags: UsageFlags,
    ) -> Self {
        let disk_available_gb = match (identity.disk_size_gb, metrics.disk.max) {
            (Some(size), Some(used)) => Some(size - used),
            _ => None,
        };

        Self {
            identity,
            process_hostname,
            metrics,
            disk_available_gb,
            flags,
        }
    }
}
