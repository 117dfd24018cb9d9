//! Provider API boundary
//!
//! The core never talks HTTP itself; it consumes this trait. Listing calls
//! are fatal when they fail, measurement calls are not.

use crate::models::{ClusterIdentity, MetricSample, ProcessInfo, ProjectInfo};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded to the measurements endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementQuery {
    /// ISO-8601 duration between points, e.g. `PT1M`
    pub granularity: String,
    /// ISO-8601 duration looking back from now, e.g. `P2D`
    pub period: String,
}

impl Default for MeasurementQuery {
    fn default() -> Self {
        Self {
            granularity: "PT1M".to_string(),
            period: "P2D".to_string(),
        }
    }
}

/// Read-only view of the Atlas administration API
#[async_trait]
pub trait AtlasApi: Send + Sync {
    /// Projects (groups) of an organization
    async fn list_projects(&self, org_id: &str) -> Result<Vec<ProjectInfo>>;

    /// Clusters of a project
    async fn list_clusters(&self, project_id: &str) -> Result<Vec<ClusterIdentity>>;

    /// Processes of a project, across all its clusters
    async fn list_processes(&self, project_id: &str) -> Result<Vec<ProcessInfo>>;

    /// One named measurement series of a process
    async fn get_measurements(
        &self,
        project_id: &str,
        process_id: &str,
        metric: &str,
        query: &MeasurementQuery,
    ) -> Result<Vec<MetricSample>>;

    /// Disk partition names of a process
    async fn list_disk_partitions(&self, project_id: &str, process_id: &str)
        -> Result<Vec<String>>;

    /// One named measurement series of a disk partition
    async fn get_disk_measurements(
        &self,
        project_id: &str,
        process_id: &str,
        partition: &str,
        metric: &str,
        query: &MeasurementQuery,
    ) -> Result<Vec<MetricSample>>;
}
