//! Organization and project traversal
//!
//! Lists projects, then per project lists clusters and processes and builds
//! one record per cluster. Listing failures abort the run with
//! [`InventoryError::FatalFetch`]; measurement failures never do.

use crate::builder::ClusterRecordBuilder;
use crate::error::{InventoryError, Result};
use crate::models::{ClusterIdentity, ClusterUsageRecord, ProcessInfo, ProjectInfo};
use crate::report::{InventoryReport, ProjectCheckReport, ProjectReport};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Drives a collection run over an organization or a single project
pub struct InventoryCollector {
    builder: ClusterRecordBuilder,
    /// Clusters of one project built at the same time
    concurrency: usize,
}

impl InventoryCollector {
    pub fn new(builder: ClusterRecordBuilder) -> Self {
        Self {
            builder,
            concurrency: 1,
        }
    }

    /// Values below 1 are treated as 1
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Collect every cluster of every project in the organization
    pub async fn collect_organization(&self, org_id: &str) -> Result<InventoryReport> {
        let logger = self.builder.logger();
        let window = self.builder.options().window;
        logger.log_run_start(self.builder.tiers().len(), window.map(|w| w.to_string()));

        let projects = self
            .builder
            .api()
            .list_projects(org_id)
            .await
            .map_err(|e| InventoryError::fatal_fetch(format!("projects for organization {}", org_id), &e))?;

        let mut reports = Vec::with_capacity(projects.len());
        for project in &projects {
            reports.push(self.collect_project(project).await?);
        }

        let report = InventoryReport {
            organization_id: org_id.to_string(),
            collection_timestamp: Utc::now(),
            time_window: window,
            projects: reports,
        };
        logger.log_run_complete(report.projects.len(), report.total_clusters());
        Ok(report)
    }

    /// Collect every cluster of one project
    pub async fn collect_project(&self, project: &ProjectInfo) -> Result<ProjectReport> {
        let clusters = self.build_project(&project.id, &project.name).await?;

        Ok(ProjectReport {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            clusters,
        })
    }

    /// Check a single project without listing the organization
    pub async fn check_project(&self, project_id: &str) -> Result<ProjectCheckReport> {
        let logger = self.builder.logger();
        logger.log_run_start(
            self.builder.tiers().len(),
            self.builder.options().window.map(|w| w.to_string()),
        );

        let clusters = self.build_project(project_id, project_id).await?;

        logger.log_run_complete(1, clusters.len());
        Ok(ProjectCheckReport::new(project_id, clusters))
    }

    async fn build_project(&self, project_id: &str, project_name: &str) -> Result<Vec<ClusterUsageRecord>> {
        let api = self.builder.api();
        let clusters = api
            .list_clusters(project_id)
            .await
            .map_err(|e| InventoryError::fatal_fetch(format!("clusters for project {}", project_id), &e))?;

        self.builder
            .logger()
            .log_project(project_id, project_name, clusters.len());

        if clusters.is_empty() {
            return Ok(Vec::new());
        }

        let processes = api
            .list_processes(project_id)
            .await
            .map_err(|e| InventoryError::fatal_fetch(format!("processes for project {}", project_id), &e))?;

        self.build_clusters(project_id, clusters, processes).await
    }

    /// Build records with at most `concurrency` clusters in flight; output
    /// order equals listing order
    async fn build_clusters(
        &self,
        project_id: &str,
        clusters: Vec<ClusterIdentity>,
        processes: Vec<ProcessInfo>,
    ) -> Result<Vec<ClusterUsageRecord>> {
        let total = clusters.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let processes = Arc::new(processes);
        let mut tasks = JoinSet::new();

        for (index, cluster) in clusters.into_iter().enumerate() {
            let builder = self.builder.clone();
            let processes = Arc::clone(&processes);
            let semaphore = Arc::clone(&semaphore);
            let project_id = project_id.to_string();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (index, builder.build(&project_id, cluster, &processes).await)
            });
        }

        let mut slots: Vec<Option<ClusterUsageRecord>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, record) = joined.map_err(|e| InventoryError::TaskFailed {
                cluster: format!("project {}", project_id),
                message: e.to_string(),
            })?;
            slots[index] = Some(record?);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
