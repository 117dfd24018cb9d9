//! Per-cluster record assembly
//!
//! Fetches each metric's raw series through [`AtlasApi`], reduces them,
//! looks up the cluster's tier and classifies usage. Measurement failures
//! only empty the affected metric; they never drop the cluster.

mod catalog;
pub mod process;


use crate::classifier::UtilizationClassifier;
use crate::error::{InventoryError, Result};
use crate::metrics::{aggregate_combined, aggregate_single, TimeWindow};
use crate::models::{ClusterIdentity, ClusterUsageRecord, MetricSample, MetricStats, ProcessInfo, UsageStats};
use crate::observability::RunLogger;
use crate::source::{AtlasApi, MeasurementQuery};
use crate::thresholds::ThresholdConfig;
use crate::tiers::TierTable;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Run-wide settings applied to every cluster
#[derive(Debug, Clone)]
pub struct CollectionOptions {
    /// Restrict aggregation to this time of day
    pub window: Option<TimeWindow>,
    pub query: MeasurementQuery,
    /// Upper bound for a single measurement call; exceeded calls degrade the metric
    pub fetch_timeout: Option<Duration>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            window: None,
            query: MeasurementQuery::default(),
            fetch_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Process and cluster a metric fetch is made for
#[derive(Debug, Clone, Copy)]
struct FetchTarget<'a> {
    project_id: &'a str,
    process_id: &'a str,
    cluster: &'a str,
}

/// Builds a [`ClusterUsageRecord`] for one cluster at a time
///
/// Cheap to clone; the tier and threshold tables are shared read-only.
#[derive(Clone)]
pub struct ClusterRecordBuilder {
    api: Arc<dyn AtlasApi>,
    tiers: Arc<TierTable>,
    thresholds: Arc<ThresholdConfig>,
    options: CollectionOptions,
    logger: RunLogger,
}

impl ClusterRecordBuilder {
    pub fn new(
        api: Arc<dyn AtlasApi>,
        tiers: Arc<TierTable>,
        thresholds: Arc<ThresholdConfig>,
        options: CollectionOptions,
        logger: RunLogger,
    ) -> Self {
        Self {
            api,
            tiers,
            thresholds,
            options,
            logger,
        }
    }

    pub fn api(&self) -> &Arc<dyn AtlasApi> {
        &self.api
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    /// Assemble the record for `cluster` using the project's process list
    ///
    /// Only a threshold misconfiguration can fail here.
    pub async fn build(
        &self,
        project_id: &str,
        cluster: ClusterIdentity,
        processes: &[ProcessInfo],
    ) -> Result<ClusterUsageRecord> {
        let process = process::resolve(&cluster, processes);

        let stats = match process {
            Some(process) => {
                let target = FetchTarget {
                    project_id,
                    process_id: &process.id,
                    cluster: &cluster.name,
                };
                self.collect_stats(target).await
            }
            None => {
                self.logger.log_process_unmatched(project_id, &cluster.name);
                UsageStats::default()
            }
        };

        let tier = cluster.tier.as_deref().and_then(|t| self.tiers.lookup(t));
        if tier.is_none() {
            self.logger
                .log_unknown_tier(&cluster.name, cluster.tier.as_deref());
        }

        let flags = UtilizationClassifier::new(&self.tiers, &self.thresholds).classify(
            tier,
            &stats,
            cluster.disk_size_gb,
        )?;

        let record = ClusterUsageRecord::new(
            cluster,
            process.map(|p| p.hostname.clone()),
            stats,
            flags,
        );
        self.logger.log_cluster(project_id, &record);
        Ok(record)
    }

    async fn collect_stats(&self, target: FetchTarget<'_>) -> UsageStats {
        let cpu = self.combined(target, "cpu", catalog::CPU_COMPONENTS).await;
        let memory = self
            .single(target, catalog::MEMORY_USED)
            .await
            .scaled(catalog::KB_PER_GB);

        let mut disk = self.single(target, catalog::DISK_USED).await;
        if disk.is_empty() {
            disk = self.single(target, catalog::DISK_USED_FALLBACK).await;
        }

        UsageStats {
            cpu,
            memory,
            iops: self.disk_iops(target).await,
            disk: disk.scaled(catalog::BYTES_PER_GB),
            connections: self.single(target, catalog::CONNECTIONS).await,
            read_ops: self.combined(target, "read_ops", catalog::READ_OPS).await,
            write_ops: self.combined(target, "write_ops", catalog::WRITE_OPS).await,
        }
    }

    async fn single(&self, target: FetchTarget<'_>, metric: &str) -> MetricStats {
        match self.fetch(target, metric).await {
            Ok(samples) => aggregate_single(&samples, self.options.window.as_ref()),
            Err(e) => self.degrade(target, &e),
        }
    }

    /// Any failed component empties the whole combined metric
    async fn combined(&self, target: FetchTarget<'_>, label: &str, metrics: &[&str]) -> MetricStats {
        let mut series = Vec::with_capacity(metrics.len());
        for metric in metrics {
            match self.fetch(target, metric).await {
                Ok(samples) => series.push(samples),
                Err(e) => {
                    let e = match e {
                        InventoryError::DegradedMetric { metric, message } => {
                            InventoryError::degraded(label, format!("{}: {}", metric, message))
                        }
                        other => other,
                    };
                    return self.degrade(target, &e);
                }
            }
        }
        aggregate_combined(&series, self.options.window.as_ref())
    }

    /// IOPS are reported per disk partition; the first partition is used
    async fn disk_iops(&self, target: FetchTarget<'_>) -> MetricStats {
        let partitions = self
            .bounded(
                self.api
                    .list_disk_partitions(target.project_id, target.process_id),
            )
            .await;

        let partition = match partitions {
            Ok(partitions) => match partitions.into_iter().next() {
                Some(partition) => partition,
                None => return MetricStats::empty(),
            },
            Err(e) => {
                return self.degrade(
                    target,
                    &InventoryError::degraded("iops", format!("{:#}", e)),
                )
            }
        };

        let samples = self
            .bounded(self.api.get_disk_measurements(
                target.project_id,
                target.process_id,
                &partition,
                catalog::DISK_IOPS,
                &self.options.query,
            ))
            .await;

        match samples {
            Ok(samples) => aggregate_single(&samples, self.options.window.as_ref()),
            Err(e) => self.degrade(
                target,
                &InventoryError::degraded(catalog::DISK_IOPS, format!("{:#}", e)),
            ),
        }
    }

    async fn fetch(&self, target: FetchTarget<'_>, metric: &str) -> Result<Vec<MetricSample>> {
        self.bounded(self.api.get_measurements(
            target.project_id,
            target.process_id,
            metric,
            &self.options.query,
        ))
        .await
        .map_err(|e| InventoryError::degraded(metric, format!("{:#}", e)))
    }

    /// Apply the per-fetch timeout, if any
    async fn bounded<T>(
        &self,
        fetch: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        match self.options.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| anyhow::anyhow!("timed out after {:?}", limit))?,
            None => fetch.await,
        }
    }

    fn degrade(&self, target: FetchTarget<'_>, error: &InventoryError) -> MetricStats {
        self.logger
            .log_metric_degraded(target.project_id, target.cluster, error);
        MetricStats::empty()
    }
}
