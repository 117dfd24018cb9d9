//! Utilization classification
//!
//! Compares a cluster's aggregated statistics with its tier's limits to
//! derive low-usage flags, and with the next lower tier's limits to decide
//! whether the workload would fit one size down.
//!
//! Statistic used per metric:
//!
//! | metric      | low-usage check            | lower-tier check                   |
//! |-------------|----------------------------|------------------------------------|
//! | cpu         | avg % vs threshold %       | avg % projected onto lower cores   |
//! | memory      | max GB vs tier RAM         | max GB vs lower RAM                |
//! | iops        | avg vs tier IOPS           | avg vs lower IOPS                  |
//! | connections | max vs tier connections    | max vs lower connections           |
//! | disk        | max GB vs provisioned disk | not tier-bound                     |

use crate::error::Result;
use crate::models::{LowerTierAssessment, UsageFlags, UsageStats};
use crate::thresholds::{self, ThresholdConfig};
use crate::tiers::{TierSpec, TierTable};

/// Derives [`UsageFlags`] from statistics and read-only tier/threshold tables
#[derive(Debug, Clone, Copy)]
pub struct UtilizationClassifier<'a> {
    tiers: &'a TierTable,
    thresholds: &'a ThresholdConfig,
}

impl<'a> UtilizationClassifier<'a> {
    pub fn new(tiers: &'a TierTable, thresholds: &'a ThresholdConfig) -> Self {
        Self { tiers, thresholds }
    }

    /// Classify one cluster
    ///
    /// A `None` tier (lookup miss) yields all-`None` flags regardless of the
    /// statistics.
    pub fn classify(
        &self,
        tier: Option<&TierSpec>,
        stats: &UsageStats,
        disk_size_gb: Option<f64>,
    ) -> Result<UsageFlags> {
        let Some(tier) = tier else {
            return Ok(UsageFlags::unknown());
        };

        let cpu = self.thresholds.get(thresholds::CPU)?;
        let memory = self.thresholds.get(thresholds::MEMORY)?;
        let iops = self.thresholds.get(thresholds::IOPS)?;
        let connections = self.thresholds.get(thresholds::CONNECTIONS)?;
        let disk = self.thresholds.get(thresholds::DISK)?;

        let low_cpu_use = stats
            .cpu
            .avg
            .and_then(|avg| (avg < cpu.low_usage_threshold).then_some(true));

        let lower_tier = self.tiers.next_lower(&tier.tier_name).map(|lower| {
            let used_cores = stats.cpu.avg.map(|pct| pct / 100.0 * tier.cpu_cores);
            LowerTierAssessment {
                tier: lower.tier_name.clone(),
                cpu: within(used_cores, lower.cpu_cores, cpu.lower_tier_threshold),
                memory: within(stats.memory.max, lower.ram_gb, memory.lower_tier_threshold),
                iops: within(stats.iops.avg, lower.iops, iops.lower_tier_threshold),
                connections: within(
                    stats.connections.max,
                    lower.max_connections,
                    connections.lower_tier_threshold,
                ),
            }
        });

        Ok(UsageFlags {
            low_cpu_use,
            low_memory_use: low_flag(stats.memory.max, tier.ram_gb, memory.low_usage_threshold),
            low_iops_use: low_flag(stats.iops.avg, tier.iops, iops.low_usage_threshold),
            low_disk_use: disk_size_gb
                .and_then(|size| low_flag(stats.disk.max, size, disk.low_usage_threshold)),
            low_connections_use: low_flag(
                stats.connections.max,
                tier.max_connections,
                connections.low_usage_threshold,
            ),
            fits_lower_tier: lower_tier.as_ref().and_then(LowerTierAssessment::fits),
            lower_tier,
        })
    }
}

/// `Some(value < limit * percent / 100)`, or `None` when either side is unknown
fn within(value: Option<f64>, limit: f64, percent: f64) -> Option<bool> {
    if limit <= 0.0 {
        return None;
    }
    value.map(|v| v < limit * percent / 100.0)
}

/// Like [`within`] but collapses `false` into `None`
fn low_flag(value: Option<f64>, limit: f64, percent: f64) -> Option<bool> {
    within(value, limit, percent).and_then(|low| low.then_some(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricStats;

    fn tier(name: &str, cpu: f64, ram: f64, iops: f64, connections: f64, rank: i64) -> TierSpec {
        TierSpec {
            tier_name: name.to_string(),
            cpu_cores: cpu,
            ram_gb: ram,
            iops,
            max_connections: connections,
            sort_rank: rank,
        }
    }

    fn tiers() -> TierTable {
        TierTable::from_specs(
            vec![
                tier("M10", 2.0, 2.0, 1000.0, 1500.0, 1),
                tier("M20", 2.0, 4.0, 2000.0, 3000.0, 2),
                tier("M30", 2.0, 8.0, 3000.0, 3000.0, 3),
            ],
            "test",
        )
        .unwrap()
    }

    fn stats(avg_max: f64) -> MetricStats {
        MetricStats {
            max: Some(avg_max),
            avg: Some(avg_max),
        }
    }

    /// Usage comfortably inside M20's limits
    fn light_usage() -> UsageStats {
        UsageStats {
            cpu: stats(20.0),
            memory: stats(1.5),
            iops: stats(300.0),
            disk: stats(5.0),
            connections: stats(100.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_tier_yields_all_null() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let flags = classifier
            .classify(tiers.lookup("R40"), &light_usage(), Some(40.0))
            .unwrap();
        assert_eq!(flags, UsageFlags::unknown());
        assert_eq!(flags.fits_lower_tier, None);
    }

    #[test]
    fn test_low_cpu_flag() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);
        let m30 = tiers.lookup("M30");

        let mut usage = UsageStats::default();
        usage.cpu = stats(20.0);
        assert_eq!(classifier.classify(m30, &usage, None).unwrap().low_cpu_use, Some(true));

        usage.cpu = stats(50.0);
        assert_eq!(classifier.classify(m30, &usage, None).unwrap().low_cpu_use, None);
    }

    #[test]
    fn test_low_flags_never_false() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let usage = UsageStats {
            cpu: stats(95.0),
            memory: stats(7.9),
            iops: stats(2900.0),
            disk: stats(39.0),
            connections: stats(2900.0),
            ..Default::default()
        };
        let flags = classifier
            .classify(tiers.lookup("M30"), &usage, Some(40.0))
            .unwrap();

        assert_eq!(flags.low_cpu_use, None);
        assert_eq!(flags.low_memory_use, None);
        assert_eq!(flags.low_iops_use, None);
        assert_eq!(flags.low_disk_use, None);
        assert_eq!(flags.low_connections_use, None);
        assert_eq!(flags.fits_lower_tier, Some(false));
    }

    #[test]
    fn test_low_memory_iops_disk_flags() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let usage = UsageStats {
            // 3.0 < 8 * 0.4
            memory: stats(3.0),
            // 1000 < 3000 * 0.4
            iops: stats(1000.0),
            // 30 < 40 * 0.85
            disk: stats(30.0),
            ..Default::default()
        };
        let flags = classifier
            .classify(tiers.lookup("M30"), &usage, Some(40.0))
            .unwrap();

        assert_eq!(flags.low_memory_use, Some(true));
        assert_eq!(flags.low_iops_use, Some(true));
        assert_eq!(flags.low_disk_use, Some(true));
        assert_eq!(flags.low_cpu_use, None);
    }

    #[test]
    fn test_low_disk_needs_provisioned_size() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let flags = classifier
            .classify(tiers.lookup("M30"), &light_usage(), None)
            .unwrap();
        assert_eq!(flags.low_disk_use, None);
    }

    #[test]
    fn test_fits_lower_tier_when_all_metrics_pass() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let flags = classifier
            .classify(tiers.lookup("M30"), &light_usage(), Some(40.0))
            .unwrap();

        let lower = flags.lower_tier.as_ref().unwrap();
        assert_eq!(lower.tier, "M20");
        assert_eq!(flags.fits_lower_tier, Some(true));
    }

    #[test]
    fn test_fits_lower_tier_and_semantics() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        // cpu passes, memory 3.5 GB is not below M20's 4 * 0.8
        let mut usage = light_usage();
        usage.memory = stats(3.5);

        let flags = classifier
            .classify(tiers.lookup("M30"), &usage, Some(40.0))
            .unwrap();
        let lower = flags.lower_tier.as_ref().unwrap();
        assert_eq!(lower.cpu, Some(true));
        assert_eq!(lower.memory, Some(false));
        assert_eq!(flags.fits_lower_tier, Some(false));
    }

    #[test]
    fn test_cpu_projected_onto_fewer_cores() {
        let tiers = TierTable::from_specs(
            vec![
                tier("M30", 2.0, 8.0, 3000.0, 3000.0, 3),
                tier("M40", 4.0, 16.0, 3000.0, 6000.0, 4),
            ],
            "test",
        )
        .unwrap();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let mut usage = light_usage();
        // 45% of 4 cores = 1.8 cores, above 2 * 0.8
        usage.cpu = stats(45.0);
        let flags = classifier.classify(tiers.lookup("M40"), &usage, None).unwrap();
        assert_eq!(flags.lower_tier.unwrap().cpu, Some(false));

        // 35% of 4 cores = 1.4 cores
        usage.cpu = stats(35.0);
        let flags = classifier.classify(tiers.lookup("M40"), &usage, None).unwrap();
        assert_eq!(flags.lower_tier.unwrap().cpu, Some(true));
    }

    #[test]
    fn test_smallest_tier_has_no_verdict() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let flags = classifier
            .classify(tiers.lookup("M10"), &light_usage(), None)
            .unwrap();
        assert!(flags.lower_tier.is_none());
        assert_eq!(flags.fits_lower_tier, None);
        assert_eq!(flags.low_cpu_use, Some(true));
    }

    #[test]
    fn test_missing_metric_degrades_lower_tier_verdict() {
        let tiers = tiers();
        let thresholds = ThresholdConfig::default();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let mut usage = light_usage();
        usage.iops = MetricStats::empty();

        let flags = classifier
            .classify(tiers.lookup("M30"), &usage, None)
            .unwrap();
        assert_eq!(flags.low_iops_use, None);
        assert_eq!(flags.lower_tier.as_ref().unwrap().iops, None);
        assert_eq!(flags.fits_lower_tier, None);
    }

    #[test]
    fn test_overridden_thresholds_apply() {
        let tiers = tiers();
        let csv = "metric,low_usage_threshold,lower_tier_threshold\ncpu,10,80\n";
        let thresholds = ThresholdConfig::from_reader(csv.as_bytes(), "test").unwrap();
        let classifier = UtilizationClassifier::new(&tiers, &thresholds);

        let flags = classifier
            .classify(tiers.lookup("M30"), &light_usage(), None)
            .unwrap();
        assert_eq!(flags.low_cpu_use, None);
    }
}
