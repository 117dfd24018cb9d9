//! Per-metric utilization thresholds
//!
//! A single mapping seeded with built-in defaults and selectively
//! overridden by an optional CSV source.

use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

pub const CPU: &str = "cpu";
pub const MEMORY: &str = "memory";
pub const IOPS: &str = "iops";
pub const CONNECTIONS: &str = "connections";
pub const DISK: &str = "disk";

/// Threshold pair for one metric, both in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Usage below this share of the current tier's limit is "low"
    pub low_usage_threshold: f64,
    /// Usage must stay below this share of the lower tier's limit to fit
    pub lower_tier_threshold: f64,
}

impl ThresholdSpec {
    pub const fn new(low_usage_threshold: f64, lower_tier_threshold: f64) -> Self {
        Self {
            low_usage_threshold,
            lower_tier_threshold,
        }
    }
}

const DEFAULTS: [(&str, ThresholdSpec); 5] = [
    (CPU, ThresholdSpec::new(40.0, 80.0)),
    (MEMORY, ThresholdSpec::new(40.0, 80.0)),
    (IOPS, ThresholdSpec::new(40.0, 80.0)),
    (CONNECTIONS, ThresholdSpec::new(80.0, 80.0)),
    (DISK, ThresholdSpec::new(85.0, 80.0)),
];

#[derive(Debug, Deserialize)]
struct ThresholdRow {
    #[serde(default)]
    metric: String,
    low_usage_threshold: Option<f64>,
    lower_tier_threshold: Option<f64>,
}

/// Effective thresholds for a run; read-only after load
#[derive(Debug, Clone)]
pub struct ThresholdConfig {
    specs: BTreeMap<String, ThresholdSpec>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            specs: DEFAULTS
                .iter()
                .map(|(metric, spec)| (metric.to_string(), *spec))
                .collect(),
        }
    }
}

impl ThresholdConfig {
    /// Overlay rows from a CSV source onto the defaults
    ///
    /// Unknown metric names are accepted and added. Rows with a blank
    /// metric are skipped.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for row in csv_reader.deserialize::<ThresholdRow>() {
            let row = row.map_err(|e| InventoryError::malformed(source_name, e.to_string()))?;
            let metric = row.metric.to_ascii_lowercase();
            if metric.is_empty() {
                continue;
            }
            let (Some(low), Some(lower)) = (row.low_usage_threshold, row.lower_tier_threshold) else {
                return Err(InventoryError::malformed(
                    source_name,
                    format!("missing threshold value for {}", metric),
                ));
            };
            config.specs.insert(metric, ThresholdSpec::new(low, lower));
        }

        Ok(config)
    }

    /// Defaults when `path` is `None` or the file does not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let source_name = path.display().to_string();
        match std::fs::File::open(path) {
            Ok(file) => {
                let config = Self::from_reader(file, &source_name)?;
                info!(path = %source_name, metrics = config.specs.len(), "Loaded thresholds");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %source_name, "Threshold file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(InventoryError::malformed(source_name, e.to_string())),
        }
    }

    pub fn get(&self, metric: &str) -> Result<ThresholdSpec> {
        self.specs
            .get(metric)
            .copied()
            .ok_or_else(|| InventoryError::UnknownMetric(metric.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThresholdSpec)> {
        self.specs.iter().map(|(k, v)| (k.as_str(), v))
    }
}
