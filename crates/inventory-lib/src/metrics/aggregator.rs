//! Max/mean reduction over sample series

use super::TimeWindow;
use crate::models::{MetricSample, MetricStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Reduce one series: window filter, drop gaps, then max and mean
pub fn aggregate_single(samples: &[MetricSample], window: Option<&TimeWindow>) -> MetricStats {
    reduce(
        samples
            .iter()
            .filter(|s| in_window(&s.timestamp, window))
            .filter_map(|s| s.value),
    )
}

/// Sum several series per timestamp, then reduce the summed series
///
/// A timestamp contributes when at least one series has a value there;
/// series without a value at that timestamp count as zero.
pub fn aggregate_combined(
    series: &[Vec<MetricSample>],
    window: Option<&TimeWindow>,
) -> MetricStats {
    let mut sums: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

    for sample in series.iter().flatten() {
        if !in_window(&sample.timestamp, window) {
            continue;
        }
        if let Some(value) = sample.value {
            *sums.entry(sample.timestamp).or_insert(0.0) += value;
        }
    }

    reduce(sums.into_values())
}

fn in_window(timestamp: &DateTime<Utc>, window: Option<&TimeWindow>) -> bool {
    window.map_or(true, |w| w.contains(timestamp))
}

fn reduce(values: impl Iterator<Item = f64>) -> MetricStats {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;

    for value in values {
        count += 1;
        sum += value;
        max = max.max(value);
    }

    if count == 0 {
        return MetricStats::empty();
    }

    MetricStats {
        max: Some(max),
        avg: Some(sum / count as f64),
    }
}
