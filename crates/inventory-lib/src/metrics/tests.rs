//! Aggregation tests over hand-built measurement series

use super::{aggregate_combined, aggregate_single, TimeWindow};
use crate::models::{MetricSample, MetricStats};
use chrono::{DateTime, TimeZone, Utc};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, 1, hour, minute, 0).unwrap()
}

fn sample(hour: u32, minute: u32, value: f64) -> MetricSample {
    MetricSample::new(at(hour, minute), Some(value))
}

fn gap(hour: u32, minute: u32) -> MetricSample {
    MetricSample::new(at(hour, minute), None)
}

#[test]
fn test_single_max_and_mean() {
    let samples = vec![
        sample(10, 0, 50.0),
        sample(14, 0, 30.0),
        gap(15, 0),
        sample(16, 0, 40.0),
        sample(18, 0, 60.0),
        sample(2, 0, 20.0),
    ];

    let stats = aggregate_single(&samples, None);
    assert_eq!(stats.max, Some(60.0));
    assert_eq!(stats.avg, Some(40.0));
}

#[test]
fn test_single_bounds_hold_for_every_sample() {
    let values = [3.5, 0.0, 12.25, 7.0, 0.5, 9.75];
    let samples: Vec<_> = values
        .iter()
        .enumerate()
        .map(|(i, v)| sample(i as u32, 0, *v))
        .collect();

    let stats = aggregate_single(&samples, None);
    let max = stats.max.unwrap();
    assert!(values.iter().all(|v| max >= *v));

    let expected_avg = values.iter().sum::<f64>() / values.len() as f64;
    assert_eq!(stats.avg, Some(expected_avg));
}

#[test]
fn test_single_zero_is_a_measurement() {
    let stats = aggregate_single(&[sample(1, 0, 0.0)], None);
    assert_eq!(
        stats,
        MetricStats {
            max: Some(0.0),
            avg: Some(0.0)
        }
    );
}

#[test]
fn test_single_empty_and_all_gaps() {
    assert!(aggregate_single(&[], None).is_empty());
    assert!(aggregate_single(&[gap(1, 0), gap(2, 0)], None).is_empty());
}

#[test]
fn test_window_boundary() {
    let window = TimeWindow::parse("14:00", "23:59").unwrap();
    let samples = vec![sample(13, 59, 100.0), sample(14, 0, 10.0)];

    let stats = aggregate_single(&samples, Some(&window));
    assert_eq!(stats.max, Some(10.0));
    assert_eq!(stats.avg, Some(10.0));
}

#[test]
fn test_window_filters_business_hours() {
    let window = TimeWindow::parse("14:00", "23:59").unwrap();
    let samples = vec![
        sample(10, 0, 50.0),
        sample(14, 0, 30.0),
        sample(16, 0, 40.0),
        sample(18, 0, 60.0),
        sample(2, 0, 20.0),
    ];

    let stats = aggregate_single(&samples, Some(&window));
    assert_eq!(stats.max, Some(60.0));
    assert!((stats.avg.unwrap() - 130.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_window_excluding_everything_is_empty() {
    let window = TimeWindow::parse("01:00", "02:00").unwrap();
    let stats = aggregate_single(&[sample(12, 0, 5.0)], Some(&window));
    assert!(stats.is_empty());
}

#[test]
fn test_window_wraps_midnight() {
    let window = TimeWindow::parse("22:00", "06:00").unwrap();
    assert!(window.wraps_midnight());

    assert!(!window.contains(&at(21, 59)));
    assert!(window.contains(&at(22, 0)));
    assert!(window.contains(&at(2, 30)));
    assert!(window.contains(&at(6, 0)));
    assert!(!window.contains(&at(6, 1)));
    assert!(!window.contains(&at(12, 0)));
}

#[test]
fn test_window_end_minute_is_inclusive() {
    let window = TimeWindow::parse("14:00", "23:59").unwrap();
    let late = Utc.with_ymd_and_hms(2023, 10, 1, 23, 59, 30).unwrap();
    assert!(window.contains(&late));
    assert!(!window.contains(&at(0, 0)));
}

#[test]
fn test_window_parse_rejects_garbage() {
    assert!(TimeWindow::parse("25:00", "23:59").is_err());
    assert!(TimeWindow::parse("noon", "23:59").is_err());
    assert_eq!(
        TimeWindow::parse("9:05", "17:30").unwrap().to_string(),
        "09:05-17:30"
    );
}

#[test]
fn test_combined_sums_aligned_points() {
    let stats = aggregate_combined(&[vec![sample(1, 0, 5.0)], vec![sample(1, 0, 7.0)]], None);
    assert_eq!(stats.max, Some(12.0));
    assert_eq!(stats.avg, Some(12.0));
}

#[test]
fn test_combined_missing_values_count_as_zero() {
    let reads = vec![sample(1, 0, 10.0), sample(2, 0, 4.0)];
    let queries = vec![gap(1, 0), sample(2, 0, 6.0), sample(3, 0, 2.0)];

    let stats = aggregate_combined(&[reads, queries], None);
    // 1:00 -> 10, 2:00 -> 10, 3:00 -> 2
    assert_eq!(stats.max, Some(10.0));
    assert!((stats.avg.unwrap() - 22.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_combined_all_gaps_timestamp_is_skipped() {
    let a = vec![gap(1, 0), sample(2, 0, 3.0)];
    let b = vec![gap(1, 0), sample(2, 0, 1.0)];

    let stats = aggregate_combined(&[a, b], None);
    assert_eq!(stats.max, Some(4.0));
    assert_eq!(stats.avg, Some(4.0));
}

#[test]
fn test_combined_reduces_after_summing() {
    let command = vec![sample(1, 0, 10.0), sample(2, 0, 20.0)];
    let query = vec![sample(2, 0, 30.0)];

    let combined = aggregate_combined(&[command.clone(), query.clone()], None);
    let sum_of_avgs = aggregate_single(&command, None).avg.unwrap()
        + aggregate_single(&query, None).avg.unwrap();

    // summed series: 10, 50
    assert_eq!(combined.avg, Some(30.0));
    assert_eq!(combined.max, Some(50.0));
    assert_ne!(combined.avg.unwrap(), sum_of_avgs);
}

#[test]
fn test_combined_respects_window() {
    let window = TimeWindow::parse("14:00", "23:59").unwrap();
    let a = vec![sample(13, 0, 100.0), sample(15, 0, 1.0)];
    let b = vec![sample(13, 0, 100.0), sample(15, 0, 2.0)];

    let stats = aggregate_combined(&[a, b], Some(&window));
    assert_eq!(stats.max, Some(3.0));
    assert_eq!(stats.avg, Some(3.0));
}

#[test]
fn test_combined_single_series_matches_single() {
    let series = vec![sample(1, 0, 2.0), gap(2, 0), sample(3, 0, 8.0)];
    assert_eq!(
        aggregate_combined(&[series.clone()], None),
        aggregate_single(&series, None)
    );
}

#[test]
fn test_combined_no_series() {
    assert!(aggregate_combined(&[], None).is_empty());
}
