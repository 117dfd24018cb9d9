//! Metric aggregation
//!
//! Reduces raw measurement series to max/avg statistics, optionally
//! restricted to a time-of-day window. Several counters that together form
//! one logical metric are summed per timestamp before reduction.

mod aggregator;
mod window;

#[cfg(test)]
mod tests;

pub use aggregator::{aggregate_combined, aggregate_single};
pub use window::TimeWindow;
