//! Inventory library for MongoDB Atlas clusters
//!
//! This crate provides the core functionality for:
//! - Tier capability and threshold tables
//! - Time-series metric aggregation with time-of-day windows
//! - Utilization classification and lower-tier rightsizing verdicts
//! - Per-cluster record assembly over an abstract Atlas API
//! - Organization/project traversal and report flattening

pub mod builder;
pub mod classifier;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod report;
pub mod source;
pub mod thresholds;
pub mod tiers;

pub use builder::{ClusterRecordBuilder, CollectionOptions};
pub use classifier::UtilizationClassifier;
pub use error::{InventoryError, Result};
pub use inventory::InventoryCollector;
pub use metrics::{aggregate_combined, aggregate_single, TimeWindow};
pub use models::*;
pub use observability::RunLogger;
pub use report::{FlatClusterRow, InventoryReport, ProjectCheckReport, ProjectReport};
pub use source::{AtlasApi, MeasurementQuery};
pub use thresholds::{ThresholdConfig, ThresholdSpec};
pub use tiers::{TierSpec, TierTable};
