//! Error taxonomy for inventory collection
//!
//! Tier lookup misses are deliberately absent: an unknown tier is a
//! defined state (`Option::None`) that turns every flag into `null`.

/// Errors raised by the inventory core
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Listing projects, clusters or processes failed; aborts the affected scope
    #[error("failed to fetch {what}: {message}")]
    FatalFetch { what: String, message: String },

    /// A single measurement series could not be fetched
    #[error("metric {metric} unavailable: {message}")]
    DegradedMetric { metric: String, message: String },

    /// Threshold requested for a metric with neither a default nor an override
    #[error("no threshold configured for metric '{0}'")]
    UnknownMetric(String),

    /// Tier or threshold table could not be parsed
    #[error("malformed configuration in {source_name}: {message}")]
    MalformedConfig { source_name: String, message: String },

    /// A cluster build task panicked or was cancelled
    #[error("cluster task for {cluster} failed: {message}")]
    TaskFailed { cluster: String, message: String },
}

impl InventoryError {
    pub fn fatal_fetch(what: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::FatalFetch {
            what: what.into(),
            message: format!("{:#}", err),
        }
    }

    pub fn degraded(metric: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DegradedMetric {
            metric: metric.into(),
            message: message.into(),
        }
    }

    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConfig {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
