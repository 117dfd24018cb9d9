//! Settings for the CLI
//!
//! Layered once at startup, lowest precedence first:
//! - built-in defaults
//! - the settings file (`~/.config/atlas-inventory/config.toml` unless `--config` is given)
//! - `ATLAS_*` environment variables
//! - command-line flags

use anyhow::{Context, Result};
use inventory_lib::{CollectionOptions, MeasurementQuery, TimeWindow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Effective settings for a run
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Atlas API public key
    pub public_key: Option<String>,
    /// Atlas API private key
    pub private_key: Option<String>,
    /// Organization whose projects are collected
    pub org_id: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tier capability table
    #[serde(default = "default_tiers_path")]
    pub tiers_path: PathBuf,
    /// Threshold overrides; built-in defaults when unset
    pub thresholds_path: Option<PathBuf>,

    /// Time-of-day window start, `HH:MM`
    pub window_start: Option<String>,
    /// Time-of-day window end, `HH:MM`
    pub window_end: Option<String>,

    #[serde(default = "default_granularity")]
    pub granularity: String,
    #[serde(default = "default_period")]
    pub period: String,

    /// Clusters of one project built concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per measurement fetch, seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Per HTTP request, seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://cloud.mongodb.com".to_string()
}

fn default_tiers_path() -> PathBuf {
    PathBuf::from("config/tiers.csv")
}

fn default_granularity() -> String {
    "PT1M".to_string()
}

fn default_period() -> String {
    "P2D".to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_http_timeout() -> u64 {
    30
}

/// Values given on the command line; `None` leaves the lower layers in place
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub org_id: Option<String>,
    pub base_url: Option<String>,
    pub tiers_path: Option<PathBuf>,
    pub thresholds_path: Option<PathBuf>,
    pub window_start: Option<String>,
    pub window_end: Option<String>,
    pub granularity: Option<String>,
    pub period: Option<String>,
    pub concurrency: Option<usize>,
    pub fetch_timeout_secs: Option<u64>,
    pub http_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from file, environment and overrides
    ///
    /// An explicitly given file must exist; the default one is optional.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Self::default_path()?).required(false),
        };

        let path_string = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        let as_int = |v: Option<u64>| v.map(|v| v as i64);

        let config = config::Config::builder()
            .add_source(source)
            .add_source(config::Environment::with_prefix("ATLAS").try_parsing(true))
            .set_override_option("public_key", overrides.public_key.clone())?
            .set_override_option("private_key", overrides.private_key.clone())?
            .set_override_option("org_id", overrides.org_id.clone())?
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option("tiers_path", path_string(&overrides.tiers_path))?
            .set_override_option("thresholds_path", path_string(&overrides.thresholds_path))?
            .set_override_option("window_start", overrides.window_start.clone())?
            .set_override_option("window_end", overrides.window_end.clone())?
            .set_override_option("granularity", overrides.granularity.clone())?
            .set_override_option("period", overrides.period.clone())?
            .set_override_option("concurrency", as_int(overrides.concurrency.map(|c| c as u64)))?
            .set_override_option("fetch_timeout_secs", as_int(overrides.fetch_timeout_secs))?
            .set_override_option("http_timeout_secs", as_int(overrides.http_timeout_secs))?
            .build()
            .context("Failed to load settings")?;

        config
            .try_deserialize()
            .context("Failed to parse settings")
    }

    /// Get the default settings file path
    fn default_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home
            .join(".config")
            .join("atlas-inventory")
            .join("config.toml"))
    }

    /// API key pair; missing keys are a usage error
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let public_key = non_empty(&self.public_key)
            .context("Missing Atlas public key (--public-key or ATLAS_PUBLIC_KEY)")?;
        let private_key = non_empty(&self.private_key)
            .context("Missing Atlas private key (--private-key or ATLAS_PRIVATE_KEY)")?;
        Ok((public_key, private_key))
    }

    pub fn org_id(&self) -> Result<&str> {
        non_empty(&self.org_id).context("Missing organization id (--org-id or ATLAS_ORG_ID)")
    }

    /// Both ends or neither must be set
    pub fn window(&self) -> Result<Option<TimeWindow>> {
        match (&self.window_start, &self.window_end) {
            (Some(start), Some(end)) => Ok(Some(TimeWindow::parse(start, end)?)),
            (None, None) => Ok(None),
            _ => anyhow::bail!("Time window needs both a start and an end time"),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Collection options for the record builder; a zero timeout disables it
    pub fn collection_options(&self) -> Result<CollectionOptions> {
        Ok(CollectionOptions {
            window: self.window()?,
            query: MeasurementQuery {
                granularity: self.granularity.clone(),
                period: self.period.clone(),
            },
            fetch_timeout: (self.fetch_timeout_secs > 0)
                .then(|| Duration::from_secs(self.fetch_timeout_secs)),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
