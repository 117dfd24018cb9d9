//! Tier capability table
//!
//! Loads one row per provider instance tier from CSV and answers
//! "what are this tier's limits" and "which tier sits directly below it".

use crate::error::{InventoryError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Capacity limits of one instance tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSpec {
    pub tier_name: String,
    pub cpu_cores: f64,
    pub ram_gb: f64,
    pub iops: f64,
    pub max_connections: f64,
    /// Total order from smallest (lowest rank) to largest
    pub sort_rank: i64,
}

/// Read-only index of tier specs, ordered by `sort_rank`
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    ranked: Vec<TierSpec>,
    by_name: HashMap<String, usize>,
}

impl TierTable {
    /// Build a table from specs, rejecting duplicate names or ranks
    pub fn from_specs(mut specs: Vec<TierSpec>, source_name: &str) -> Result<Self> {
        specs.sort_by_key(|s| s.sort_rank);

        for pair in specs.windows(2) {
            if pair[0].sort_rank == pair[1].sort_rank {
                return Err(InventoryError::malformed(
                    source_name,
                    format!(
                        "tiers {} and {} share sort rank {}",
                        pair[0].tier_name, pair[1].tier_name, pair[0].sort_rank
                    ),
                ));
            }
        }

        let mut by_name = HashMap::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            if by_name.insert(spec.tier_name.clone(), idx).is_some() {
                return Err(InventoryError::malformed(
                    source_name,
                    format!("tier {} is defined more than once", spec.tier_name),
                ));
            }
        }

        Ok(Self {
            ranked: specs,
            by_name,
        })
    }

    /// Parse a CSV tier table
    ///
    /// The tier name comes from the `tier` column, or from the column with a
    /// blank header when no `tier` column exists. Rows with a blank name are
    /// skipped. Any unparsable row fails the whole load.
    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| InventoryError::malformed(source_name, e.to_string()))?
            .clone();

        let column = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };

        let key_idx = column(&["tier"])
            .or_else(|| column(&[""]))
            .ok_or_else(|| InventoryError::malformed(source_name, "missing tier name column"))?;
        let required = |name: &str, aliases: &[&str]| {
            column(aliases).ok_or_else(|| {
                InventoryError::malformed(source_name, format!("missing column '{}'", name))
            })
        };
        let cpu_idx = required("cpu", &["cpu"])?;
        let ram_idx = required("ram", &["ram"])?;
        let conn_idx = required("connection", &["connection", "connections"])?;
        let iops_idx = required("iops", &["iops"])?;
        let sort_idx = required("sort", &["sort"])?;

        let mut specs = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            // +2: header line plus 1-based numbering
            let line = row + 2;
            let record =
                record.map_err(|e| InventoryError::malformed(source_name, e.to_string()))?;

            let tier_name = record.get(key_idx).unwrap_or("").trim();
            if tier_name.is_empty() {
                continue;
            }

            let number = |idx: usize, field: &str| -> Result<f64> {
                let raw = record.get(idx).unwrap_or("");
                raw.parse::<f64>().map_err(|_| {
                    InventoryError::malformed(
                        source_name,
                        format!("line {}: invalid {} value '{}' for {}", line, field, raw, tier_name),
                    )
                })
            };

            let sort_raw = record.get(sort_idx).unwrap_or("");
            let sort_rank = sort_raw.parse::<i64>().map_err(|_| {
                InventoryError::malformed(
                    source_name,
                    format!("line {}: invalid sort value '{}' for {}", line, sort_raw, tier_name),
                )
            })?;

            specs.push(TierSpec {
                tier_name: tier_name.to_string(),
                cpu_cores: number(cpu_idx, "cpu")?,
                ram_gb: number(ram_idx, "ram")?,
                iops: number(iops_idx, "iops")?,
                max_connections: number(conn_idx, "connection")?,
                sort_rank,
            });
        }

        Self::from_specs(specs, source_name)
    }

    /// Load the tier table from a file; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self> {
        let source_name = path.display().to_string();
        match std::fs::File::open(path) {
            Ok(file) => {
                let table = Self::from_reader(file, &source_name)?;
                info!(path = %source_name, tiers = table.len(), "Loaded tier table");
                Ok(table)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    path = %source_name,
                    "Tier table not found, every tier lookup will be unknown"
                );
                Ok(Self::default())
            }
            Err(e) => Err(InventoryError::malformed(source_name, e.to_string())),
        }
    }

    pub fn lookup(&self, tier_name: &str) -> Option<&TierSpec> {
        self.by_name.get(tier_name).map(|&idx| &self.ranked[idx])
    }

    /// The tier with the greatest rank strictly below `tier_name`'s rank
    pub fn next_lower(&self, tier_name: &str) -> Option<&TierSpec> {
        let idx = *self.by_name.get(tier_name)?;
        idx.checked_sub(1).map(|lower| &self.ranked[lower])
    }

    /// Tiers from smallest to largest
    pub fn iter(&self) -> impl Iterator<Item = &TierSpec> {
        self.ranked.iter()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SHEET_EXPORT: &str = ",cpu,ram,connection,iops,sort
M10,2,2,1500,1000,1
M20,2,4,3000,2000,2
M30,2,8,3000,3000,3
,,,,,
";

    fn table() -> TierTable {
        TierTable::from_reader(SHEET_EXPORT.as_bytes(), "test").unwrap()
    }

    #[test]
    fn test_blank_header_column_is_tier_name() {
        let table = table();
        assert_eq!(table.len(), 3);

        let m20 = table.lookup("M20").unwrap();
        assert_eq!(m20.ram_gb, 4.0);
        assert_eq!(m20.max_connections, 3000.0);
        assert_eq!(m20.iops, 2000.0);
        assert_eq!(m20.sort_rank, 2);
    }

    #[test]
    fn test_named_tier_column_and_connections_alias() {
        let csv = "tier,cpu,ram,connections,iops,sort\nM40, 4, 16, 6000, 3000, 4\n";
        let table = TierTable::from_reader(csv.as_bytes(), "test").unwrap();
        let m40 = table.lookup("M40").unwrap();
        assert_eq!(m40.cpu_cores, 4.0);
        assert_eq!(m40.max_connections, 6000.0);
    }

    #[test]
    fn test_next_lower() {
        let table = table();
        assert_eq!(table.next_lower("M30").unwrap().tier_name, "M20");
        assert_eq!(table.next_lower("M20").unwrap().tier_name, "M10");
        assert!(table.next_lower("M10").is_none());
        assert!(table.next_lower("M999").is_none());
    }

    #[test]
    fn test_next_lower_follows_rank_not_file_order() {
        let csv = "tier,cpu,ram,connection,iops,sort
M30,2,8,3000,3000,30
M10,2,2,1500,1000,10
M20,2,4,3000,2000,20
";
        let table = TierTable::from_reader(csv.as_bytes(), "test").unwrap();
        assert_eq!(table.next_lower("M30").unwrap().tier_name, "M20");
        let names: Vec<_> = table.iter().map(|t| t.tier_name.as_str()).collect();
        assert_eq!(names, vec!["M10", "M20", "M30"]);
    }

    #[test]
    fn test_unknown_tier_is_a_miss() {
        assert!(table().lookup("R40").is_none());
    }

    #[test]
    fn test_malformed_value_fails_whole_load() {
        let csv = "tier,cpu,ram,connection,iops,sort\nM10,2,2,1500,1000,1\nM20,two,4,3000,2000,2\n";
        let err = TierTable::from_reader(csv.as_bytes(), "tiers.csv").unwrap_err();
        assert!(matches!(err, InventoryError::MalformedConfig { .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let csv = "tier,cpu,ram,iops,sort\nM10,2,2,1000,1\n";
        let err = TierTable::from_reader(csv.as_bytes(), "tiers.csv").unwrap_err();
        assert!(err.to_string().contains("connection"));
    }

    #[test]
    fn test_duplicate_rank_is_malformed() {
        let csv = "tier,cpu,ram,connection,iops,sort\nM10,2,2,1500,1000,1\nM20,2,4,3000,2000,1\n";
        let err = TierTable::from_reader(csv.as_bytes(), "tiers.csv").unwrap_err();
        assert!(err.to_string().contains("sort rank 1"));
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = TierTable::load(&dir.path().join("absent.csv")).unwrap();
        assert!(table.is_empty());
        assert!(table.lookup("M10").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SHEET_EXPORT.as_bytes()).unwrap();

        let table = TierTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 3);
    }
}
