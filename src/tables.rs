// 📊 Table Generator - the three yearly summary tables
// Table 1: plan-county counts by plan type, approved rows
// Table 2: same, after exclusions
// Table 3: mean yearly enrollment by plan type, after exclusions

use crate::aggregate::YearlyPlanCounty;
use crate::config::PipelineConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// TYPES
// ============================================================================

/// TypeCount - Row of Table 1 / Table 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCount {
    /// None for plan-counties without contract/plan metadata
    pub plan_type: Option<String>,
    pub count: usize,
}

/// TypeAverage - Row of Table 3
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAverage {
    pub plan_type: Option<String>,

    /// Rounded to two decimals
    pub average_enrollment: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTables {
    pub plan_count_all: Vec<TypeCount>,
    pub plan_count_filtered: Vec<TypeCount>,
    pub average_enrollment: Vec<TypeAverage>,
}

impl SummaryTables {
    pub fn generate(approved: &[YearlyPlanCounty], filtered: &[YearlyPlanCounty]) -> Self {
        SummaryTables {
            plan_count_all: count_by_type(approved),
            plan_count_filtered: count_by_type(filtered),
            average_enrollment: average_by_type(filtered),
        }
    }
}

// ============================================================================
// COMPUTATION
// ============================================================================

/// Missing plan type sorts after every named type
fn type_order(plan_type: &Option<String>) -> (bool, String) {
    (plan_type.is_none(), plan_type.clone().unwrap_or_default())
}

/// Value counts: descending count, ties broken by type name
pub fn count_by_type(rows: &[YearlyPlanCounty]) -> Vec<TypeCount> {
    let mut counts: HashMap<Option<String>, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.plan_type.clone()).or_insert(0) += 1;
    }

    let mut table: Vec<TypeCount> = counts
        .into_iter()
        .map(|(plan_type, count)| TypeCount { plan_type, count })
        .collect();
    table.sort_by_key(|t| (Reverse(t.count), type_order(&t.plan_type)));
    table
}

/// Mean total enrollment per plan type, sorted by type name
pub fn average_by_type(rows: &[YearlyPlanCounty]) -> Vec<TypeAverage> {
    let mut sums: HashMap<Option<String>, (f64, usize)> = HashMap::new();
    for row in rows {
        let entry = sums.entry(row.plan_type.clone()).or_insert((0.0, 0));
        entry.0 += row.total_enrollment;
        entry.1 += 1;
    }

    let mut table: Vec<TypeAverage> = sums
        .into_iter()
        .map(|(plan_type, (sum, n))| TypeAverage {
            plan_type,
            average_enrollment: round2(sum / n as f64),
        })
        .collect();
    table.sort_by_key(|t| type_order(&t.plan_type));
    table
}

/// Two decimals, ties to even (0.125 → 0.12, 0.375 → 0.38)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ============================================================================
// CSV OUTPUT
// ============================================================================

pub const COUNT_HEADER: [&str; 2] = ["Type", "Count"];
pub const AVERAGE_HEADER: [&str; 2] = ["Type", "Average Enrollment"];

fn create_writer(path: &Path, header: &[&str]) -> Result<csv::Writer<fs::File>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    // header even when the table is empty
    writer.write_record(header)?;
    Ok(writer)
}

/// Header row plus one line per type; no index column
pub fn write_counts(path: &Path, table: &[TypeCount]) -> Result<()> {
    let mut writer = create_writer(path, &COUNT_HEADER)?;
    for row in table {
        let count = row.count.to_string();
        writer.write_record([row.plan_type.as_deref().unwrap_or(""), count.as_str()])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_averages(path: &Path, table: &[TypeAverage]) -> Result<()> {
    let mut writer = create_writer(path, &AVERAGE_HEADER)?;
    for row in table {
        let average = format!("{:.2}", row.average_enrollment);
        writer.write_record([row.plan_type.as_deref().unwrap_or(""), average.as_str()])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write all three tables into the configured output directory (created if absent)
pub fn write_tables(config: &PipelineConfig, tables: &SummaryTables) -> Result<[PathBuf; 3]> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let paths = config.table_paths();
    write_counts(&paths[0], &tables.plan_count_all)?;
    write_counts(&paths[1], &tables.plan_count_filtered)?;
    write_averages(&paths[2], &tables.average_enrollment)?;

    Ok(paths)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::YesNo;
    use tempfile::TempDir;

    fn create_test_row(plan_type: Option<&str>, total: f64) -> YearlyPlanCounty {
        YearlyPlanCounty {
            contract_id: "H1".to_string(),
            plan_id: "1".to_string(),
            state: "CA".to_string(),
            county: "Kern".to_string(),
            plan_type: plan_type.map(str::to_string),
            snp_flag: Some(YesNo::No),
            eghp_flag: Some(YesNo::No),
            total_enrollment: total,
        }
    }

    #[test]
    fn test_count_by_type_orders_by_count_desc() {
        let rows = vec![
            create_test_row(Some("Local PPO"), 1.0),
            create_test_row(Some("HMO/HMOPOS"), 1.0),
            create_test_row(Some("HMO/HMOPOS"), 1.0),
            create_test_row(Some("Cost"), 1.0),
            create_test_row(None, 1.0),
        ];

        let table = count_by_type(&rows);

        assert_eq!(
            table,
            vec![
                TypeCount { plan_type: Some("HMO/HMOPOS".to_string()), count: 2 },
                TypeCount { plan_type: Some("Cost".to_string()), count: 1 },
                TypeCount { plan_type: Some("Local PPO".to_string()), count: 1 },
                TypeCount { plan_type: None, count: 1 },
            ]
        );
        assert_eq!(table.iter().map(|t| t.count).sum::<usize>(), rows.len());
    }

    #[test]
    fn test_average_by_type_rounds_two_decimals() {
        let rows = vec![
            create_test_row(Some("HMO"), 10.0),
            create_test_row(Some("HMO"), 10.0),
            create_test_row(Some("HMO"), 11.0),
            create_test_row(Some("Cost"), 0.0),
        ];

        let table = average_by_type(&rows);

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].plan_type.as_deref(), Some("Cost"));
        assert_eq!(table[0].average_enrollment, 0.0);
        assert_eq!(table[1].plan_type.as_deref(), Some("HMO"));
        assert_eq!(table[1].average_enrollment, 10.33);
    }

    #[test]
    fn test_average_ties_round_to_even() {
        // eight plan-counties summing to 1 → mean 0.125
        let mut rows = vec![create_test_row(Some("HMO"), 1.0)];
        rows.extend((0..7).map(|_| create_test_row(Some("HMO"), 0.0)));

        let table = average_by_type(&rows);

        assert_eq!(table[0].average_enrollment, 0.12);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_empty_input_gives_empty_tables() {
        let tables = SummaryTables::generate(&[], &[]);
        assert!(tables.plan_count_all.is_empty());
        assert!(tables.average_enrollment.is_empty());
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        write_averages(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "Type,Average Enrollment\n");
    }

    #[test]
    fn test_write_tables_format() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(dir.path(), dir.path().join("results"), 2018);
        let approved = vec![
            create_test_row(Some("HMO"), 1500.0),
            create_test_row(None, 3.0),
        ];
        let filtered = vec![create_test_row(Some("HMO"), 1500.0)];

        let tables = SummaryTables::generate(&approved, &filtered);
        let [t1, t2, t3] = write_tables(&config, &tables).unwrap();

        assert_eq!(fs::read_to_string(t1).unwrap(), "Type,Count\nHMO,1\n,1\n");
        assert_eq!(fs::read_to_string(t2).unwrap(), "Type,Count\nHMO,1\n");
        assert_eq!(
            fs::read_to_string(t3).unwrap(),
            "Type,Average Enrollment\nHMO,1500.00\n"
        );
    }
}
