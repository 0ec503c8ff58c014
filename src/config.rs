// ⚙️ Pipeline Configuration - where the monthly extracts live and where tables go
// One file per month per category, named by a fixed CMS convention

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// FILE KINDS
// ============================================================================

/// FileKind - Which monthly CMS extract a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Enrollment,
    ContractInfo,
    ServiceArea,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [
        FileKind::Enrollment,
        FileKind::ContractInfo,
        FileKind::ServiceArea,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            FileKind::Enrollment => "enrollment",
            FileKind::ContractInfo => "contract/plan info",
            FileKind::ServiceArea => "service area",
        }
    }

    /// File name prefix used by CMS
    pub fn prefix(&self) -> &str {
        match self {
            FileKind::Enrollment => "CPSC_Enrollment_Info",
            FileKind::ContractInfo => "CPSC_Contract_Info",
            FileKind::ServiceArea => "MA_Cnty_SA",
        }
    }

    /// `{prefix}_{year}_{MM}.csv`
    pub fn file_name(&self, year: u16, month: u32) -> String {
        format!("{}_{}_{}.csv", self.prefix(), year, month_tag(month))
    }
}

/// Zero-padded two-digit month, as used in file names and the SourceMonth tag
pub fn month_tag(month: u32) -> String {
    format!("{:02}", month)
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

pub const DEFAULT_INPUT_DIR: &str = "./data/input/";
pub const DEFAULT_OUTPUT_DIR: &str = "./results/";
pub const DEFAULT_YEAR: u16 = 2018;

pub const TABLE1_FILE: &str = "table1_plan_count_all.csv";
pub const TABLE2_FILE: &str = "table2_plan_count_filtered.csv";
pub const TABLE3_FILE: &str = "table3_avg_enrollment.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the monthly CSV extracts
    pub input_dir: PathBuf,

    /// Directory the three summary tables are written to
    pub output_dir: PathBuf,

    /// Reporting year embedded in every file name
    pub year: u16,

    /// Months to load (always 1..=12 for a real run)
    pub months: Vec<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            year: DEFAULT_YEAR,
            months: (1..=12).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, year: u16) -> Self {
        PipelineConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            year,
            ..PipelineConfig::default()
        }
    }

    /// Full path of one monthly file
    pub fn monthly_path(&self, kind: FileKind, month: u32) -> PathBuf {
        self.input_dir.join(kind.file_name(self.year, month))
    }

    /// (month tag, path) for every configured month, in month order
    pub fn monthly_paths(&self, kind: FileKind) -> Vec<(String, PathBuf)> {
        self.months
            .iter()
            .map(|&m| (month_tag(m), self.monthly_path(kind, m)))
            .collect()
    }

    pub fn table_paths(&self) -> [PathBuf; 3] {
        [
            self.output_dir.join(TABLE1_FILE),
            self.output_dir.join(TABLE2_FILE),
            self.output_dir.join(TABLE3_FILE),
        ]
    }
}

// ============================================================================
// TESTS
// ============================================================================
