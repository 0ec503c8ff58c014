// 🗂️ Metadata Consolidator - contract/plan attributes for the whole year
// Each month is decoded through the encoding fallback chain, projected to five
// columns, deduplicated, then deduplicated again across months.

use crate::config::{FileKind, PipelineConfig};
use crate::encoding::{DecodingStrategy, CONTRACT_INFO_CHAIN};
use crate::loader::{read_monthly_rows, CONTRACT_ID, EGHP, PLAN_ID, PLAN_TYPE, SNP_PLAN};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const CONTRACT_INFO_COLUMNS: [&str; 5] = [CONTRACT_ID, PLAN_ID, PLAN_TYPE, SNP_PLAN, EGHP];

// ============================================================================
// TYPES
// ============================================================================

/// YesNo - SNP / EGHP indicator. Anything but the exact literals is `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
    Other(String),
}

impl YesNo {
    /// Case-sensitive, as published
    pub fn parse(value: &str) -> Self {
        match value {
            "Yes" => YesNo::Yes,
            "No" => YesNo::No,
            other => YesNo::Other(other.to_string()),
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, YesNo::Yes)
    }
}

/// ContractInfoRow - Projection of a contract/plan extract line; extra columns ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ContractInfoRow {
    #[serde(rename = "Contract ID")]
    contract_id: String,

    #[serde(rename = "Plan ID")]
    plan_id: String,

    #[serde(rename = "Plan Type")]
    plan_type: String,

    #[serde(rename = "SNP Plan")]
    snp_plan: String,

    #[serde(rename = "EGHP")]
    eghp: String,
}

/// ContractMetadata - Attributes of one contract-plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub contract_id: String,
    pub plan_id: String,

    /// None when the cell is blank
    pub plan_type: Option<String>,
    pub snp_flag: Option<YesNo>,
    pub eghp_flag: Option<YesNo>,
}

impl From<ContractInfoRow> for ContractMetadata {
    fn from(row: ContractInfoRow) -> Self {
        ContractMetadata {
            contract_id: row.contract_id,
            plan_id: row.plan_id,
            plan_type: non_empty(row.plan_type),
            snp_flag: non_empty(row.snp_plan).map(|v| YesNo::parse(&v)),
            eghp_flag: non_empty(row.eghp).map(|v| YesNo::parse(&v)),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

// ============================================================================
// CONSOLIDATED METADATA
// ============================================================================

/// MetadataIndex - Deduplicated attributes keyed by (Contract ID, Plan ID)
///
/// Source files are expected to agree. When they don't, the first tuple seen
/// (month order, then row order) is kept and the rest are counted as conflicts.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    by_plan: HashMap<(String, String), ContractMetadata>,

    /// Distinct 5-tuples across all months
    pub distinct_rows: usize,

    /// Distinct tuples that lost to an earlier one with the same key
    pub conflicts: usize,
}

impl MetadataIndex {
    /// Build from rows in precedence order
    pub fn from_rows(rows: impl IntoIterator<Item = ContractMetadata>) -> Self {
        let mut index = MetadataIndex::default();
        let mut seen: HashSet<ContractMetadata> = HashSet::new();

        for row in rows {
            if !seen.insert(row.clone()) {
                continue;
            }
            index.distinct_rows += 1;

            let key = (row.contract_id.clone(), row.plan_id.clone());
            if index.by_plan.contains_key(&key) {
                index.conflicts += 1;
                debug!(contract = %key.0, plan = %key.1, "conflicting contract/plan attributes, keeping first");
            } else {
                index.by_plan.insert(key, row);
            }
        }

        index
    }

    pub fn get(&self, contract_id: &str, plan_id: &str) -> Option<&ContractMetadata> {
        self.by_plan
            .get(&(contract_id.to_string(), plan_id.to_string()))
    }

    /// Number of (Contract ID, Plan ID) keys
    pub fn len(&self) -> usize {
        self.by_plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_plan.is_empty()
    }
}

/// ConsolidatedMetadata - The index plus which months needed a fallback decoding
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedMetadata {
    pub index: MetadataIndex,
    pub fallback_months: Vec<(String, DecodingStrategy)>,
}

/// Load and deduplicate every month's contract/plan file
pub fn consolidate_metadata(config: &PipelineConfig) -> Result<ConsolidatedMetadata> {
    let mut year_rows: Vec<ContractMetadata> = Vec::new();
    let mut fallback_months = Vec::new();

    for (month, path) in config.monthly_paths(FileKind::ContractInfo) {
        let monthly = read_monthly_rows::<ContractInfoRow>(
            FileKind::ContractInfo,
            &month,
            &path,
            &CONTRACT_INFO_CHAIN,
            &CONTRACT_INFO_COLUMNS,
        )?;

        if monthly.used_fallback {
            fallback_months.push((month.clone(), monthly.strategy));
        }

        // within-month dedup, first occurrence order preserved
        let mut seen = HashSet::new();
        year_rows.extend(
            monthly
                .rows
                .into_iter()
                .map(ContractMetadata::from)
                .filter(|row| seen.insert(row.clone())),
        );
    }

    Ok(ConsolidatedMetadata {
        index: MetadataIndex::from_rows(year_rows),
        fallback_months,
    })
}

// ============================================================================
// TESTS
// ============================================================================
