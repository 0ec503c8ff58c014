// 📂 Record Loader - monthly CMS extracts → one in-memory table
// Every file is read whole, decoded, header-normalised, then deserialized by column name.

use crate::config::{FileKind, PipelineConfig};
use crate::encoding::{decode_with_fallback, Decoded, DecodingStrategy, DEFAULT_CHAIN};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const CONTRACT_ID: &str = "Contract ID";
pub const PLAN_ID: &str = "Plan ID";
pub const STATE: &str = "State";
pub const COUNTY: &str = "County";
pub const ENROLLMENT: &str = "Enrollment";
pub const PLAN_TYPE: &str = "Plan Type";
pub const SNP_PLAN: &str = "SNP Plan";
pub const EGHP: &str = "EGHP";

/// Raw header → canonical header. Applied to every file before any join.
pub const COLUMN_ALIASES: &[(&str, &str)] = &[("Contract Number", CONTRACT_ID)];

pub const ENROLLMENT_COLUMNS: [&str; 5] = [CONTRACT_ID, PLAN_ID, STATE, COUNTY, ENROLLMENT];

/// Canonical name for a header cell
pub fn canonical_column(header: &str) -> &str {
    let header = header.trim();
    COLUMN_ALIASES
        .iter()
        .find(|(raw, _)| *raw == header)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(header)
}

// ============================================================================
// GENERIC MONTHLY READER
// ============================================================================

/// MonthlyRows - One month's file, deserialized
#[derive(Debug, Clone)]
pub struct MonthlyRows<T> {
    pub month: String,
    pub strategy: DecodingStrategy,

    /// Decoded by a strategy other than the chain's first
    pub used_fallback: bool,
    pub rows: Vec<T>,
}

/// Read one monthly file whole and decode it with the first strategy in `chain` that succeeds.
///
/// * missing file → `PipelineError::MissingFile`
/// * no strategy in `chain` decodes it → `PipelineError::Undecodable`
pub fn read_decoded(kind: FileKind, month: &str, path: &Path, chain: &[DecodingStrategy]) -> Result<Decoded> {
    if !path.is_file() {
        return Err(PipelineError::MissingFile {
            kind,
            month: month.to_string(),
            path: path.to_path_buf(),
        }
        .into());
    }

    let bytes = fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = decode_with_fallback(&bytes, chain).map_err(|attempted| PipelineError::Undecodable {
        path: path.to_path_buf(),
        attempted,
    })?;
    Ok(decoded)
}

/// Read one monthly file into `T` rows.
///
/// Fails as `read_decoded` does, or with `PipelineError::MissingColumn`
/// when any of `required` is absent after aliasing.
pub fn read_monthly_rows<T: DeserializeOwned>(
    kind: FileKind,
    month: &str,
    path: &Path,
    chain: &[DecodingStrategy],
    required: &[&str],
) -> Result<MonthlyRows<T>> {
    let decoded = read_decoded(kind, month, path, chain)?;
    let rows = parse_rows(&decoded.text, path, required)?;
    debug!(
        kind = kind.name(),
        month,
        rows = rows.len(),
        encoding = decoded.strategy.label(),
        "read monthly file"
    );

    Ok(MonthlyRows {
        month: month.to_string(),
        strategy: decoded.strategy,
        used_fallback: decoded.used_fallback(chain),
        rows,
    })
}

/// Parse decoded CSV text, renaming headers through `COLUMN_ALIASES`
pub fn parse_rows<T: DeserializeOwned>(text: &str, path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(canonical_column)
        .collect();

    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            }
            .into());
        }
    }
    reader.set_headers(headers);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        // +2: 1-indexed plus the header row
        let row: T = result
            .map_err(csv_err)
            .with_context(|| format!("Failed to parse line {} in {}", idx + 2, path.display()))?;
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// ENROLLMENT
// ============================================================================

/// EnrollmentRow - One line of an enrollment extract, as published
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnrollmentRow {
    #[serde(rename = "Contract ID")]
    contract_id: String,

    #[serde(rename = "Plan ID")]
    plan_id: String,

    #[serde(rename = "State")]
    state: String,

    #[serde(rename = "County")]
    county: String,

    #[serde(rename = "Enrollment")]
    enrollment: String,
}

/// EnrollmentRecord - One contract-plan-county-month observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub contract_id: String,
    pub plan_id: String,
    pub state: String,
    pub county: String,

    /// Enrollment cell as published; may be a suppression marker such as "*"
    pub enrollment: String,

    /// Two-digit month the row came from
    pub source_month: String,
}

/// EnrollmentLoad - All configured months, concatenated in month order
#[derive(Debug, Clone, Default)]
pub struct EnrollmentLoad {
    pub records: Vec<EnrollmentRecord>,

    /// Rows dropped because Contract ID or Plan ID was blank
    pub skipped_blank_keys: usize,
}

/// Load every month's enrollment file. All-or-nothing: the first bad file aborts.
pub fn load_enrollment(config: &PipelineConfig) -> Result<EnrollmentLoad> {
    let mut load = EnrollmentLoad::default();

    for (month, path) in config.monthly_paths(FileKind::Enrollment) {
        let monthly: MonthlyRows<EnrollmentRow> = read_monthly_rows(
            FileKind::Enrollment,
            &month,
            &path,
            &DEFAULT_CHAIN,
            &ENROLLMENT_COLUMNS,
        )?;

        for row in monthly.rows {
            if row.contract_id.is_empty() || row.plan_id.is_empty() {
                load.skipped_blank_keys += 1;
                continue;
            }
            load.records.push(EnrollmentRecord {
                contract_id: row.contract_id,
                plan_id: row.plan_id,
                state: row.state,
                county: row.county,
                enrollment: row.enrollment,
                source_month: month.clone(),
            });
        }
    }

    Ok(load)
}

// ============================================================================
// TESTS
// ============================================================================
