// 🔎 File Inspection - peek at the first month of each extract
// Shows column names and a few rows so header drift is spotted before a full run.

use crate::config::{month_tag, FileKind, PipelineConfig};
use crate::encoding::{DecodingStrategy, CONTRACT_INFO_CHAIN, DEFAULT_CHAIN};
use crate::error::PipelineError;
use crate::loader::{canonical_column, read_decoded};
use anyhow::Result;
use csv::ReaderBuilder;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const DEFAULT_SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct FileSample {
    pub encoding: DecodingStrategy,

    /// Header cells as published
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FileSample {
    /// Headers that the column-alias table renames
    pub fn aliased_columns(&self) -> Vec<(&str, &str)> {
        self.columns
            .iter()
            .map(|c| (c.as_str(), canonical_column(c)))
            .filter(|(raw, canonical)| raw.trim() != *canonical)
            .collect()
    }
}

/// One file's inspection; a failure here does not stop the others
#[derive(Debug)]
pub struct FileInspection {
    pub kind: FileKind,
    pub path: PathBuf,
    pub sample: Result<FileSample>,
}

fn chain_for(kind: FileKind) -> &'static [DecodingStrategy] {
    match kind {
        FileKind::ContractInfo => &CONTRACT_INFO_CHAIN,
        FileKind::Enrollment | FileKind::ServiceArea => &DEFAULT_CHAIN,
    }
}

pub fn sample_file(kind: FileKind, month: &str, path: &Path, max_rows: usize) -> Result<FileSample> {
    let decoded = read_decoded(kind, month, path, chain_for(kind))?;

    let csv_err = |source| PipelineError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(decoded.text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records().take(max_rows) {
        let record = record.map_err(csv_err)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(FileSample {
        encoding: decoded.strategy,
        columns,
        rows,
    })
}

/// Sample the first configured month of every file kind
pub fn inspect_files(config: &PipelineConfig, max_rows: usize) -> Vec<FileInspection> {
    let month = config.months.first().copied().unwrap_or(1);

    FileKind::ALL
        .into_iter()
        .map(|kind| {
            let path = config.monthly_path(kind, month);
            let sample = sample_file(kind, &month_tag(month), &path, max_rows);
            FileInspection { kind, path, sample }
        })
        .collect()
}

/// Plain-text rendering for the terminal
pub fn render(inspections: &[FileInspection]) -> String {
    let mut out = String::new();

    for inspection in inspections {
        let _ = writeln!(out, "=== {} ===", inspection.kind.name().to_uppercase());
        let _ = writeln!(out, "File: {}", inspection.path.display());

        match &inspection.sample {
            Ok(sample) => {
                let _ = writeln!(out, "Encoding: {}", sample.encoding.label());
                let _ = writeln!(out, "First {} rows:", sample.rows.len());
                for row in &sample.rows {
                    let _ = writeln!(out, "  {}", row.join(" | "));
                }
                let _ = writeln!(out, "Columns: {:?}", sample.columns);
                for (raw, canonical) in sample.aliased_columns() {
                    let _ = writeln!(out, "  '{}' is read as '{}'", raw, canonical);
                }
            }
            Err(err) => {
                let _ = writeln!(out, "Error reading {} file: {:#}", inspection.kind.name(), err);
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_reports_each_file_independently() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(dir.path(), dir.path().join("out"), 2018);
        fs::write(
            config.monthly_path(FileKind::Enrollment, 1),
            "Contract Number,Plan ID,State,County,Enrollment\nH1,1,CA,Kern,*\nH1,2,CA,Kern,11\nH2,1,CA,Kern,12\n",
        )
        .unwrap();

        let inspections = inspect_files(&config, 2);

        assert_eq!(inspections.len(), 3);
        let enrollment = inspections[0].sample.as_ref().unwrap();
        assert_eq!(enrollment.rows.len(), 2);
        assert_eq!(enrollment.columns[0], "Contract Number");
        assert_eq!(enrollment.aliased_columns(), vec![("Contract Number", "Contract ID")]);
        assert!(inspections[1].sample.is_err());
        assert!(inspections[2].sample.is_err());

        let text = render(&inspections);
        assert!(text.contains("=== ENROLLMENT ==="));
        assert!(text.contains("'Contract Number' is read as 'Contract ID'"));
        assert!(text.contains("Error reading service area file"));
    }
}
