use crate::config::FileKind;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a run. Raised inside `anyhow::Error`;
/// callers can recover the kind with `downcast_ref::<PipelineError>()`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing {} file for month {month}: {}", kind.name(), path.display())]
    MissingFile {
        kind: FileKind,
        month: String,
        path: PathBuf,
    },

    #[error("could not decode {} with any of: {}", path.display(), attempted.join(", "))]
    Undecodable {
        path: PathBuf,
        attempted: Vec<&'static str>,
    },

    #[error("column '{column}' not found in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_message_names_path() {
        let err = PipelineError::MissingFile {
            kind: FileKind::Enrollment,
            month: "04".to_string(),
            path: PathBuf::from("data/CPSC_Enrollment_Info_2018_04.csv"),
        };
        let msg = err.to_string();
        assert!(msg.contains("enrollment"));
        assert!(msg.contains("month 04"));
        assert!(msg.contains("CPSC_Enrollment_Info_2018_04.csv"));
    }

    #[test]
    fn test_undecodable_lists_attempts() {
        let err = PipelineError::Undecodable {
            path: PathBuf::from("x.csv"),
            attempted: vec!["utf-8", "windows-1252", "iso-8859-1"],
        };
        assert_eq!(
            err.to_string(),
            "could not decode x.csv with any of: utf-8, windows-1252, iso-8859-1"
        );
    }
}
