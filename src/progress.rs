// 📣 Progress Reporting - stage boundaries of the yearly pipeline
// The core calls a ProgressSink; how it is rendered is up to the caller.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::{info, warn};

// ============================================================================
// STAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    LoadEnrollment,
    ConsolidateMetadata,
    AggregateEnrollment,
    ResolveServiceArea,
    JoinServiceArea,
    ApplyExclusions,
    GenerateTables,
}

impl Stage {
    pub fn label(&self) -> &str {
        match self {
            Stage::LoadEnrollment => "load monthly enrollment",
            Stage::ConsolidateMetadata => "consolidate contract/plan info",
            Stage::AggregateEnrollment => "collapse to yearly plan-county totals",
            Stage::ResolveServiceArea => "resolve approved service areas",
            Stage::JoinServiceArea => "inner join on service area",
            Stage::ApplyExclusions => "apply SNP/EGHP/800-series exclusions",
            Stage::GenerateTables => "generate summary tables",
        }
    }
}

// ============================================================================
// PROGRESS SINK
// ============================================================================

/// ProgressSink - Receives stage boundaries and row counts from the pipeline
pub trait ProgressSink {
    fn stage_started(&self, stage: Stage);

    /// `rows` is the size of the table the stage produced
    fn stage_finished(&self, stage: Stage, rows: usize);

    /// Free-form observation inside a stage (fallback encodings, conflicts...)
    fn note(&self, stage: Stage, message: &str) {
        let _ = (stage, message);
    }
}

/// Forwards every event to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn stage_started(&self, stage: Stage) {
        info!(stage = stage.label(), "stage started");
    }

    fn stage_finished(&self, stage: Stage, rows: usize) {
        info!(stage = stage.label(), rows, "stage finished");
    }

    fn note(&self, stage: Stage, message: &str) {
        warn!(stage = stage.label(), "{}", message);
    }
}

/// ProgressEvent - What RecordingProgress keeps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Started(Stage),
    Finished(Stage, usize),
    Note(Stage, String),
}

/// Collects events in memory, in call order
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: RefCell<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        RecordingProgress::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.borrow().clone()
    }

    /// Row count reported when `stage` finished, if it did
    pub fn rows_for(&self, stage: Stage) -> Option<usize> {
        self.events.borrow().iter().find_map(|e| match e {
            ProgressEvent::Finished(s, rows) if *s == stage => Some(*rows),
            _ => None,
        })
    }
}

impl ProgressSink for RecordingProgress {
    fn stage_started(&self, stage: Stage) {
        self.events.borrow_mut().push(ProgressEvent::Started(stage));
    }

    fn stage_finished(&self, stage: Stage, rows: usize) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Finished(stage, rows));
    }

    fn note(&self, stage: Stage, message: &str) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Note(stage, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_progress_keeps_order() {
        let progress = RecordingProgress::new();
        progress.stage_started(Stage::LoadEnrollment);
        progress.note(Stage::LoadEnrollment, "skipped 2 rows");
        progress.stage_finished(Stage::LoadEnrollment, 42);

        assert_eq!(
            progress.events(),
            vec![
                ProgressEvent::Started(Stage::LoadEnrollment),
                ProgressEvent::Note(Stage::LoadEnrollment, "skipped 2 rows".to_string()),
                ProgressEvent::Finished(Stage::LoadEnrollment, 42),
            ]
        );
        assert_eq!(progress.rows_for(Stage::LoadEnrollment), Some(42));
        assert_eq!(progress.rows_for(Stage::GenerateTables), None);
    }
}
