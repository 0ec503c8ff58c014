// 🏭 Yearly Pipeline - load → consolidate → aggregate → join → filter → tables
// Strictly sequential; any fatal error aborts the run before anything is written.

use crate::aggregate::EnrollmentAggregator;
use crate::config::PipelineConfig;
use crate::eligibility::{EligibilityFilter, ExclusionRule};
use crate::loader::load_enrollment;
use crate::metadata::consolidate_metadata;
use crate::progress::{ProgressSink, Stage};
use crate::service_area::resolve_service_areas;
use crate::tables::{write_tables, SummaryTables};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// PipelineReport - Row counts at every stage, the tables, and where they went
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub enrollment_rows: usize,
    pub skipped_blank_keys: usize,
    pub metadata_rows: usize,
    pub metadata_conflicts: usize,
    pub suppressed_values: usize,
    pub unmatched_metadata_rows: usize,
    pub yearly_rows: usize,
    pub approved_pairs: usize,
    pub approved_rows: usize,
    pub dropped_by_join: usize,
    pub filtered_rows: usize,
    pub removed_by_rule: Vec<(ExclusionRule, usize)>,
    pub tables: SummaryTables,
    pub written: Vec<PathBuf>,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        let removed: Vec<String> = self
            .removed_by_rule
            .iter()
            .map(|(rule, n)| format!("{} {}", rule.name(), n))
            .collect();

        format!(
            "{} monthly rows → {} plan-counties → {} approved ({} outside service area) → {} after exclusions ({}) | {} suppressed values, {} rows without plan info",
            self.enrollment_rows,
            self.yearly_rows,
            self.approved_rows,
            self.dropped_by_join,
            self.filtered_rows,
            removed.join(", "),
            self.suppressed_values,
            self.unmatched_metadata_rows
        )
    }
}

/// Compute the three tables without writing them
pub fn compute(config: &PipelineConfig, progress: &dyn ProgressSink) -> Result<PipelineReport> {
    let mut report = PipelineReport::default();

    progress.stage_started(Stage::LoadEnrollment);
    let enrollment = load_enrollment(config)?;
    report.enrollment_rows = enrollment.records.len();
    report.skipped_blank_keys = enrollment.skipped_blank_keys;
    if enrollment.skipped_blank_keys > 0 {
        progress.note(
            Stage::LoadEnrollment,
            &format!(
                "skipped {} rows with blank Contract ID or Plan ID",
                enrollment.skipped_blank_keys
            ),
        );
    }
    progress.stage_finished(Stage::LoadEnrollment, report.enrollment_rows);

    progress.stage_started(Stage::ConsolidateMetadata);
    let metadata = consolidate_metadata(config)?;
    for (month, strategy) in &metadata.fallback_months {
        progress.note(
            Stage::ConsolidateMetadata,
            &format!("used '{}' encoding for month {}", strategy.label(), month),
        );
    }
    if metadata.index.conflicts > 0 {
        progress.note(
            Stage::ConsolidateMetadata,
            &format!(
                "{} contract/plan keys had conflicting attributes; kept first seen",
                metadata.index.conflicts
            ),
        );
    }
    report.metadata_rows = metadata.index.distinct_rows;
    report.metadata_conflicts = metadata.index.conflicts;
    progress.stage_finished(Stage::ConsolidateMetadata, report.metadata_rows);

    progress.stage_started(Stage::AggregateEnrollment);
    let yearly = EnrollmentAggregator::new(&metadata.index).aggregate(&enrollment.records);
    report.suppressed_values = yearly.suppressed_values;
    report.unmatched_metadata_rows = yearly.unmatched_rows;
    report.yearly_rows = yearly.rows.len();
    progress.stage_finished(Stage::AggregateEnrollment, report.yearly_rows);

    progress.stage_started(Stage::ResolveServiceArea);
    let service_areas = resolve_service_areas(config)?;
    report.approved_pairs = service_areas.len();
    progress.stage_finished(Stage::ResolveServiceArea, report.approved_pairs);

    let eligibility = EligibilityFilter::new(&service_areas).run(&yearly.rows, progress);
    report.approved_rows = eligibility.approved.len();
    report.dropped_by_join = eligibility.dropped_by_join(report.yearly_rows);
    report.filtered_rows = eligibility.filtered.len();

    report.tables = SummaryTables::generate(&eligibility.approved, &eligibility.filtered);
    report.removed_by_rule = eligibility.removed_by_rule;
    Ok(report)
}

/// Full run: compute, then persist the three tables
pub fn run_pipeline(config: &PipelineConfig, progress: &dyn ProgressSink) -> Result<PipelineReport> {
    let mut report = compute(config, progress)?;

    progress.stage_started(Stage::GenerateTables);
    report.written = write_tables(config, &report.tables)?.to_vec();
    progress.stage_finished(
        Stage::GenerateTables,
        report.tables.plan_count_all.len()
            + report.tables.plan_count_filtered.len()
            + report.tables.average_enrollment.len(),
    );

    Ok(report)
}
