// ➕ Enrollment Aggregator - monthly rows → yearly plan-county totals
// Left join against consolidated metadata, coerce enrollment to numbers,
// then sum per (contract, plan, state, county, plan type, SNP, EGHP).

use crate::loader::EnrollmentRecord;
use crate::metadata::{MetadataIndex, YesNo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// Parse an enrollment cell. Suppressed ("*"), blank or otherwise non-numeric
/// values are missing, never an error.
pub fn coerce_enrollment(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// TYPES
// ============================================================================

/// PlanCountyKey - Grouping key. Missing metadata is a valid key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanCountyKey {
    pub contract_id: String,
    pub plan_id: String,
    pub state: String,
    pub county: String,
    pub plan_type: Option<String>,
    pub snp_flag: Option<YesNo>,
    pub eghp_flag: Option<YesNo>,
}

/// YearlyPlanCounty - One plan-county for the year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyPlanCounty {
    pub contract_id: String,
    pub plan_id: String,
    pub state: String,
    pub county: String,
    pub plan_type: Option<String>,
    pub snp_flag: Option<YesNo>,
    pub eghp_flag: Option<YesNo>,

    /// Sum of numeric monthly values; 0.0 if every month was suppressed
    pub total_enrollment: f64,
}

impl YearlyPlanCounty {
    fn from_group(key: PlanCountyKey, total_enrollment: f64) -> Self {
        YearlyPlanCounty {
            contract_id: key.contract_id,
            plan_id: key.plan_id,
            state: key.state,
            county: key.county,
            plan_type: key.plan_type,
            snp_flag: key.snp_flag,
            eghp_flag: key.eghp_flag,
            total_enrollment,
        }
    }
}

/// YearlyTotals - Aggregation output plus what was coerced or unmatched
#[derive(Debug, Clone, Default)]
pub struct YearlyTotals {
    /// Sorted by grouping key
    pub rows: Vec<YearlyPlanCounty>,

    /// Monthly values that were not numeric
    pub suppressed_values: usize,

    /// Monthly rows with no contract/plan metadata (kept, with missing attributes)
    pub unmatched_rows: usize,
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// EnrollmentAggregator - Left join + group-by-sum
pub struct EnrollmentAggregator<'a> {
    metadata: &'a MetadataIndex,
}

impl<'a> EnrollmentAggregator<'a> {
    pub fn new(metadata: &'a MetadataIndex) -> Self {
        EnrollmentAggregator { metadata }
    }

    /// Collapse monthly enrollment records to one row per plan-county
    pub fn aggregate(&self, records: &[EnrollmentRecord]) -> YearlyTotals {
        let mut groups: BTreeMap<PlanCountyKey, f64> = BTreeMap::new();
        let mut suppressed_values = 0;
        let mut unmatched_rows = 0;

        for record in records {
            let key = self.join_key(record, &mut unmatched_rows);
            let value = coerce_enrollment(&record.enrollment);
            if value.is_none() {
                suppressed_values += 1;
            }

            *groups.entry(key).or_insert(0.0) += value.unwrap_or(0.0);
        }

        YearlyTotals {
            rows: groups
                .into_iter()
                .map(|(key, total)| YearlyPlanCounty::from_group(key, total))
                .collect(),
            suppressed_values,
            unmatched_rows,
        }
    }

    /// Left join on (Contract ID, Plan ID)
    fn join_key(&self, record: &EnrollmentRecord, unmatched: &mut usize) -> PlanCountyKey {
        let meta = self.metadata.get(&record.contract_id, &record.plan_id);
        if meta.is_none() {
            *unmatched += 1;
        }

        PlanCountyKey {
            contract_id: record.contract_id.clone(),
            plan_id: record.plan_id.clone(),
            state: record.state.clone(),
            county: record.county.clone(),
            plan_type: meta.and_then(|m| m.plan_type.clone()),
            snp_flag: meta.and_then(|m| m.snp_flag.clone()),
            eghp_flag: meta.and_then(|m| m.eghp_flag.clone()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ContractMetadata;

    fn create_test_record(contract: &str, plan: &str, county: &str, enrollment: &str, month: &str) -> EnrollmentRecord {
        EnrollmentRecord {
            contract_id: contract.to_string(),
            plan_id: plan.to_string(),
            state: "CA".to_string(),
            county: county.to_string(),
            enrollment: enrollment.to_string(),
            source_month: month.to_string(),
        }
    }

    fn create_test_index() -> MetadataIndex {
        MetadataIndex::from_rows(vec![ContractMetadata {
            contract_id: "H1234".to_string(),
            plan_id: "001".to_string(),
            plan_type: Some("HMO".to_string()),
            snp_flag: Some(YesNo::No),
            eghp_flag: Some(YesNo::No),
        }])
    }

    #[test]
    fn test_coerce_enrollment() {
        assert_eq!(coerce_enrollment("1500"), Some(1500.0));
        assert_eq!(coerce_enrollment(" 12 "), Some(12.0));
        assert_eq!(coerce_enrollment("3.5"), Some(3.5));
        assert_eq!(coerce_enrollment("*"), None);
        assert_eq!(coerce_enrollment(""), None);
        assert_eq!(coerce_enrollment("1,500"), None);
        assert_eq!(coerce_enrollment("NaN"), None);
        assert_eq!(coerce_enrollment("inf"), None);
    }

    #[test]
    fn test_sums_across_months() {
        let index = create_test_index();
        let records = vec![
            create_test_record("H1234", "001", "Los Angeles", "1000", "01"),
            create_test_record("H1234", "001", "Los Angeles", "500", "02"),
        ];

        let totals = EnrollmentAggregator::new(&index).aggregate(&records);

        assert_eq!(totals.rows.len(), 1);
        assert_eq!(totals.rows[0].total_enrollment, 1500.0);
        assert_eq!(totals.rows[0].plan_type.as_deref(), Some("HMO"));
        assert_eq!(totals.suppressed_values, 0);
    }

    #[test]
    fn test_suppressed_values_contribute_zero() {
        let index = create_test_index();
        let records = vec![
            create_test_record("H1234", "001", "Kern", "*", "01"),
            create_test_record("H1234", "001", "Kern", "40", "02"),
            create_test_record("H1234", "001", "Fresno", "*", "01"),
        ];

        let totals = EnrollmentAggregator::new(&index).aggregate(&records);

        assert_eq!(totals.rows.len(), 2, "all-suppressed group is still a row");
        let fresno = totals.rows.iter().find(|r| r.county == "Fresno").unwrap();
        let kern = totals.rows.iter().find(|r| r.county == "Kern").unwrap();
        assert_eq!(fresno.total_enrollment, 0.0);
        assert_eq!(kern.total_enrollment, 40.0);
        assert_eq!(totals.suppressed_values, 2);
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows() {
        let index = create_test_index();
        let records = vec![
            create_test_record("H9999", "002", "Kern", "11", "01"),
            create_test_record("H9999", "002", "Kern", "12", "02"),
        ];

        let totals = EnrollmentAggregator::new(&index).aggregate(&records);

        assert_eq!(totals.rows.len(), 1, "missing metadata is a valid group key");
        assert_eq!(totals.rows[0].plan_type, None);
        assert_eq!(totals.rows[0].snp_flag, None);
        assert_eq!(totals.rows[0].total_enrollment, 23.0);
        assert_eq!(totals.unmatched_rows, 2);
    }

    #[test]
    fn test_groups_split_by_state() {
        let index = create_test_index();
        let mut other_state = create_test_record("H1234", "001", "Lake", "5", "01");
        other_state.state = "OR".to_string();
        let records = vec![create_test_record("H1234", "001", "Lake", "7", "01"), other_state];

        let totals = EnrollmentAggregator::new(&index).aggregate(&records);

        assert_eq!(totals.rows.len(), 2);
    }
}
