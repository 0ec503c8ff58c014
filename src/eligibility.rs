// ✂️ Eligibility Filter & Joiner - approved service areas, then exclusions
// Inner join on (Contract ID, County), then three sequential exclusion rules.

use crate::aggregate::YearlyPlanCounty;
use crate::progress::{ProgressSink, Stage};
use crate::service_area::ApprovedServiceAreas;
use serde::{Deserialize, Serialize};

// ============================================================================
// EXCLUSION RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionRule {
    /// Special Needs Plans: SNP Plan == "Yes"
    SpecialNeeds,

    /// Employer Group plans: EGHP == "Yes"
    EmployerGroup,

    /// "800-series": Plan ID text starts with '8'.
    /// Broader than 800-899 on purpose: "8", "80" and "8123" all match.
    EightHundredSeries,
}

impl ExclusionRule {
    /// Applied in this order
    pub const ALL: [ExclusionRule; 3] = [
        ExclusionRule::SpecialNeeds,
        ExclusionRule::EmployerGroup,
        ExclusionRule::EightHundredSeries,
    ];

    pub fn name(&self) -> &str {
        match self {
            ExclusionRule::SpecialNeeds => "SNP",
            ExclusionRule::EmployerGroup => "EGHP",
            ExclusionRule::EightHundredSeries => "800-series",
        }
    }

    pub fn excludes(&self, row: &YearlyPlanCounty) -> bool {
        match self {
            ExclusionRule::SpecialNeeds => row.snp_flag.as_ref().map_or(false, |f| f.is_yes()),
            ExclusionRule::EmployerGroup => row.eghp_flag.as_ref().map_or(false, |f| f.is_yes()),
            ExclusionRule::EightHundredSeries => row.plan_id.starts_with('8'),
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// EligibilityResult - Both datasets the tables are built from
#[derive(Debug, Clone, Default)]
pub struct EligibilityResult {
    /// Yearly rows with an approved service-area pair (unfiltered)
    pub approved: Vec<YearlyPlanCounty>,

    /// `approved` after all three exclusions
    pub filtered: Vec<YearlyPlanCounty>,

    /// Rows dropped by each rule, in application order
    pub removed_by_rule: Vec<(ExclusionRule, usize)>,
}

impl EligibilityResult {
    /// Yearly rows the inner join removed
    pub fn dropped_by_join(&self, yearly_rows: usize) -> usize {
        yearly_rows.saturating_sub(self.approved.len())
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct EligibilityFilter<'a> {
    service_areas: &'a ApprovedServiceAreas,
    rules: Vec<ExclusionRule>,
}

impl<'a> EligibilityFilter<'a> {
    /// Filter with the standard SNP → EGHP → 800-series sequence
    pub fn new(service_areas: &'a ApprovedServiceAreas) -> Self {
        EligibilityFilter {
            service_areas,
            rules: ExclusionRule::ALL.to_vec(),
        }
    }

    /// Inner join: keep rows whose (Contract ID, County) is approved
    pub fn join(&self, yearly: &[YearlyPlanCounty]) -> Vec<YearlyPlanCounty> {
        yearly
            .iter()
            .filter(|row| self.service_areas.is_approved(&row.contract_id, &row.county))
            .cloned()
            .collect()
    }

    /// Each rule sees only the survivors of the previous one
    pub fn apply_exclusions(&self, approved: &[YearlyPlanCounty]) -> (Vec<YearlyPlanCounty>, Vec<(ExclusionRule, usize)>) {
        let mut surviving = approved.to_vec();
        let mut removed_by_rule = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let before = surviving.len();
            surviving.retain(|row| !rule.excludes(row));
            removed_by_rule.push((*rule, before - surviving.len()));
        }

        (surviving, removed_by_rule)
    }

    /// Join then exclusions, reporting each as its own stage
    pub fn run(&self, yearly: &[YearlyPlanCounty], progress: &dyn ProgressSink) -> EligibilityResult {
        progress.stage_started(Stage::JoinServiceArea);
        let approved = self.join(yearly);
        progress.stage_finished(Stage::JoinServiceArea, approved.len());

        progress.stage_started(Stage::ApplyExclusions);
        let (filtered, removed_by_rule) = self.apply_exclusions(&approved);
        progress.stage_finished(Stage::ApplyExclusions, filtered.len());

        EligibilityResult {
            approved,
            filtered,
            removed_by_rule,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
