// 🗺️ Service-Area Resolver - which contract-county pairs were approved this year
// A pair is approved if it shows up in any month's service-area file.

use crate::config::{FileKind, PipelineConfig};
use crate::encoding::DEFAULT_CHAIN;
use crate::loader::{read_monthly_rows, CONTRACT_ID, COUNTY};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const SERVICE_AREA_COLUMNS: [&str; 2] = [CONTRACT_ID, COUNTY];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ServiceAreaRow {
    #[serde(rename = "Contract ID")]
    contract_id: String,

    #[serde(rename = "County")]
    county: String,
}

/// ServiceAreaPair - (Contract ID, County)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceAreaPair {
    pub contract_id: String,
    pub county: String,
}

impl ServiceAreaPair {
    pub fn new(contract_id: &str, county: &str) -> Self {
        ServiceAreaPair {
            contract_id: contract_id.to_string(),
            county: county.to_string(),
        }
    }
}

/// ApprovedServiceAreas - Set of pairs approved in at least one month.
/// Membership is the "approved" marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovedServiceAreas {
    counties_by_contract: HashMap<String, HashSet<String>>,
}

impl ApprovedServiceAreas {
    pub fn insert(&mut self, pair: ServiceAreaPair) -> bool {
        self.counties_by_contract
            .entry(pair.contract_id)
            .or_default()
            .insert(pair.county)
    }

    pub fn is_approved(&self, contract_id: &str, county: &str) -> bool {
        self.counties_by_contract
            .get(contract_id)
            .map_or(false, |counties| counties.contains(county))
    }

    /// Number of distinct pairs
    pub fn len(&self) -> usize {
        self.counties_by_contract.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<ServiceAreaPair> for ApprovedServiceAreas {
    fn extend<I: IntoIterator<Item = ServiceAreaPair>>(&mut self, iter: I) {
        for pair in iter {
            self.insert(pair);
        }
    }
}

impl FromIterator<ServiceAreaPair> for ApprovedServiceAreas {
    fn from_iter<I: IntoIterator<Item = ServiceAreaPair>>(iter: I) -> Self {
        let mut approved = ApprovedServiceAreas::default();
        approved.extend(iter);
        approved
    }
}

/// Load all months' service-area files and union their pairs
pub fn resolve_service_areas(config: &PipelineConfig) -> Result<ApprovedServiceAreas> {
    let mut approved = ApprovedServiceAreas::default();

    for (month, path) in config.monthly_paths(FileKind::ServiceArea) {
        let monthly = read_monthly_rows::<ServiceAreaRow>(
            FileKind::ServiceArea,
            &month,
            &path,
            &DEFAULT_CHAIN,
            &SERVICE_AREA_COLUMNS,
        )?;

        approved.extend(monthly.rows.into_iter().map(|row| ServiceAreaPair {
            contract_id: row.contract_id,
            county: row.county,
        }));
    }

    Ok(approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_pairs_union_across_months() {
        let dir = TempDir::new().unwrap();
        let header = "Contract ID,Organization Name,Organization Type,Plan Type,SSA State County Code,FIPS State County Code,State,County,Partial,EGHP,Notes\n";
        fs::write(
            dir.path().join(FileKind::ServiceArea.file_name(2018, 1)),
            format!("{}H1,Acme,Local CCP,HMO,05200,06037,CA,Los Angeles,No,No,\nH1,Acme,Local CCP,HMO,05200,06037,CA,Los Angeles,No,No,\n", header),
        )
        .unwrap();
        fs::write(
            dir.path().join(FileKind::ServiceArea.file_name(2018, 2)),
            format!("{}H1,Acme,Local CCP,HMO,05200,06037,CA,Los Angeles,No,No,\nH2,Beta,Local CCP,PPO,05190,06029,CA,Kern,No,No,\n", header),
        )
        .unwrap();

        let config = PipelineConfig {
            months: vec![1, 2],
            ..PipelineConfig::new(dir.path(), dir.path().join("out"), 2018)
        };
        let approved = resolve_service_areas(&config).unwrap();

        assert_eq!(approved.len(), 2);
        assert!(approved.is_approved("H1", "Los Angeles"));
        assert!(approved.is_approved("H2", "Kern"));
        assert!(!approved.is_approved("H1", "Kern"));
    }

    #[test]
    fn test_from_iterator_dedups() {
        let approved: ApprovedServiceAreas = vec![
            ServiceAreaPair::new("H1", "Kern"),
            ServiceAreaPair::new("H1", "Kern"),
        ]
        .into_iter()
        .collect();
        assert_eq!(approved.len(), 1);
        assert!(approved.is_approved("H1", "Kern"));
    }
}
