use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::catalog::Catalog;

/// Which sector obligations a document already covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub sector_code: String,
    pub required: Vec<String>,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty()
    }
}

/// `required` lists every obligation applicable to the sector, in catalog order.
pub fn check_missing_obligations<'a, I>(
    catalog: &Catalog,
    sector_code: &str,
    existing: I,
) -> ComplianceReport
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: HashSet<&str> = existing.into_iter().collect();
    let required: Vec<String> = catalog
        .obligations()
        .iter()
        .filter(|obligation| obligation.applies_to_sector(sector_code))
        .map(|obligation| obligation.id.clone())
        .collect();

    let (matched, missing): (Vec<String>, Vec<String>) = required
        .iter()
        .cloned()
        .partition(|id| existing.contains(id.as_str()));

    ComplianceReport {
        sector_code: sector_code.to_string(),
        required,
        matched,
        missing,
    }
}
