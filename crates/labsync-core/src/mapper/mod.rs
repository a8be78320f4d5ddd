//! Result mapper: copies remote analyte rows onto local result slots.
//!
//! Matching is by analyte name, first match wins. Gaps are never silent:
//! every sub-item the mapper could not fill is recorded in the report.

mod policy;

pub use policy::*;

use serde::{Deserialize, Serialize};

use labsync_remote::AnalyteRow;

use crate::models::LabTestItem;

/// What happened to each sub-item during one mapping pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MappingReport {
    /// Sub-items whose result value was written
    pub updated: Vec<String>,
    /// Sub-items with no matching remote row (left unchanged)
    pub unmatched: Vec<String>,
    /// Sub-items with more than one matching row (first match used)
    pub ambiguous: Vec<String>,
    /// Sub-items whose matched row yielded no usable value (left unchanged)
    pub skipped: Vec<String>,
}

impl MappingReport {
    /// True when every sub-item was updated without ambiguity.
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty() && self.ambiguous.is_empty() && self.skipped.is_empty()
    }

    /// Human-readable warnings for the gaps in this pass.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for analyte in &self.unmatched {
            warnings.push(format!("no remote result for analyte {analyte}"));
        }
        for analyte in &self.ambiguous {
            warnings.push(format!(
                "multiple remote results for analyte {analyte}; first match used"
            ));
        }
        for analyte in &self.skipped {
            warnings.push(format!(
                "remote result for analyte {analyte} had no usable value"
            ));
        }
        warnings
    }
}

/// Copy remote results onto the local sub-items.
///
/// Rows are matched by analyte name (trimmed, case-insensitive). Sub-items
/// without a match keep their current value. Never fails: gaps are reported,
/// not raised.
pub fn apply_results(
    items: &mut [LabTestItem],
    rows: &[AnalyteRow],
    policy: &dyn ResultPolicy,
) -> MappingReport {
    let mut report = MappingReport::default();

    for item in items.iter_mut() {
        let key = analyte_key(&item.analyte);
        let mut matches = rows
            .iter()
            .filter(|row| analyte_key(&row.analyte_name) == key);

        let Some(first) = matches.next() else {
            report.unmatched.push(item.analyte.clone());
            continue;
        };
        if matches.next().is_some() {
            report.ambiguous.push(item.analyte.clone());
        }

        match policy.result_value(first) {
            Some(value) => {
                item.result_value = Some(value);
                report.updated.push(item.analyte.clone());
            }
            None => report.skipped.push(item.analyte.clone()),
        }
    }

    report
}

fn analyte_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
