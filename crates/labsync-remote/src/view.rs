//! The analyte-results view query and its row type.

use serde::{Deserialize, Serialize};

use crate::RemoteResult;

/// Fixed query against the analyzer's pre-joined result views, keyed by the
/// external patient identifier (`@P1`).
pub const ANALYTE_RESULTS_SQL: &str = r#"
SELECT
    dbo.view_analyte_result.test_ID AS test_id,
    dbo.view_patient.gx_patient_id AS patient_id,
    dbo.view_test.sample_ID AS sample_id,
    dbo.view_analyte.analyte_name AS analyte_name,
    dbo.view_analyte_result.cycle_threshold AS cycle_threshold,
    dbo.view_analyte_result.endpoint AS endpoint,
    dbo.view_analyte_result.result AS analyte_result,
    dbo.view_analyte_result.probe_check_result AS probe_check_result
FROM
    dbo.view_patient_test_order
    INNER JOIN dbo.view_analyte_result
        ON dbo.view_patient_test_order.test_ID = dbo.view_analyte_result.test_ID
    INNER JOIN dbo.view_test
        ON dbo.view_analyte_result.test_ID = dbo.view_test.test_ID
    INNER JOIN dbo.view_analyte
        ON dbo.view_analyte_result.analyte_id = dbo.view_analyte.analyte_id
    INNER JOIN dbo.view_patient
        ON dbo.view_patient_test_order.patient_id = dbo.view_patient.patient_id
WHERE
    dbo.view_patient.gx_patient_id = @P1
"#;

/// One row of the analyte-results view.
///
/// Ephemeral: produced per query execution and discarded after mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyteRow {
    /// Analyzer-side test run id
    pub test_id: i32,
    /// External patient identifier (as printed on the barcode)
    pub patient_id: String,
    /// Sample identifier entered at the instrument
    pub sample_id: Option<String>,
    /// Analyte name, matched against local sub-item names
    pub analyte_name: String,
    /// Cycle threshold (Ct)
    pub cycle_threshold: Option<f64>,
    /// Reaction endpoint
    pub endpoint: Option<f64>,
    /// Result text, `|`-delimited for qualitative assays
    pub analyte_result: Option<String>,
    /// Probe check outcome
    pub probe_check_result: Option<String>,
}

/// Source of analyte results for one patient.
///
/// The production implementation is [`crate::SqlServerSource`]; tests supply
/// in-memory fakes.
pub trait RemoteSource {
    /// Fetch all analyte result rows for the given external patient id.
    fn fetch_analyte_results(&self, patient_id: &str) -> RemoteResult<Vec<AnalyteRow>>;
}
