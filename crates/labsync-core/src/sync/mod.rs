//! Sync orchestration for lab test results.
//!
//! Sequence: load record → require barcode → decode → query remote →
//! map results → persist → comment → notify. One synchronous invocation,
//! one remote connection. Failures before the mapping step abort the whole
//! operation without touching the local record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use labsync_remote::{RemoteError, RemoteSource};

use crate::barcode::{self, BarcodeError};
use crate::db::{Database, DbError};
use crate::mapper::{self, MappingReport, ResultPolicy};
use crate::models::{LabTest, LabTestStatus};

/// Sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Lab test not found: {0}")]
    LabTestNotFound(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Patient barcode not set")]
    MissingBarcode,

    #[error("Barcode error: {0}")]
    Barcode(#[from] BarcodeError),

    #[error("Remote fetch failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Outcome of a successful sync, propagated back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncOutcome {
    /// The updated record as persisted
    pub lab_test: LabTest,
    /// Per-sub-item mapping account
    pub report: MappingReport,
    /// Timestamp written to the record and the audit comment
    pub synced_at: String,
    /// User-facing notification text
    pub message: String,
}

/// Orchestrates one result sync per invocation.
pub struct SyncEngine<'a> {
    db: &'a Database,
}

impl<'a> SyncEngine<'a> {
    /// Create a new engine over the local database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Pull analyte results for one lab test from the remote analyzer store.
    pub fn sync_test_results(
        &self,
        remote: &dyn RemoteSource,
        lab_test_id: &str,
        policy: &dyn ResultPolicy,
    ) -> SyncResult<SyncOutcome> {
        // Step 1: load the record and its patient
        let mut lab_test = self
            .db
            .get_lab_test(lab_test_id)?
            .ok_or_else(|| SyncError::LabTestNotFound(lab_test_id.to_owned()))?;
        let patient = self
            .db
            .get_patient(&lab_test.patient_id)?
            .ok_or_else(|| SyncError::PatientNotFound(lab_test.patient_id.clone()))?;

        // Step 2: require the scanned barcode
        let payload = patient
            .barcode
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or(SyncError::MissingBarcode)?;

        // Step 3: decode the external patient identifier
        let patient_id = barcode::patient_id_from_barcode(payload)?;
        tracing::debug!(lab_test = %lab_test.local_id, %patient_id, "barcode decoded");

        // Step 4: fetch all analyte rows for this patient
        let rows = remote.fetch_analyte_results(&patient_id)?;
        tracing::debug!(lab_test = %lab_test.local_id, rows = rows.len(), "remote rows fetched");

        // Step 5: map results onto the sub-items (never fails; gaps reported)
        let report = mapper::apply_results(&mut lab_test.items, &rows, policy);
        for warning in report.warnings() {
            tracing::warn!(lab_test = %lab_test.local_id, "{warning}");
        }

        // Step 6: persist, append the audit comment, notify
        let synced_at = chrono::Utc::now().to_rfc3339();
        lab_test.status = LabTestStatus::Synced;
        lab_test.synced_at = Some(synced_at.clone());
        lab_test.touch();
        self.db.save_lab_test(&lab_test)?;
        self.db.add_lab_test_comment(
            &lab_test.local_id,
            &format!("Test results synced at {synced_at}"),
        )?;

        tracing::info!(
            lab_test = %lab_test.local_id,
            updated = report.updated.len(),
            "test results synced"
        );

        Ok(SyncOutcome {
            lab_test,
            report,
            synced_at,
            message: "Test results synced".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use labsync_remote::{AnalyteRow, RemoteResult};

    use crate::mapper::CycleThresholdPolicy;
    use crate::models::Patient;

    struct FakeSource {
        rows: Vec<AnalyteRow>,
        calls: Cell<usize>,
    }

    impl FakeSource {
        fn with_rows(rows: Vec<AnalyteRow>) -> Self {
            Self {
                rows,
                calls: Cell::new(0),
            }
        }
    }

    impl RemoteSource for FakeSource {
        fn fetch_analyte_results(&self, _patient_id: &str) -> RemoteResult<Vec<AnalyteRow>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.rows.clone())
        }
    }

    fn ct_row(analyte: &str, ct: f64) -> AnalyteRow {
        AnalyteRow {
            test_id: 4355,
            patient_id: "058246".into(),
            sample_id: Some("GAVIN RSIM".into()),
            analyte_name: analyte.into(),
            cycle_threshold: Some(ct),
            endpoint: Some(0.0),
            analyte_result: None,
            probe_check_result: None,
        }
    }

    fn setup(barcode: Option<&str>) -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let mut patient = Patient::new("Gavin R.".into());
        patient.barcode = barcode.map(str::to_owned);
        db.insert_patient(&patient).unwrap();

        let test = LabTest::new(
            patient.local_id,
            "GeneXpert MTB/RIF".into(),
            vec!["MTB".into(), "AC-2".into()],
        );
        db.insert_lab_test(&test).unwrap();
        (db, test.local_id)
    }

    #[test]
    fn test_missing_barcode_fails_before_remote_call() {
        let (db, test_id) = setup(None);
        let source = FakeSource::with_rows(vec![]);
        let engine = SyncEngine::new(&db);

        let result = engine.sync_test_results(&source, &test_id, &CycleThresholdPolicy);

        assert!(matches!(result, Err(SyncError::MissingBarcode)));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_undecodable_barcode_fails_before_remote_call() {
        let (db, test_id) = setup(Some("<barcode/>"));
        let source = FakeSource::with_rows(vec![]);
        let engine = SyncEngine::new(&db);

        let result = engine.sync_test_results(&source, &test_id, &CycleThresholdPolicy);

        assert!(matches!(
            result,
            Err(SyncError::Barcode(BarcodeError::MissingIdentifier))
        ));
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn test_successful_sync_persists_and_comments() {
        let (db, test_id) = setup(Some(r#"<barcode data-barcode-value="058246"/>"#));
        let source = FakeSource::with_rows(vec![ct_row("MTB", 18.0), ct_row("AC-2", 24.1)]);
        let engine = SyncEngine::new(&db);

        let outcome = engine
            .sync_test_results(&source, &test_id, &CycleThresholdPolicy)
            .unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(outcome.message, "Test results synced");
        assert!(outcome.report.is_clean());

        let stored = db.get_lab_test(&test_id).unwrap().unwrap();
        assert!(matches!(stored.status, LabTestStatus::Synced));
        assert_eq!(stored.items[0].result_value.as_deref(), Some("18"));
        assert_eq!(stored.items[1].result_value.as_deref(), Some("24.1"));

        let comments = db.list_lab_test_comments(&test_id).unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].comment.starts_with("Test results synced at "));
    }

    #[test]
    fn test_unknown_lab_test() {
        let db = Database::open_in_memory().unwrap();
        let source = FakeSource::with_rows(vec![]);
        let engine = SyncEngine::new(&db);

        let result = engine.sync_test_results(&source, "missing", &CycleThresholdPolicy);
        assert!(matches!(result, Err(SyncError::LabTestNotFound(_))));
    }
}
