//! LabSync Core Library
//!
//! Lab test result synchronization from remote analyzer databases.
//!
//! # Architecture
//!
//! ```text
//! Wristband Barcode (XML) ──decode──▶ External Patient ID
//!                                             │
//!                                ┌────────────▼────────────┐
//!                                │  Remote Analyzer Store  │
//!                                │  (SQL Server, one view  │
//!                                │   query per sync call)  │
//!                                └────────────┬────────────┘
//!                                             │ analyte rows
//!                                ┌────────────▼────────────┐
//!                                │      Result Mapper      │
//!                                │  match by analyte name, │
//!                                │  policy picks the value │
//!                                └────────────┬────────────┘
//!                                             │
//!                           persist ── audit comment ── notify
//! ```
//!
//! # Core Principle
//!
//! **One synchronous remote connection per user action.** The connection is
//! opened for a single query and released unconditionally afterward.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer for the locally owned records
//! - [`models`]: Domain types (Patient, LabTest, LabTestItem)
//! - [`barcode`]: Barcode payload decoding
//! - [`mapper`]: Remote-row to sub-item mapping and result policies
//! - [`sync`]: The sync orchestrator

pub mod barcode;
pub mod db;
pub mod mapper;
pub mod models;
pub mod sync;

// Re-export commonly used types
pub use barcode::patient_id_from_barcode;
pub use db::Database;
pub use labsync_remote::{AnalyteRow, RemoteConfig, RemoteSource, SqlServerSource};
pub use mapper::{CycleThresholdPolicy, DetectionPolicy, MappingReport, ResultPolicy};
pub use models::{LabTest, LabTestComment, LabTestItem, LabTestStatus, Patient};
pub use sync::{SyncEngine, SyncOutcome};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum LabSyncError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote database not set")]
    RemoteNotConfigured,

    #[error("Remote error: {0}")]
    RemoteError(String),
}

impl From<db::DbError> for LabSyncError {
    fn from(e: db::DbError) -> Self {
        LabSyncError::DatabaseError(e.to_string())
    }
}

impl From<sync::SyncError> for LabSyncError {
    fn from(e: sync::SyncError) -> Self {
        use crate::sync::SyncError;
        match e {
            SyncError::LabTestNotFound(_) | SyncError::PatientNotFound(_) => {
                LabSyncError::NotFound(e.to_string())
            }
            SyncError::MissingBarcode => LabSyncError::InvalidInput("Patient barcode not set".into()),
            SyncError::Barcode(inner) => LabSyncError::InvalidInput(inner.to_string()),
            SyncError::Remote(labsync_remote::RemoteError::NotConfigured) => {
                LabSyncError::RemoteNotConfigured
            }
            SyncError::Remote(inner) => LabSyncError::RemoteError(inner.to_string()),
            SyncError::Db(inner) => LabSyncError::DatabaseError(inner.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for LabSyncError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        LabSyncError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<LabSync>, LabSyncError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(LabSync {
        db: Arc::new(Mutex::new(db)),
        remote_config: Mutex::new(None),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<LabSync>, LabSyncError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(LabSync {
        db: Arc::new(Mutex::new(db)),
        remote_config: Mutex::new(None),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe host-application handle.
#[derive(uniffi::Object)]
pub struct LabSync {
    db: Arc<Mutex<Database>>,
    remote_config: Mutex<Option<RemoteConfig>>,
}

#[uniffi::export]
impl LabSync {
    // =========================================================================
    // Remote Configuration
    // =========================================================================

    /// Supply the analyzer database connection parameters.
    pub fn set_remote_config(&self, config: FfiRemoteConfig) -> Result<(), LabSyncError> {
        *self.remote_config.lock()? = Some(config.into());
        Ok(())
    }

    /// Forget the analyzer database connection parameters.
    pub fn clear_remote_config(&self) -> Result<(), LabSyncError> {
        *self.remote_config.lock()? = None;
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, name: String) -> Result<FfiPatient, LabSyncError> {
        let db = self.db.lock()?;
        let patient = Patient::new(name);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: String) -> Result<Option<FfiPatient>, LabSyncError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&local_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Store a patient's scanned wristband barcode payload.
    pub fn set_patient_barcode(
        &self,
        local_id: String,
        barcode: String,
    ) -> Result<(), LabSyncError> {
        let db = self.db.lock()?;
        if !db.set_patient_barcode(&local_id, &barcode)? {
            return Err(LabSyncError::NotFound(local_id));
        }
        Ok(())
    }

    /// Search patients by name.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, LabSyncError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Lab Test Operations
    // =========================================================================

    /// Order a new lab test with one empty result slot per analyte.
    pub fn create_lab_test(
        &self,
        patient_id: String,
        test_name: String,
        analytes: Vec<String>,
    ) -> Result<FfiLabTest, LabSyncError> {
        let db = self.db.lock()?;
        let test = LabTest::new(patient_id, test_name, analytes);
        db.insert_lab_test(&test)?;
        Ok(test.into())
    }

    /// Get a lab test by ID.
    pub fn get_lab_test(&self, local_id: String) -> Result<Option<FfiLabTest>, LabSyncError> {
        let db = self.db.lock()?;
        let test = db.get_lab_test(&local_id)?;
        Ok(test.map(|t| t.into()))
    }

    /// List a lab test's audit comments, oldest first.
    pub fn get_lab_test_comments(
        &self,
        lab_test_id: String,
    ) -> Result<Vec<String>, LabSyncError> {
        let db = self.db.lock()?;
        let comments = db.list_lab_test_comments(&lab_test_id)?;
        Ok(comments.into_iter().map(|c| c.comment).collect())
    }

    // =========================================================================
    // Sync Operation
    // =========================================================================

    /// Pull analyte results for one lab test from the analyzer database.
    ///
    /// The single remote-facing entry point. Fails with
    /// [`LabSyncError::RemoteNotConfigured`] before any query when no
    /// connection parameters have been supplied.
    pub fn sync_test_results(
        &self,
        lab_test_id: String,
        mode: FfiResultMode,
    ) -> Result<FfiSyncOutcome, LabSyncError> {
        let config = self.remote_config.lock()?.clone();
        let source = SqlServerSource::new(config);

        let policy: Box<dyn ResultPolicy> = match mode {
            FfiResultMode::CycleThreshold => Box::new(CycleThresholdPolicy),
            FfiResultMode::Detection => Box::new(DetectionPolicy::default()),
        };

        let db = self.db.lock()?;
        let engine = SyncEngine::new(&db);
        let outcome = engine.sync_test_results(&source, &lab_test_id, policy.as_ref())?;
        Ok(outcome.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// Which remote field becomes the sub-item result.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiResultMode {
    /// Copy the numeric cycle threshold
    CycleThreshold,
    /// Classify `|`-delimited qualitative result text
    Detection,
}

/// FFI-safe remote connection parameters.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRemoteConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl From<FfiRemoteConfig> for RemoteConfig {
    fn from(config: FfiRemoteConfig) -> Self {
        RemoteConfig {
            host: config.host,
            port: config.port,
            user: config.user,
            password: config.password,
            database: config.database,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub local_id: String,
    pub name: String,
    pub barcode: Option<String>,
    pub date_of_birth: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            local_id: patient.local_id,
            name: patient.name,
            barcode: patient.barcode,
            date_of_birth: patient.date_of_birth,
        }
    }
}

/// FFI-safe lab test.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabTest {
    pub local_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub status: String,
    pub items: Vec<FfiLabTestItem>,
    pub synced_at: Option<String>,
    pub has_pending_results: bool,
}

impl From<LabTest> for FfiLabTest {
    fn from(test: LabTest) -> Self {
        Self {
            local_id: test.local_id.clone(),
            patient_id: test.patient_id.clone(),
            test_name: test.test_name.clone(),
            status: format!("{:?}", test.status),
            has_pending_results: test.has_pending_results(),
            synced_at: test.synced_at.clone(),
            items: test.items.into_iter().map(|i| i.into()).collect(),
        }
    }
}

/// FFI-safe result slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLabTestItem {
    pub analyte: String,
    pub result_value: Option<String>,
    pub unit: Option<String>,
}

impl From<LabTestItem> for FfiLabTestItem {
    fn from(item: LabTestItem) -> Self {
        Self {
            analyte: item.analyte,
            result_value: item.result_value,
            unit: item.unit,
        }
    }
}

/// FFI-safe sync outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncOutcome {
    pub lab_test: FfiLabTest,
    pub message: String,
    pub synced_at: String,
    pub updated: Vec<String>,
    pub unmatched: Vec<String>,
    pub ambiguous: Vec<String>,
    pub skipped: Vec<String>,
}

impl From<SyncOutcome> for FfiSyncOutcome {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            lab_test: outcome.lab_test.into(),
            message: outcome.message,
            synced_at: outcome.synced_at,
            updated: outcome.report.updated,
            unmatched: outcome.report.unmatched,
            ambiguous: outcome.report.ambiguous,
            skipped: outcome.report.skipped,
        }
    }
}
