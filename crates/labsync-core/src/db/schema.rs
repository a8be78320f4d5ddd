//! SQLite schema definition.

/// Complete database schema for labsync.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    local_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    barcode TEXT,                                -- raw XML wristband payload
    date_of_birth TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Lab Tests
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_tests (
    local_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(local_id),
    test_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',        -- draft, synced
    synced_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_tests_patient ON lab_tests(patient_id);
CREATE INDEX IF NOT EXISTS idx_lab_tests_status ON lab_tests(status);

-- One row per analyte result slot, ordered by position
CREATE TABLE IF NOT EXISTS lab_test_items (
    lab_test_id TEXT NOT NULL REFERENCES lab_tests(local_id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    analyte TEXT NOT NULL,
    result_value TEXT,
    unit TEXT,
    PRIMARY KEY (lab_test_id, position)
);

-- ============================================================================
-- Audit Comments
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_test_comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lab_test_id TEXT NOT NULL REFERENCES lab_tests(local_id) ON DELETE CASCADE,
    comment TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_comments_lab_test ON lab_test_comments(lab_test_id);
"#;
