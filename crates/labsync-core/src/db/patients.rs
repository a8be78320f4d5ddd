//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Patient;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                local_id, name, barcode, date_of_birth, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                patient.local_id,
                patient.name,
                patient.barcode,
                patient.date_of_birth,
                patient.notes,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                barcode = ?3,
                date_of_birth = ?4,
                notes = ?5,
                updated_at = datetime('now')
            WHERE local_id = ?1
            "#,
            params![
                patient.local_id,
                patient.name,
                patient.barcode,
                patient.date_of_birth,
                patient.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, local_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                r#"
                SELECT local_id, name, barcode, date_of_birth, notes, created_at, updated_at
                FROM patients
                WHERE local_id = ?
                "#,
                [local_id],
                |row| {
                    Ok(Patient {
                        local_id: row.get(0)?,
                        name: row.get(1)?,
                        barcode: row.get(2)?,
                        date_of_birth: row.get(3)?,
                        notes: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Store a patient's scanned barcode payload.
    pub fn set_patient_barcode(&self, local_id: &str, barcode: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET barcode = ?, updated_at = datetime('now') WHERE local_id = ?",
            [barcode, local_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Search patients by name (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(
            r#"
            SELECT local_id, name, barcode, date_of_birth, notes, created_at, updated_at
            FROM patients
            WHERE name LIKE ?
            ORDER BY name
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![pattern, limit as i64], |row| {
            Ok(Patient {
                local_id: row.get(0)?,
                name: row.get(1)?,
                barcode: row.get(2)?,
                date_of_birth: row.get(3)?,
                notes: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, local_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE local_id = ?", [local_id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Gavin R.".into());
        patient.date_of_birth = Some("1987-03-14".into());

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Gavin R.");
        assert_eq!(retrieved.date_of_birth, Some("1987-03-14".into()));
        assert!(retrieved.barcode.is_none());
    }

    #[test]
    fn test_set_barcode() {
        let db = setup_db();

        let patient = Patient::new("Gavin R.".into());
        db.insert_patient(&patient).unwrap();

        let payload = r#"<barcode data-barcode-value="058246"/>"#;
        assert!(db.set_patient_barcode(&patient.local_id, payload).unwrap());

        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved.barcode.as_deref(), Some(payload));
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        let patient1 = Patient::new("Mary A.".into());
        let patient2 = Patient::new("Maryam B.".into());
        let patient3 = Patient::new("Luka C.".into());

        db.insert_patient(&patient1).unwrap();
        db.insert_patient(&patient2).unwrap();
        db.insert_patient(&patient3).unwrap();

        let results = db.search_patients("Mary", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.name == "Mary A."));
        assert!(results.iter().any(|p| p.name == "Maryam B."));
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = Patient::new("Gavin R.".into());
        db.insert_patient(&patient).unwrap();

        patient.notes = Some("transferred from ward 3".into());
        db.update_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.local_id).unwrap().unwrap();
        assert_eq!(retrieved.notes, Some("transferred from ward 3".into()));
    }
}
