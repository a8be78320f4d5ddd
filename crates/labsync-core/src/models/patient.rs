//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient record with the scanned wristband barcode payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID - always present, generated locally
    pub local_id: String,
    /// Patient name
    pub name: String,
    /// Raw XML barcode payload scanned from the wristband, if any
    pub barcode: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<String>,
    /// Additional notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            local_id: uuid::Uuid::new_v4().to_string(),
            name,
            barcode: None,
            date_of_birth: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check if a non-empty barcode payload has been scanned.
    pub fn has_barcode(&self) -> bool {
        self.barcode.as_deref().is_some_and(|b| !b.is_empty())
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
