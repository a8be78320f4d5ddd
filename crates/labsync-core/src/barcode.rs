//! Barcode payload decoding.
//!
//! Wristband barcodes carry a small XML fragment whose root element holds
//! the external patient identifier used to key the remote result query.

use thiserror::Error;

/// Root-element attribute carrying the external patient identifier.
pub const BARCODE_VALUE_ATTR: &str = "data-barcode-value";

/// Barcode decoding errors.
#[derive(Error, Debug)]
pub enum BarcodeError {
    #[error("Barcode payload is not well-formed XML: {0}")]
    Malformed(String),

    #[error("Patient ID not found from barcode")]
    MissingIdentifier,
}

pub type BarcodeResult<T> = Result<T, BarcodeError>;

/// Extract the external patient identifier from a scanned barcode payload.
///
/// An empty attribute value counts as missing.
pub fn patient_id_from_barcode(barcode: &str) -> BarcodeResult<String> {
    let document =
        roxmltree::Document::parse(barcode).map_err(|e| BarcodeError::Malformed(e.to_string()))?;

    document
        .root_element()
        .attribute(BARCODE_VALUE_ATTR)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(BarcodeError::MissingIdentifier)
}
