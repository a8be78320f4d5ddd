//! Domain models for the labsync system.

mod patient;

pub use lab_test::*;
pub use patient::*;
