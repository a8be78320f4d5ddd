//! SQL Server integration for lab analyzer result stores.
//!
//! This crate provides the remote half of result synchronization: a
//! connection wrapper around the analyzer's SQL Server results database and
//! the fixed view query that returns analyte results for one patient.
//!
//! The connection is opened per call and released unconditionally after one
//! query. There is no pooling, no retry, and no caching.

pub mod config;
pub mod connection;
pub mod view;

pub use config::*;
pub use connection::*;
pub use view::*;

use thiserror::Error;

/// Remote access errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Remote database not set")]
    NotConfigured,

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL Server error: {0}")]
    Sql(#[from] tiberius::error::Error),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
