//! Remote connection configuration.

use serde::{Deserialize, Serialize};

/// Default SQL Server port.
const DEFAULT_PORT: u16 = 1433;

/// Connection parameters for the analyzer's results database.
///
/// Supplied explicitly by the host application at construction time; this
/// crate never reads global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Server hostname or IP address
    pub host: String,
    /// TCP port (1433 if omitted)
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQL Server login user
    pub user: String,
    /// SQL Server login password
    pub password: String,
    /// Database name holding the result views
    pub database: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl RemoteConfig {
    /// Create a config with the default port.
    pub fn new(host: String, user: String, password: String, database: String) -> Self {
        Self {
            host,
            port: DEFAULT_PORT,
            user,
            password,
            database,
        }
    }
}
