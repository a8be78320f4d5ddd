//! Scoped connection wrapper for the analyzer's SQL Server database.

use tiberius::{AuthMethod, Client, Config, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::RemoteConfig;
use crate::view::{AnalyteRow, RemoteSource, ANALYTE_RESULTS_SQL};
use crate::{RemoteError, RemoteResult};

/// A live connection to the remote results database.
///
/// Opened for the duration of one query and released unconditionally
/// afterward. The TDS driver is async; a private current-thread runtime
/// keeps the call chain synchronous.
pub struct RemoteConnection {
    runtime: tokio::runtime::Runtime,
    client: Client<Compat<TcpStream>>,
}

impl RemoteConnection {
    /// Open a connection using the supplied parameters.
    pub fn open(config: &RemoteConfig) -> RemoteResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.port);
        tds.database(&config.database);
        tds.authentication(AuthMethod::sql_server(&config.user, &config.password));
        tds.trust_cert();

        let client = runtime.block_on(async {
            let tcp = TcpStream::connect(tds.get_addr()).await?;
            tcp.set_nodelay(true)?;
            let client = Client::connect(tds, tcp.compat_write()).await?;
            Ok::<_, RemoteError>(client)
        })?;

        tracing::debug!(host = %config.host, database = %config.database, "remote connection opened");
        Ok(Self { runtime, client })
    }

    /// Execute the fixed analyte-results query and collect all rows.
    pub fn query_analyte_results(&mut self, patient_id: &str) -> RemoteResult<Vec<AnalyteRow>> {
        let rows = self.runtime.block_on(async {
            let stream = self.client.query(ANALYTE_RESULTS_SQL, &[&patient_id]).await?;
            let rows = stream.into_first_result().await?;
            Ok::<_, RemoteError>(rows)
        })?;

        rows.iter().map(row_to_analyte).collect()
    }

    /// End the session. Errors on close are logged, not surfaced.
    pub fn close(self) {
        let Self { runtime, client } = self;
        if let Err(error) = runtime.block_on(client.close()) {
            tracing::debug!(%error, "remote connection close failed");
        }
    }
}

fn row_to_analyte(row: &Row) -> RemoteResult<AnalyteRow> {
    Ok(AnalyteRow {
        test_id: row.try_get::<i32, _>("test_id")?.unwrap_or_default(),
        patient_id: row
            .try_get::<&str, _>("patient_id")?
            .unwrap_or_default()
            .to_owned(),
        sample_id: row.try_get::<&str, _>("sample_id")?.map(str::to_owned),
        analyte_name: row
            .try_get::<&str, _>("analyte_name")?
            .unwrap_or_default()
            .to_owned(),
        cycle_threshold: row.try_get::<f64, _>("cycle_threshold")?,
        endpoint: row.try_get::<f64, _>("endpoint")?,
        analyte_result: row.try_get::<&str, _>("analyte_result")?.map(str::to_owned),
        probe_check_result: row
            .try_get::<&str, _>("probe_check_result")?
            .map(str::to_owned),
    })
}

/// Production [`RemoteSource`] backed by SQL Server.
///
/// Each fetch opens a fresh connection, runs the single view query, and
/// closes the connection whether or not the query succeeded.
pub struct SqlServerSource {
    config: Option<RemoteConfig>,
}

impl SqlServerSource {
    /// Create a source. A `None` config fails every fetch with
    /// [`RemoteError::NotConfigured`].
    pub fn new(config: Option<RemoteConfig>) -> Self {
        Self { config }
    }
}

impl RemoteSource for SqlServerSource {
    fn fetch_analyte_results(&self, patient_id: &str) -> RemoteResult<Vec<AnalyteRow>> {
        let config = self.config.as_ref().ok_or(RemoteError::NotConfigured)?;
        let mut connection = RemoteConnection::open(config)?;
        let result = connection.query_analyte_results(patient_id);
        connection.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_source_fails_before_connecting() {
        let source = SqlServerSource::new(None);
        let result = source.fetch_analyte_results("058246");
        assert!(matches!(result, Err(RemoteError::NotConfigured)));
    }
}
