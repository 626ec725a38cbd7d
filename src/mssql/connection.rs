use std::fmt;

use async_trait::async_trait;
use tracing::info;

use super::client::create_mssql_client;
use super::config::{MssqlClient, MssqlConnectionOptions};
use super::query::execute_raw;
use crate::connection::ConnectionHandle;
use crate::error::QueryExecError;
use crate::results::RawExecutionOutcome;
use crate::statement::Statement;

/// A single SQL Server session.
///
/// Created disconnected from options (the first statement opens it) or wrapped around a client
/// the caller already opened.
pub struct MssqlConnection {
    options: Option<MssqlConnectionOptions>,
    client: Option<MssqlClient>,
}

impl MssqlConnection {
    #[must_use]
    pub fn new(options: MssqlConnectionOptions) -> Self {
        Self {
            options: Some(options),
            client: None,
        }
    }

    #[must_use]
    pub fn from_client(client: MssqlClient) -> Self {
        Self {
            options: None,
            client: Some(client),
        }
    }

    /// Drop the session; the next statement reconnects if options are known.
    pub fn disconnect(&mut self) -> Option<MssqlClient> {
        self.client.take()
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("server", &self.options.as_ref().map(|o| o.server.as_str()))
            .field("connected", &self.client.is_some())
            .finish()
    }
}

#[async_trait]
impl ConnectionHandle for MssqlConnection {
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> Result<(), QueryExecError> {
        let options = self.options.as_ref().ok_or_else(|| {
            QueryExecError::ConnectionError(
                "no connection options were supplied to reconnect with".to_string(),
            )
        })?;
        let client = create_mssql_client(options).await?;
        info!(server = %options.server, database = %options.database, "connected to SQL Server");
        self.client = Some(client);
        Ok(())
    }

    async fn execute(
        &mut self,
        statement: &Statement,
    ) -> Result<RawExecutionOutcome, QueryExecError> {
        let client = self.client.as_mut().ok_or_else(|| {
            QueryExecError::ConnectionError("SQL Server session is not open".to_string())
        })?;
        execute_raw(client, statement).await
    }
}
