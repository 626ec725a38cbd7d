use std::net::ToSocketAddrs;

use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::{MssqlClient, MssqlConnectionOptions};
use crate::error::QueryExecError;

/// Open a new MSSQL session.
///
/// # Errors
/// Returns `QueryExecError::ConnectionError` if address resolution, the TCP connect, or the
/// TDS login fails.
pub async fn create_mssql_client(
    opts: &MssqlConnectionOptions,
) -> Result<MssqlClient, QueryExecError> {
    let config = opts.tiberius_config();
    let port = opts.port_or_default();

    let server_addr = (opts.server.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| {
            QueryExecError::ConnectionError(format!("Failed to resolve server address: {e}"))
        })?
        .next()
        .ok_or_else(|| {
            QueryExecError::ConnectionError(format!("No valid address found for {}", opts.server))
        })?;

    let tcp = TcpStream::connect(server_addr)
        .await
        .map_err(|e| QueryExecError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| QueryExecError::ConnectionError(format!("TCP configuration error: {e}")))?;

    Client::connect(config, tcp.compat_write())
        .await
        .map_err(|e| QueryExecError::ConnectionError(format!("SQL Server connection error: {e}")))
}
