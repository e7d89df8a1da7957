use tiberius::{Client, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::{MssqlClient, build_tiberius_config, needs_browser_lookup};
use crate::config::ConnectionInfo;
use crate::error::SprocError;

/// Helper function to create a new MSSQL connection
///
/// A named instance without an explicit port is resolved through the SQL Server Browser
/// service. Follows one server-side redirect (Azure SQL gateways answer the first login with a
/// routing token pointing at the real node).
///
/// # Errors
/// Returns `SprocError::ConfigError` for an unparsable connection string,
/// `SprocError::ConnectionError` if the TCP connection fails, and the Tiberius error if login
/// fails.
pub async fn create_mssql_client(info: &ConnectionInfo) -> Result<MssqlClient, SprocError> {
    let config = build_tiberius_config(info)?;
    let tcp = if needs_browser_lookup(info) {
        let tcp = TcpStream::connect_named(&config).await.map_err(|e| {
            SprocError::ConnectionError(format!("SQL Browser lookup via {} failed: {e}", config.get_addr()))
        })?;
        tcp.set_nodelay(true)
            .map_err(|e| SprocError::ConnectionError(format!("TCP setup error: {e}")))?;
        tcp
    } else {
        connect_tcp(&config.get_addr()).await?
    };

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            tracing::debug!(%host, port, "SQL Server redirected the connection");
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = connect_tcp(&config.get_addr()).await?;
            Ok(Client::connect(config, tcp.compat_write()).await?)
        }
        Err(e) => Err(e.into()),
    }
}

async fn connect_tcp(addr: &str) -> Result<TcpStream, SprocError> {
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|e| SprocError::ConnectionError(format!("TCP connection to {addr} failed: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| SprocError::ConnectionError(format!("TCP setup error: {e}")))?;
    Ok(tcp)
}
