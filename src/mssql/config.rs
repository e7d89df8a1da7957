use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::config::ConnectionInfo;
use crate::error::SprocError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Options for building a SQL Server [`ConnectionInfo`] from parts.
#[derive(Clone)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: Option<u16>,
    pub instance_name: Option<String>,
    pub trust_cert: bool,
}

impl std::fmt::Debug for MssqlOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlOptions")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("instance_name", &self.instance_name)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

impl MssqlOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: false,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    /// Render the options as an ADO.NET connection string.
    ///
    /// # Errors
    /// Returns `SprocError::ConfigError` if the server name is empty.
    pub fn to_connection_info(&self) -> Result<ConnectionInfo, SprocError> {
        if self.server.trim().is_empty() {
            return Err(SprocError::ConfigError("server must not be empty".to_string()));
        }

        let mut server = format!("tcp:{}", self.server);
        if let Some(instance) = &self.instance_name {
            server.push('\\');
            server.push_str(instance);
        }
        // a named instance without a port is looked up through SQL Server Browser
        match (self.port, &self.instance_name) {
            (Some(port), _) => server.push_str(&format!(",{port}")),
            (None, Some(_)) => {}
            (None, None) => server.push_str(",1433"),
        }

        let mut parts = vec![
            format!("server={}", quote_value(&server)),
            format!("database={}", quote_value(&self.database)),
            format!("user id={}", quote_value(&self.user)),
            format!("password={}", quote_value(&self.password)),
        ];
        if self.trust_cert {
            parts.push("TrustServerCertificate=true".to_string());
        }
        ConnectionInfo::new(parts.join(";"))
    }
}

/// Fluent builder for MSSQL options.
#[derive(Debug, Clone)]
pub struct MssqlOptionsBuilder {
    opts: MssqlOptions,
}

impl MssqlOptionsBuilder {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            opts: MssqlOptions::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.opts.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn trust_cert(mut self, trust_cert: bool) -> Self {
        self.opts.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn finish(self) -> MssqlOptions {
        self.opts
    }

    /// Build the [`ConnectionInfo`] for these options.
    ///
    /// # Errors
    /// Returns `SprocError::ConfigError` if the options are incomplete.
    pub fn build(self) -> Result<ConnectionInfo, SprocError> {
        self.opts.to_connection_info()
    }
}

// Values containing separators or quotes are wrapped in double quotes, inner quotes doubled.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.contains([';', '"', '\''])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Parse the connection string held by `info` into a Tiberius config.
///
/// # Errors
/// Returns `SprocError::ConfigError` if the string is not a valid ADO.NET connection string.
pub fn build_tiberius_config(info: &ConnectionInfo) -> Result<tiberius::Config, SprocError> {
    tiberius::Config::from_ado_string(info.connection_string())
        .map_err(|e| SprocError::ConfigError(format!("invalid SQL Server connection string: {e}")))
}

/// Whether the server in `info` names an instance without a port (`tcp:host\INSTANCE`), which
/// has to be resolved through SQL Server Browser.
#[must_use]
pub fn needs_browser_lookup(info: &ConnectionInfo) -> bool {
    info.connection_string()
        .split(';')
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| {
            matches!(
                key.trim().to_ascii_lowercase().as_str(),
                "server" | "data source" | "address" | "addr" | "network address"
            )
        })
        .is_some_and(|(_, value)| {
            let value = value.trim().trim_matches('"');
            let value = value.strip_prefix("tcp:").unwrap_or(value);
            value.contains('\\') && !value.contains(',')
        })
}
