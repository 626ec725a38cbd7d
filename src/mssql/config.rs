use tiberius::{AuthMethod, Client, Config as TiberiusConfig};
use tokio::net::TcpStream;
use tokio_util::compat::Compat;

use crate::error::QueryExecError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Options for opening an MSSQL session.
#[derive(Debug, Clone)]
pub struct MssqlConnectionOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: Option<u16>,
    pub instance_name: Option<String>,
    pub trust_cert: bool,
}

impl MssqlConnectionOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: true,
        }
    }

    #[must_use]
    pub fn builder(
        server: String,
        database: String,
        user: String,
        password: String,
    ) -> MssqlConnectionOptionsBuilder {
        MssqlConnectionOptionsBuilder {
            opts: Self::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(1433)
    }

    pub(crate) fn tiberius_config(&self) -> TiberiusConfig {
        let mut config = TiberiusConfig::new();
        config.host(&self.server);
        config.database(&self.database);
        config.port(self.port_or_default());
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if let Some(instance) = &self.instance_name {
            config.instance_name(instance);
        }
        if self.trust_cert {
            config.trust_cert();
        }
        config
    }
}

/// Fluent builder for MSSQL options.
#[derive(Debug, Clone)]
pub struct MssqlConnectionOptionsBuilder {
    opts: MssqlConnectionOptions,
}

impl MssqlConnectionOptionsBuilder {
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

    /// Validate and return the options.
    ///
    /// # Errors
    /// Returns `QueryExecError::ConfigError` when the server or database is blank.
    pub fn build(self) -> Result<MssqlConnectionOptions, QueryExecError> {
        if self.opts.server.trim().is_empty() {
            return Err(QueryExecError::ConfigError("server must not be empty".into()));
        }
        if self.opts.database.trim().is_empty() {
            return Err(QueryExecError::ConfigError("database must not be empty".into()));
        }
        Ok(self.opts)
    }
}
