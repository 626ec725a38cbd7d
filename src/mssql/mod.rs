// MSSQL module - SQL Server session handle backed by tiberius
//
// - config: Connection options and tiberius config
// - client: Raw client creation
// - query: Row extraction and statement execution
// - connection: The `ConnectionHandle` implementation

pub mod client;
pub mod config;
pub mod connection;
pub mod query;

pub use client::create_mssql_client;
pub use config::{MssqlClient, MssqlConnectionOptions, MssqlConnectionOptionsBuilder};
pub use connection::MssqlConnection;
