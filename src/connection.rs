use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::QueryExecError;
use crate::normalize::normalize;
use crate::results::{CanonicalResult, RawExecutionOutcome};
use crate::statement::Statement;

/// One live database session.
///
/// Implementations run a single statement per `execute` call; callers never issue a second call
/// before the first resolves.
#[async_trait]
pub trait ConnectionHandle: Send {
    /// Whether the session is ready to run statements.
    fn is_connected(&self) -> bool;

    /// Open the session.
    async fn connect(&mut self) -> Result<(), QueryExecError>;

    /// Run one statement and report what the driver returned.
    async fn execute(
        &mut self,
        statement: &Statement,
    ) -> Result<RawExecutionOutcome, QueryExecError>;
}

/// Connect if needed, run `statement`, and normalize the outcome.
///
/// # Errors
/// Returns the connect error if the session cannot be opened, otherwise the driver error of the
/// statement itself.
pub async fn execute_statement<C>(
    conn: &mut C,
    statement: &Statement,
) -> Result<CanonicalResult, QueryExecError>
where
    C: ConnectionHandle + ?Sized,
{
    if !conn.is_connected() {
        info!("connection not open, connecting before execute");
        conn.connect().await?;
    }
    debug!(kind = %statement.kind(), sql = statement.sql(), "executing statement");
    normalize(conn.execute(statement).await, statement.kind())
}
