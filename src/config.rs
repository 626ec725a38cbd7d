use crate::error::QueryExecError;

/// Options for a [`QueryExec`](crate::exec::QueryExec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecOptions {
    /// Column read by `count()` from the first row of the aggregate.
    pub count_column: String,
    /// Yield to the tokio scheduler between the statements of a batch.
    pub yield_between_statements: bool,
}

impl Default for QueryExecOptions {
    fn default() -> Self {
        Self {
            count_column: "numrows".to_string(),
            yield_between_statements: true,
        }
    }
}

impl QueryExecOptions {
    #[must_use]
    pub fn builder() -> QueryExecOptionsBuilder {
        QueryExecOptionsBuilder::default()
    }

    #[must_use]
    pub fn with_count_column(mut self, count_column: impl Into<String>) -> Self {
        self.count_column = count_column.into();
        self
    }

    #[must_use]
    pub fn with_yield_between_statements(mut self, yield_between_statements: bool) -> Self {
        self.yield_between_statements = yield_between_statements;
        self
    }
}

/// Fluent builder for [`QueryExecOptions`].
#[derive(Debug, Clone, Default)]
pub struct QueryExecOptionsBuilder {
    opts: QueryExecOptions,
}

impl QueryExecOptionsBuilder {
    #[must_use]
    pub fn count_column(mut self, count_column: impl Into<String>) -> Self {
        self.opts.count_column = count_column.into();
        self
    }

    #[must_use]
    pub fn yield_between_statements(mut self, yield_between_statements: bool) -> Self {
        self.opts.yield_between_statements = yield_between_statements;
        self
    }

    /// Validate and return the options.
    ///
    /// # Errors
    /// Returns `QueryExecError::ConfigError` if the count column is blank.
    pub fn build(self) -> Result<QueryExecOptions, QueryExecError> {
        if self.opts.count_column.trim().is_empty() {
            return Err(QueryExecError::ConfigError(
                "count column must not be empty".to_string(),
            ));
        }
        Ok(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = QueryExecOptions::default();
        assert_eq!(opts.count_column, "numrows");
        assert!(opts.yield_between_statements);
    }

    #[test]
    fn builder_validates_count_column() {
        let opts = QueryExecOptions::builder()
            .count_column("total")
            .yield_between_statements(false)
            .build()
            .unwrap();
        assert_eq!(opts, QueryExecOptions::default().with_count_column("total").with_yield_between_statements(false));

        let err = QueryExecOptions::builder().count_column(" ").build().unwrap_err();
        assert!(matches!(err, QueryExecError::ConfigError(_)));
    }
}
