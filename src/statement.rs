use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static LEADING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(select|insert|update|delete)\s").expect("leading keyword pattern is valid")
});

/// Semantic tag of a statement, fixed when the [`Statement`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Classify SQL text by its leading keyword (case-insensitive, followed by whitespace).
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let Some(caps) = LEADING_KEYWORD.captures(sql) else {
            return StatementKind::Other;
        };
        match caps[1].to_ascii_lowercase().as_str() {
            "select" => StatementKind::Select,
            "insert" => StatementKind::Insert,
            "update" => StatementKind::Update,
            "delete" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Other => "other",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL text plus its [`StatementKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    kind: StatementKind,
}

impl Statement {
    /// Build a statement, tagging it from its leading keyword.
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let kind = StatementKind::classify(&sql);
        Self { sql, kind }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_leading_keyword_case_insensitively() {
        assert_eq!(StatementKind::classify("INSERT INTO t"), StatementKind::Insert);
        assert_eq!(StatementKind::classify("update t set a = 1"), StatementKind::Update);
        assert_eq!(StatementKind::classify("Delete FROM t"), StatementKind::Delete);
        assert_eq!(StatementKind::classify("select\n* from t"), StatementKind::Select);
    }

    #[test]
    fn keyword_must_lead_and_be_followed_by_whitespace() {
        assert_eq!(StatementKind::classify("updated_at"), StatementKind::Other);
        assert_eq!(StatementKind::classify(" insert into t"), StatementKind::Other);
        assert_eq!(StatementKind::classify("TRUNCATE TABLE t"), StatementKind::Other);
        assert_eq!(StatementKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Other);
    }

    #[test]
    fn statement_keeps_its_tag() {
        let stmt = Statement::new("UPDATE [t] SET [a] = 1");
        assert_eq!(stmt.kind(), StatementKind::Update);
        assert_eq!(stmt.sql(), "UPDATE [t] SET [a] = 1");
        assert_eq!(Statement::new("EXEC proc").kind(), StatementKind::Other);
    }
}
