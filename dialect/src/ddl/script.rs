//! Generated DDL scripts and batch splitting

use polydb_types::DialectKind;

use crate::DialectTableExt;

/// Ordered list of independently executable statements
///
/// # Examples
///
/// ```
/// use polydb_dialect::ddl::{DdlScript, split_script};
/// use polydb_types::DialectKind;
///
/// let mut script = DdlScript::new(DialectKind::MsSql);
/// script.push("CREATE TABLE a (x INT)");
/// script.push("CREATE TABLE b (y INT)");
///
/// let text = script.to_text();
/// assert_eq!(text, "CREATE TABLE a (x INT)\nGO\nCREATE TABLE b (y INT)\nGO\n");
/// assert_eq!(split_script(&text, DialectKind::MsSql), script.statements);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlScript {
    pub dialect: DialectKind,
    pub statements: Vec<String>,
}

impl DdlScript {
    #[must_use]
    pub const fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.statements.push(statement.into());
    }

    /// Append another script's statements
    pub fn append(&mut self, other: DdlScript) {
        self.statements.extend(other.statements);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }

    /// Statements each followed by the dialect's batch-separator line
    #[must_use]
    pub fn to_text(&self) -> String {
        let separator = self.dialect.table().batch_separator;
        self.statements
            .iter()
            .map(|statement| format!("{statement}\n{separator}\n"))
            .collect()
    }
}

impl IntoIterator for DdlScript {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl std::fmt::Display for DdlScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Split script text on the dialect's batch-separator lines
///
/// Separator lines match case-insensitively after trimming. Blank batches are
/// dropped and each statement is trimmed.
#[must_use]
pub fn split_script(text: &str, dialect: DialectKind) -> Vec<String> {
    let separator = dialect.table().batch_separator;
    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut flush = |current: &mut Vec<&str>| {
        let statement = current.join("\n").trim().to_string();
        if !statement.is_empty() {
            statements.push(statement);
        }
        current.clear();
    };

    for line in text.lines() {
        if line.trim().eq_ignore_ascii_case(separator) {
            flush(&mut current);
        } else {
            current.push(line);
        }
    }
    flush(&mut current);
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_blank_batches_and_case() {
        let text = "CREATE TABLE a (x INT)\ngo\n\nGO\nCREATE VIEW v AS SELECT\n\tx AS x\nFROM a\n";
        assert_eq!(
            split_script(text, DialectKind::Generic),
            vec![
                "CREATE TABLE a (x INT)".to_string(),
                "CREATE VIEW v AS SELECT\n\tx AS x\nFROM a".to_string(),
            ]
        );
    }

    #[test]
    fn test_oracle_slash_separator() {
        let text = "CREATE SEQUENCE s START WITH 1 INCREMENT BY 1\n/\nDROP SEQUENCE s\n/\n";
        assert_eq!(split_script(text, DialectKind::Oracle).len(), 2);
    }

    #[test]
    fn test_separator_inside_statement_line_is_kept() {
        // only whole separator lines split
        let text = "SELECT 'GO' AS x\n--go\n";
        assert_eq!(
            split_script(text, DialectKind::PostgreSql),
            vec!["SELECT 'GO' AS x".to_string()]
        );
    }
}
