//! Native type templates and identifier quoting

/// Words that must be quoted when used as identifiers in any supported engine
const RESERVED: &[&str] = &[
    "ACCESS", "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BEGIN", "BETWEEN", "BY", "CASE",
    "CHECK", "COLUMN", "COMMENT", "CONSTRAINT", "CREATE", "CURRENT", "DATE", "DEFAULT",
    "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FILE", "FOR", "FOREIGN",
    "FROM", "GRANT", "GROUP", "HAVING", "IN", "INDEX", "INSERT", "INTO", "IS", "JOIN", "KEY",
    "LEVEL", "LIKE", "LIMIT", "MODE", "NOT", "NULL", "NUMBER", "OFFSET", "ON", "OR", "ORDER",
    "PRIMARY", "REFERENCES", "ROWID", "SELECT", "SESSION", "SET", "SIZE", "TABLE", "THEN",
    "TIME", "TIMESTAMP", "TO", "TRANSACTION", "UID", "UNION", "UNIQUE", "UPDATE", "USER",
    "VALUE", "VALUES", "VIEW", "WHEN", "WHERE",
];

/// Expand a `{size}` / `{size:DEFAULT}` placeholder
///
/// With `size > 0` the placeholder becomes `(size)` or `(size,scale)`; with
/// `size == 0` it becomes `(DEFAULT)` when a default is given, else nothing.
///
/// # Examples
///
/// ```
/// use polydb_dialect::format::expand_template;
///
/// assert_eq!(expand_template("DECIMAL{size}", 10, 2), "DECIMAL(10,2)");
/// assert_eq!(expand_template("VARCHAR{size}", 0, 0), "VARCHAR");
/// assert_eq!(expand_template("NVARCHAR{size:MAX}", 0, 0), "NVARCHAR(MAX)");
/// assert_eq!(expand_template("BIGINT", 19, 0), "BIGINT");
/// ```
#[must_use]
pub fn expand_template(template: &str, size: u32, scale: u32) -> String {
    let Some(start) = template.find("{size") else {
        return template.to_string();
    };
    let Some(len) = template[start..].find('}') else {
        return template.to_string();
    };
    let end = start + len;
    let default = template[start + "{size".len()..end].strip_prefix(':');

    let args = match (size, scale, default) {
        (0, _, Some(default)) => format!("({default})"),
        (0, _, None) => String::new(),
        (size, 0, _) => format!("({size})"),
        (size, scale, _) => format!("({size},{scale})"),
    };

    format!("{}{}{}", &template[..start], args, &template[end + 1..])
}

/// Returns `true` when an identifier cannot be written bare
#[must_use]
pub fn needs_quoting(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    !valid
        || RESERVED
            .iter()
            .any(|word| word.eq_ignore_ascii_case(identifier))
}

/// Quote an identifier with `quote` only when [`needs_quoting`] says so
///
/// Embedded closing quotes are doubled.
#[must_use]
pub fn quote_identifier(identifier: &str, (open, close): (char, char)) -> String {
    if !needs_quoting(identifier) {
        return identifier.to_string();
    }
    let escaped = identifier.replace(close, &format!("{close}{close}"));
    format!("{open}{escaped}{close}")
}

/// Escape a string for use inside single quotes
#[must_use]
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Uppercase hexadecimal encoding
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{b:02X}");
            out
        })
}
