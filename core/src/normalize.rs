//! Engine error normalization
//!
//! Driver errors arrive as a chain of nested sources that often repeat each
//! other and name objects by their physical identifiers. [`normalize`] flattens
//! the chain into one deduplicated multi-line message and replaces table and
//! column identifiers with their display names from the schema model.

use std::error::Error;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::schema::{Schema, Table};

/// Identifier token, optionally quoted, optionally `table.column` qualified
static IDENTIFIER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(["'\[`]?)([A-Za-z_][A-Za-z0-9_$#]*(?:\.[A-Za-z_][A-Za-z0-9_$#]*)?)(["'\]`]?)"#)
        .ok()
});

/// Flatten an error and its source chain into deduplicated lines
///
/// A message is dropped when it is identical to, or contained in, a message
/// already emitted.
///
/// # Examples
///
/// ```
/// use polydb_core::normalize::flatten;
///
/// let err = std::io::Error::other("disk full");
/// assert_eq!(flatten(&err), "disk full");
/// ```
pub fn flatten(error: &(dyn Error + 'static)) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = Some(error);
    while let Some(err) = current {
        for line in err.to_string().lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !lines.iter().any(|seen| seen.contains(line)) {
                lines.push(line.to_string());
            }
        }
        current = err.source();
    }
    lines.join("\n")
}

/// Flatten an error chain and translate identifiers to display names
pub fn normalize(error: &(dyn Error + 'static), schema: &Schema) -> String {
    substitute_display_names(&flatten(error), schema)
}

/// Replace table and column identifiers in `message` with display names
///
/// Qualified `table.column` tokens resolve directly. Bare or quoted tokens
/// resolve to a table by name, or to a column of a table named in the message.
/// Quoted tokens may also name a column of any table in the schema. Quoted
/// tokens match case-insensitively; bare tokens must match exactly.
pub fn substitute_display_names(message: &str, schema: &Schema) -> String {
    let Some(re) = IDENTIFIER.as_ref() else {
        return message.to_string();
    };

    let mentioned: Vec<&Table> = re
        .captures_iter(message)
        .filter_map(|caps| {
            let token = caps.get(2)?.as_str();
            let table = token.split('.').next()?;
            find_table(schema, table, is_quoted(&caps))
        })
        .collect();

    re.replace_all(message, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let open = caps.get(1).map_or("", |m| m.as_str());
        let close = caps.get(3).map_or("", |m| m.as_str());
        let token = caps.get(2).map_or("", |m| m.as_str());
        let quoted = is_quoted(caps);

        let replaced = match token.split_once('.') {
            Some((table, column)) => find_table(schema, table, true).and_then(|t| {
                let c = t.find_column(column)?;
                Some(format!("{}.{}", t.display_name, c.display_name))
            }),
            None => find_table(schema, token, quoted)
                .map(|t| t.display_name.clone())
                .or_else(|| resolve_column(schema, &mentioned, token, quoted)),
        };

        match replaced {
            Some(name) => format!("{open}{name}{close}"),
            None => whole.to_string(),
        }
    })
    .into_owned()
}

fn is_quoted(caps: &Captures<'_>) -> bool {
    caps.get(1).is_some_and(|m| !m.as_str().is_empty())
}

fn matches_name(name: &str, token: &str, ignore_case: bool) -> bool {
    if ignore_case {
        name.eq_ignore_ascii_case(token)
    } else {
        name == token
    }
}

fn find_table<'s>(schema: &'s Schema, token: &str, ignore_case: bool) -> Option<&'s Table> {
    schema
        .tables
        .iter()
        .find(|t| matches_name(&t.name, token, ignore_case))
}

fn resolve_column(
    schema: &Schema,
    mentioned: &[&Table],
    token: &str,
    quoted: bool,
) -> Option<String> {
    let ignore_case = quoted;
    let column_in = |t: &Table| {
        t.columns
            .iter()
            .find(|c| matches_name(&c.name, token, ignore_case))
            .map(|c| c.display_name.clone())
    };
    let in_mentioned = mentioned.iter().find_map(|t| column_in(t));
    if !quoted {
        // bare words elsewhere in driver prose ("duplicate key value") stay
        return in_mentioned;
    }
    in_mentioned.or_else(|| schema.tables.iter().find_map(column_in))
}
