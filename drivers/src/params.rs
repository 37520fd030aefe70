//! Named-parameter rewriting for positional wire protocols
//!
//! PostgreSQL only understands `$1, $2, ...`. Generated SQL uses the dialect
//! prefix (`:name`), so the PostgreSQL adapters rewrite it before preparing.
//! String literals, quoted identifiers, dollar-quoted bodies and `::` casts
//! are left untouched.

use polydb_core::{Fault, Result, Value};

use crate::connection::Param;

/// SQL with named placeholders replaced by `$n`, and the names in `$n` order
///
/// A name used twice maps to the same position.
///
/// # Examples
///
/// ```
/// use polydb_drivers::params::rewrite_named;
///
/// let (sql, names) = rewrite_named("SELECT :a::text, ':b', :a + :c", ':');
/// assert_eq!(sql, "SELECT $1::text, ':b', $1 + $2");
/// assert_eq!(names, ["a", "c"]);
/// ```
#[must_use]
pub fn rewrite_named(sql: &str, prefix: char) -> (String, Vec<String>) {
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                for (_, next) in chars.by_ref() {
                    out.push(next);
                    if next == c {
                        break;
                    }
                }
            }
            '$' if sql[start + 1..].starts_with('$') => {
                // $$ ... $$ body
                out.push_str("$$");
                chars.next();
                match sql[start + 2..].find("$$") {
                    Some(end) => {
                        out.push_str(&sql[start + 2..start + 2 + end + 2]);
                        let stop = start + 2 + end + 2;
                        while chars.peek().is_some_and(|(i, _)| *i < stop) {
                            chars.next();
                        }
                    }
                    None => {
                        out.push_str(&sql[start + 2..]);
                        break;
                    }
                }
            }
            ':' if prefix == ':' && chars.peek().is_some_and(|(_, n)| *n == ':') => {
                out.push_str("::");
                chars.next();
            }
            c if c == prefix && chars.peek().is_some_and(|(_, n)| is_name_start(*n)) => {
                let mut name = String::new();
                while let Some((_, n)) = chars.peek().copied()
                    && is_name_char(n)
                {
                    name.push(n);
                    chars.next();
                }
                let position = match names.iter().position(|existing| *existing == name) {
                    Some(index) => index + 1,
                    None => {
                        names.push(name);
                        names.len()
                    }
                };
                out.push('$');
                out.push_str(&position.to_string());
            }
            other => out.push(other),
        }
    }

    (out, names)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Values for `names` in order, looked up case-insensitively in `params`
pub fn bind<'p>(names: &[String], params: &'p [Param<'_>]) -> Result<Vec<&'p Value>> {
    names
        .iter()
        .map(|name| {
            params
                .iter()
                .find(|(candidate, _)| strip_prefix(candidate).eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
                .ok_or_else(|| Fault::Config(format!("no value for parameter {name}")))
        })
        .collect()
}

/// Parameter name without a leading `@`, `:` or `$`
#[must_use]
pub fn strip_prefix(name: &str) -> &str {
    name.trim_start_matches(['@', ':', '$'])
}
