//! Metadata queries per dialect
//!
//! Every dialect answers the same questions with the same column aliases, so
//! the [`Introspector`](crate::Introspector) reads all of them alike:
//!
//! | Query | Columns |
//! |---|---|
//! | tables | `table_schema, table_name, table_type, definition` |
//! | columns | `table_schema, table_name, column_name, data_type, max_length, numeric_precision, numeric_scale, is_nullable, column_default` |
//! | keys | `table_schema, table_name, constraint_name, constraint_type, column_name, ordinal_position` |
//! | foreign keys | `table_schema, table_name, constraint_name, column_name, references_schema, references_table, references_column, delete_rule, ordinal_position` |
//! | checks | `table_schema, table_name, constraint_name, check_clause` |
//! | indexes | `table_schema, table_name, index_name, is_unique, column_name` |
//! | sequences | `table_schema, sequence_name, increment, current_value, start_value` |

use polydb_dialect::literal::text_literal;
use polydb_dialect::{DialectTable, SEQUENCE_TABLE};
use polydb_types::DialectKind;

/// The full query set for one dialect and namespace filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queries {
    pub tables: String,
    pub columns: String,
    pub keys: String,
    pub foreign_keys: String,
    pub checks: Option<String>,
    pub indexes: Option<String>,
    pub sequences: Option<String>,
}

/// Queries for `dialect`, restricted to `schema` when given
///
/// Without a schema the engine's own catalogs are excluded (information
/// schema engines) or the session's current schema is used (Oracle). SQLite
/// has no namespaces and ignores the filter.
#[must_use]
pub fn for_dialect(dialect: &DialectTable, schema: Option<&str>) -> Queries {
    let filter = |column: &str| namespace_filter(dialect, column, schema);
    match dialect.kind {
        DialectKind::Sqlite => sqlite::queries(),
        DialectKind::Oracle => oracle::queries(&filter),
        DialectKind::Generic | DialectKind::PostgreSql | DialectKind::MsSql => {
            information_schema::queries(&filter)
        }
    }
}

fn namespace_filter(dialect: &DialectTable, column: &str, schema: Option<&str>) -> String {
    match (schema, dialect.kind) {
        (Some(schema), _) => format!("{column} = {}", text_literal(dialect, schema)),
        (None, DialectKind::Oracle) => {
            format!("{column} = SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')")
        }
        (None, _) => format!(
            "{column} NOT IN ('information_schema', 'INFORMATION_SCHEMA', 'pg_catalog', 'pg_toast', 'sys')"
        ),
    }
}

// =============================================================================
// information_schema
// =============================================================================

/// ANSI `information_schema` views, shared by Generic, PostgreSQL and SQL Server
///
/// Identifier columns are cast to `VARCHAR` and numbers to `INTEGER` so that
/// drivers see plain text and integers instead of engine domain types.
pub mod information_schema {
    use super::Queries;

    const NAME: &str = "VARCHAR(128)";

    pub(super) fn queries(filter: &dyn Fn(&str) -> String) -> Queries {
        Queries {
            tables: format!(
                "SELECT CAST(t.table_schema AS {NAME}) AS table_schema, \
                 CAST(t.table_name AS {NAME}) AS table_name, \
                 CAST(t.table_type AS {NAME}) AS table_type, \
                 NULL AS definition \
                 FROM information_schema.tables t \
                 WHERE t.table_type IN ('BASE TABLE', 'VIEW') AND {} \
                 ORDER BY 1, 2",
                filter("t.table_schema")
            ),
            columns: format!(
                "SELECT CAST(c.table_schema AS {NAME}) AS table_schema, \
                 CAST(c.table_name AS {NAME}) AS table_name, \
                 CAST(c.column_name AS {NAME}) AS column_name, \
                 CAST(c.data_type AS {NAME}) AS data_type, \
                 CAST(c.character_maximum_length AS INTEGER) AS max_length, \
                 CAST(c.numeric_precision AS INTEGER) AS numeric_precision, \
                 CAST(c.numeric_scale AS INTEGER) AS numeric_scale, \
                 CAST(c.is_nullable AS VARCHAR(3)) AS is_nullable, \
                 CAST(c.column_default AS VARCHAR(4000)) AS column_default \
                 FROM information_schema.columns c \
                 WHERE {} \
                 ORDER BY 1, 2, c.ordinal_position",
                filter("c.table_schema")
            ),
            keys: format!(
                "SELECT CAST(tc.table_schema AS {NAME}) AS table_schema, \
                 CAST(tc.table_name AS {NAME}) AS table_name, \
                 CAST(tc.constraint_name AS {NAME}) AS constraint_name, \
                 CAST(tc.constraint_type AS {NAME}) AS constraint_type, \
                 CAST(k.column_name AS {NAME}) AS column_name, \
                 CAST(k.ordinal_position AS INTEGER) AS ordinal_position \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage k \
                 ON k.constraint_schema = tc.constraint_schema \
                 AND k.constraint_name = tc.constraint_name \
                 AND k.table_name = tc.table_name \
                 WHERE tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE') AND {} \
                 ORDER BY 1, 2, 3, 6",
                filter("tc.table_schema")
            ),
            foreign_keys: format!(
                "SELECT CAST(k.table_schema AS {NAME}) AS table_schema, \
                 CAST(k.table_name AS {NAME}) AS table_name, \
                 CAST(rc.constraint_name AS {NAME}) AS constraint_name, \
                 CAST(k.column_name AS {NAME}) AS column_name, \
                 CAST(u.table_schema AS {NAME}) AS references_schema, \
                 CAST(u.table_name AS {NAME}) AS references_table, \
                 CAST(u.column_name AS {NAME}) AS references_column, \
                 CAST(rc.delete_rule AS {NAME}) AS delete_rule, \
                 CAST(k.ordinal_position AS INTEGER) AS ordinal_position \
                 FROM information_schema.referential_constraints rc \
                 JOIN information_schema.key_column_usage k \
                 ON k.constraint_schema = rc.constraint_schema \
                 AND k.constraint_name = rc.constraint_name \
                 JOIN information_schema.key_column_usage u \
                 ON u.constraint_schema = rc.unique_constraint_schema \
                 AND u.constraint_name = rc.unique_constraint_name \
                 AND u.ordinal_position = k.position_in_unique_constraint \
                 WHERE {} \
                 ORDER BY 1, 2, 3, 9",
                filter("k.table_schema")
            ),
            checks: Some(format!(
                "SELECT CAST(tc.table_schema AS {NAME}) AS table_schema, \
                 CAST(tc.table_name AS {NAME}) AS table_name, \
                 CAST(tc.constraint_name AS {NAME}) AS constraint_name, \
                 CAST(cc.check_clause AS VARCHAR(4000)) AS check_clause \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.check_constraints cc \
                 ON cc.constraint_schema = tc.constraint_schema \
                 AND cc.constraint_name = tc.constraint_name \
                 WHERE tc.constraint_type = 'CHECK' \
                 AND tc.constraint_name NOT LIKE '%\\_not\\_null' ESCAPE '\\' AND {} \
                 ORDER BY 1, 2, 3",
                filter("tc.table_schema")
            )),
            indexes: None,
            sequences: Some(format!(
                "SELECT CAST(s.sequence_schema AS {NAME}) AS table_schema, \
                 CAST(s.sequence_name AS {NAME}) AS sequence_name, \
                 CAST(s.increment AS BIGINT) AS increment, \
                 NULL AS current_value, \
                 CAST(s.start_value AS BIGINT) AS start_value \
                 FROM information_schema.sequences s \
                 WHERE {} \
                 ORDER BY 1, 2",
                filter("s.sequence_schema")
            )),
        }
    }
}

// =============================================================================
// Oracle
// =============================================================================

/// Oracle `all_*` dictionary views
pub mod oracle {
    use super::Queries;

    pub(super) fn queries(filter: &dyn Fn(&str) -> String) -> Queries {
        Queries {
            tables: format!(
                "SELECT owner AS table_schema, table_name, 'BASE TABLE' AS table_type, \
                 NULL AS definition FROM all_tables WHERE {} \
                 UNION ALL \
                 SELECT owner, view_name, 'VIEW', NULL FROM all_views WHERE {} \
                 ORDER BY 1, 2",
                filter("owner"),
                filter("owner")
            ),
            columns: format!(
                "SELECT owner AS table_schema, table_name, column_name, data_type, \
                 char_length AS max_length, data_precision AS numeric_precision, data_scale AS numeric_scale, \
                 CASE nullable WHEN 'Y' THEN 'YES' ELSE 'NO' END AS is_nullable, \
                 data_default AS column_default \
                 FROM all_tab_cols \
                 WHERE hidden_column = 'NO' AND {} \
                 ORDER BY owner, table_name, column_id",
                filter("owner")
            ),
            keys: format!(
                "SELECT c.owner AS table_schema, c.table_name, c.constraint_name, \
                 c.constraint_type, cc.column_name, cc.position AS ordinal_position \
                 FROM all_constraints c \
                 JOIN all_cons_columns cc \
                 ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
                 WHERE c.constraint_type IN ('P', 'U') AND {} \
                 ORDER BY 1, 2, 3, 6",
                filter("c.owner")
            ),
            foreign_keys: format!(
                "SELECT c.owner AS table_schema, c.table_name, c.constraint_name, \
                 cc.column_name, r.owner AS references_schema, r.table_name AS references_table, \
                 rcc.column_name AS references_column, c.delete_rule, cc.position AS ordinal_position \
                 FROM all_constraints c \
                 JOIN all_cons_columns cc \
                 ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
                 JOIN all_constraints r \
                 ON r.owner = c.r_owner AND r.constraint_name = c.r_constraint_name \
                 JOIN all_cons_columns rcc \
                 ON rcc.owner = r.owner AND rcc.constraint_name = r.constraint_name \
                 AND rcc.position = cc.position \
                 WHERE c.constraint_type = 'R' AND {} \
                 ORDER BY 1, 2, 3, 9",
                filter("c.owner")
            ),
            checks: Some(format!(
                "SELECT owner AS table_schema, table_name, constraint_name, \
                 search_condition AS check_clause \
                 FROM all_constraints \
                 WHERE constraint_type = 'C' AND generated = 'USER NAME' AND {} \
                 ORDER BY 1, 2, 3",
                filter("owner")
            )),
            indexes: None,
            sequences: Some(format!(
                "SELECT sequence_owner AS table_schema, sequence_name, \
                 increment_by AS increment, NULL AS current_value, last_number AS start_value \
                 FROM all_sequences WHERE {} \
                 ORDER BY 1, 2",
                filter("sequence_owner")
            )),
        }
    }
}

// =============================================================================
// SQLite
// =============================================================================

/// `sqlite_master` joined with the table-valued pragma functions
pub mod sqlite {
    use super::{Queries, SEQUENCE_TABLE};

    /// Engine tables and the counter table are not part of a user schema
    const USER_TABLES: &str = "m.name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";

    /// Whether the counter table exists; sequences are only read when it does
    #[must_use]
    pub fn counter_table_exists() -> String {
        format!("SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = '{SEQUENCE_TABLE}'")
    }

    pub(super) fn queries() -> Queries {
        Queries {
            tables: format!(
                "SELECT NULL AS table_schema, m.name AS table_name, \
                 CASE m.type WHEN 'view' THEN 'VIEW' ELSE 'BASE TABLE' END AS table_type, \
                 m.sql AS definition \
                 FROM sqlite_master m \
                 WHERE m.type IN ('table', 'view') AND {USER_TABLES} \
                 AND m.name != '{SEQUENCE_TABLE}' \
                 ORDER BY m.name"
            ),
            columns: format!(
                "SELECT NULL AS table_schema, m.name AS table_name, p.name AS column_name, \
                 p.type AS data_type, NULL AS max_length, NULL AS numeric_precision, NULL AS numeric_scale, \
                 CASE p.\"notnull\" WHEN 0 THEN 'YES' ELSE 'NO' END AS is_nullable, \
                 p.dflt_value AS column_default \
                 FROM sqlite_master m JOIN pragma_table_info(m.name) p \
                 WHERE m.type IN ('table', 'view') AND {USER_TABLES} \
                 ORDER BY m.name, p.cid"
            ),
            keys: format!(
                "SELECT NULL AS table_schema, m.name AS table_name, \
                 'pk_' || m.name AS constraint_name, 'PRIMARY KEY' AS constraint_type, \
                 p.name AS column_name, p.pk AS ordinal_position \
                 FROM sqlite_master m JOIN pragma_table_info(m.name) p \
                 WHERE m.type = 'table' AND p.pk > 0 AND {USER_TABLES} \
                 UNION ALL \
                 SELECT NULL, m.name, il.name, 'UNIQUE', ii.name, ii.seqno + 1 \
                 FROM sqlite_master m \
                 JOIN pragma_index_list(m.name) il \
                 JOIN pragma_index_info(il.name) ii \
                 WHERE m.type = 'table' AND il.origin = 'u' AND {USER_TABLES} \
                 ORDER BY 2, 3, 6"
            ),
            foreign_keys: format!(
                "SELECT NULL AS table_schema, m.name AS table_name, \
                 'fk_' || m.name || '_' || p.id AS constraint_name, \
                 p.\"from\" AS column_name, NULL AS references_schema, \
                 p.\"table\" AS references_table, p.\"to\" AS references_column, \
                 p.on_delete AS delete_rule, p.seq AS ordinal_position \
                 FROM sqlite_master m JOIN pragma_foreign_key_list(m.name) p \
                 WHERE m.type = 'table' AND {USER_TABLES} \
                 ORDER BY m.name, p.id, p.seq"
            ),
            checks: None,
            indexes: Some(format!(
                "SELECT NULL AS table_schema, m.name AS table_name, il.name AS index_name, \
                 il.\"unique\" AS is_unique, ii.name AS column_name \
                 FROM sqlite_master m \
                 JOIN pragma_index_list(m.name) il \
                 JOIN pragma_index_info(il.name) ii \
                 WHERE m.type = 'table' AND il.origin = 'c' AND {USER_TABLES} \
                 ORDER BY m.name, il.name, ii.seqno"
            )),
            sequences: Some(format!(
                "SELECT NULL AS table_schema, name AS sequence_name, 1 AS increment, \
                 seq AS current_value, NULL AS start_value \
                 FROM {SEQUENCE_TABLE} ORDER BY name"
            )),
        }
    }
}
