//! Synchronous PostgreSQL through [`postgres`]

use polydb_core::{Fault, Result, Row, polydb_trace_sql, polydb_trace_tx};
use polydb_dialect::DialectTableExt;
use polydb_types::DialectKind;
use postgres::types::ToSql;

use crate::connection::{Connection, Param};
use crate::pg::{PgParam, positional, row_values};

fn prefix() -> char {
    DialectKind::PostgreSql.table().parameter_prefix
}

fn as_refs(values: &[PgParam]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for postgres::Client {
    fn dialect(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn execute(&mut self, sql: &str, params: &[Param<'_>]) -> Result<u64> {
        let (sql, values) = positional(sql, prefix(), params)?;
        polydb_trace_sql!(&sql, values.len());
        postgres::Client::execute(self, sql.as_str(), &as_refs(&values)).map_err(Fault::engine)
    }

    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        let (sql, values) = positional(sql, prefix(), params)?;
        polydb_trace_sql!(&sql, values.len());
        postgres::Client::query(self, sql.as_str(), &as_refs(&values))
            .map_err(Fault::engine)?
            .iter()
            .map(row_values)
            .collect()
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        polydb_trace_sql!(sql, 0);
        self.batch_execute(sql).map_err(Fault::engine)
    }

    fn begin(&mut self) -> Result<()> {
        polydb_trace_tx!("begin", "postgres.sync");
        self.batch_execute("BEGIN").map_err(Fault::engine)
    }

    fn commit(&mut self) -> Result<()> {
        polydb_trace_tx!("commit", "postgres.sync");
        self.batch_execute("COMMIT").map_err(Fault::engine)
    }

    fn rollback(&mut self) -> Result<()> {
        polydb_trace_tx!("rollback", "postgres.sync");
        self.batch_execute("ROLLBACK").map_err(Fault::engine)
    }
}
