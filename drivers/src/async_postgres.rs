//! Asynchronous PostgreSQL through [`tokio_postgres`]

use std::pin::Pin;

use futures_util::TryStreamExt;
use polydb_core::{Fault, Result, Row, polydb_trace_sql};
use polydb_dialect::DialectTableExt;
use polydb_types::DialectKind;
use tokio_postgres::RowStream;
use tokio_postgres::types::ToSql;

use crate::asynchronous::{AsyncConnection, CursorBehavior, RowCursor};
use crate::connection::Param;
use crate::pg::{positional, row_values};

/// Forward-only cursor over a [`RowStream`]
pub struct PgCursor {
    stream: Pin<Box<RowStream>>,
    single_row: bool,
    done: bool,
}

impl std::fmt::Debug for PgCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgCursor")
            .field("single_row", &self.single_row)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl RowCursor for PgCursor {
    async fn next_row(&mut self) -> Result<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        let Some(row) = self.stream.try_next().await.map_err(Fault::engine)? else {
            self.done = true;
            return Ok(None);
        };
        if self.single_row {
            self.done = true;
        }
        row_values(&row).map(Some)
    }
}

impl AsyncConnection for tokio_postgres::Client {
    type Cursor<'c> = PgCursor;

    fn dialect(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    async fn execute_non_query(&self, sql: &str, params: &[Param<'_>]) -> Result<u64> {
        let (sql, values) = positional(sql, DialectKind::PostgreSql.table().parameter_prefix, params)?;
        polydb_trace_sql!(&sql, values.len());
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        self.execute(sql.as_str(), &refs)
            .await
            .map_err(Fault::engine)
    }

    async fn execute_reader(
        &self,
        sql: &str,
        params: &[Param<'_>],
        behavior: CursorBehavior,
    ) -> Result<PgCursor> {
        let (sql, values) = positional(sql, DialectKind::PostgreSql.table().parameter_prefix, params)?;
        polydb_trace_sql!(&sql, values.len());
        let stream = self
            .query_raw(sql.as_str(), values.iter().map(|v| v as &dyn ToSql))
            .await
            .map_err(Fault::engine)?;
        Ok(PgCursor {
            stream: Box::pin(stream),
            single_row: behavior == CursorBehavior::SingleRow,
            done: false,
        })
    }
}
