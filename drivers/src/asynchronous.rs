use polydb_core::{Result, Row, Value};
use polydb_types::DialectKind;

use crate::connection::Param;

/// How a reader delivers rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorBehavior {
    #[default]
    Default,
    /// Rows are decoded one at a time as the caller advances, never buffered
    /// as a whole; used when streaming large-object columns
    SequentialAccess,
    /// Only the first row is produced
    SingleRow,
}

/// Forward-only row cursor
///
/// A cursor belongs to the connection that produced it and must be drained
/// or dropped before the owning transaction ends.
#[allow(async_fn_in_trait)]
pub trait RowCursor {
    /// Next row, `None` once the cursor is exhausted
    async fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Asynchronous connection to one engine
///
/// Every call awaits the driver's own asynchronous primitive; nothing is
/// scheduled on a separate task.
#[allow(async_fn_in_trait)]
pub trait AsyncConnection {
    type Cursor<'c>: RowCursor
    where
        Self: 'c;

    fn dialect(&self) -> DialectKind;

    /// Execute a statement and return the affected row count
    async fn execute_non_query(&self, sql: &str, params: &[Param<'_>]) -> Result<u64>;

    /// Execute a query and return a forward-only cursor over its rows
    async fn execute_reader(
        &self,
        sql: &str,
        params: &[Param<'_>],
        behavior: CursorBehavior,
    ) -> Result<Self::Cursor<'_>>;

    /// First column of the first row, `Null` when there are no rows
    async fn execute_scalar(&self, sql: &str, params: &[Param<'_>]) -> Result<Value> {
        let mut cursor = self
            .execute_reader(sql, params, CursorBehavior::SingleRow)
            .await?;
        Ok(cursor
            .next_row()
            .await?
            .and_then(|row| row.iter().next().map(|(_, value)| value.clone()))
            .unwrap_or(Value::Null))
    }
}

/// Cursor over rows already in memory
#[derive(Debug, Clone)]
pub struct VecCursor {
    rows: std::vec::IntoIter<Row>,
}

impl VecCursor {
    #[must_use]
    pub fn new(mut rows: Vec<Row>, behavior: CursorBehavior) -> Self {
        if behavior == CursorBehavior::SingleRow {
            rows.truncate(1);
        }
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl RowCursor for VecCursor {
    async fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}
