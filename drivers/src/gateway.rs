//! Asynchronous execution gateway
//!
//! One entry point for the three statement outcomes. The caller states what
//! it expects; the gateway dispatches to the matching [`AsyncConnection`]
//! primitive.
//!
//! ```ignore
//! let outcome = gateway::execute(
//!     &client,
//!     "SELECT count(*) FROM orders",
//!     &[],
//!     Expect::Scalar,
//!     CursorBehavior::Default,
//! )
//! .await?;
//! ```

use polydb_core::{Result, Row, Value, polydb_trace_sql};

use crate::asynchronous::{AsyncConnection, CursorBehavior, RowCursor};
use crate::connection::Param;

/// Requested statement outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expect {
    Scalar,
    Rows,
    Affected,
}

/// Result of one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Scalar(Value),
    Rows(Vec<Row>),
    Affected(u64),
}

impl Outcome {
    /// Rows of a [`Outcome::Rows`], empty otherwise
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Outcome::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Affected(count) => Some(*count),
            _ => None,
        }
    }

    #[must_use]
    pub fn scalar(&self) -> Option<&Value> {
        match self {
            Outcome::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// Execute `sql` and produce the expected outcome
///
/// `behavior` only applies to [`Expect::Rows`].
pub async fn execute<C>(
    conn: &C,
    sql: &str,
    params: &[Param<'_>],
    expect: Expect,
    behavior: CursorBehavior,
) -> Result<Outcome>
where
    C: AsyncConnection + ?Sized,
{
    polydb_trace_sql!(sql, params.len());
    match expect {
        Expect::Scalar => conn.execute_scalar(sql, params).await.map(Outcome::Scalar),
        Expect::Affected => conn
            .execute_non_query(sql, params)
            .await
            .map(Outcome::Affected),
        Expect::Rows => {
            let mut cursor = conn.execute_reader(sql, params, behavior).await?;
            let mut rows = Vec::new();
            while let Some(row) = cursor.next_row().await? {
                rows.push(row);
            }
            Ok(Outcome::Rows(rows))
        }
    }
}

/// Stream rows into `f` without collecting them; returns the row count
pub async fn for_each_row<C, F>(
    conn: &C,
    sql: &str,
    params: &[Param<'_>],
    behavior: CursorBehavior,
    mut f: F,
) -> Result<u64>
where
    C: AsyncConnection + ?Sized,
    F: FnMut(Row) -> Result<()>,
{
    polydb_trace_sql!(sql, params.len());
    let mut cursor = conn.execute_reader(sql, params, behavior).await?;
    let mut count = 0;
    while let Some(row) = cursor.next_row().await? {
        f(row)?;
        count += 1;
    }
    Ok(count)
}
