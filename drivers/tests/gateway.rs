use std::cell::RefCell;

use polydb_core::{Fault, Result, Row, Value};
use polydb_drivers::gateway::{self, Expect, Outcome};
use polydb_drivers::{AsyncConnection, CursorBehavior, Param, VecCursor};
use polydb_types::DialectKind;

/// In-memory stand-in answering every query with the same rows
struct Canned {
    rows: Vec<Row>,
    affected: u64,
    behaviors: RefCell<Vec<CursorBehavior>>,
}

impl Canned {
    fn new() -> Self {
        Self {
            rows: (1..=3)
                .map(|id| Row::new().with("id", id as i64).with("name", format!("n{id}")))
                .collect(),
            affected: 7,
            behaviors: RefCell::new(Vec::new()),
        }
    }
}

impl AsyncConnection for Canned {
    type Cursor<'c> = VecCursor;

    fn dialect(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    async fn execute_non_query(&self, sql: &str, _params: &[Param<'_>]) -> Result<u64> {
        if sql.starts_with("FAIL") {
            return Err(Fault::engine_message("syntax error"));
        }
        Ok(self.affected)
    }

    async fn execute_reader(
        &self,
        _sql: &str,
        _params: &[Param<'_>],
        behavior: CursorBehavior,
    ) -> Result<VecCursor> {
        self.behaviors.borrow_mut().push(behavior);
        Ok(VecCursor::new(self.rows.clone(), behavior))
    }
}

#[tokio::test]
async fn test_scalar_reads_first_column_of_first_row() {
    let conn = Canned::new();
    let outcome = gateway::execute(&conn, "SELECT id FROM t", &[], Expect::Scalar, CursorBehavior::Default)
        .await
        .unwrap();
    assert_eq!(outcome.scalar(), Some(&Value::I64(1)));
    assert_eq!(*conn.behaviors.borrow(), [CursorBehavior::SingleRow]);
}

#[tokio::test]
async fn test_rows_are_collected_in_order() {
    let conn = Canned::new();
    let rows = gateway::execute(&conn, "SELECT * FROM t", &[], Expect::Rows, CursorBehavior::Default)
        .await
        .unwrap()
        .into_rows();
    let ids: Vec<_> = rows.iter().filter_map(|r| r.get("id").and_then(Value::as_i64)).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn test_single_row_behavior_limits_rows() {
    let conn = Canned::new();
    let outcome = gateway::execute(&conn, "SELECT * FROM t", &[], Expect::Rows, CursorBehavior::SingleRow)
        .await
        .unwrap();
    assert_eq!(outcome.into_rows().len(), 1);
}

#[tokio::test]
async fn test_affected_reports_count() {
    let conn = Canned::new();
    let outcome = gateway::execute(
        &conn,
        "DELETE FROM t WHERE id = :id",
        &[("id", Value::I64(1))],
        Expect::Affected,
        CursorBehavior::Default,
    )
    .await
    .unwrap();
    assert_eq!(outcome, Outcome::Affected(7));
    assert!(conn.behaviors.borrow().is_empty());
}

#[tokio::test]
async fn test_engine_errors_propagate() {
    let conn = Canned::new();
    let err = gateway::execute(&conn, "FAIL", &[], Expect::Affected, CursorBehavior::Default)
        .await
        .unwrap_err();
    assert!(err.is_engine());
}

#[tokio::test]
async fn test_for_each_row_streams_without_collecting() {
    let conn = Canned::new();
    let mut names = Vec::new();
    let count = gateway::for_each_row(
        &conn,
        "SELECT * FROM t",
        &[],
        CursorBehavior::SequentialAccess,
        |row| {
            names.push(row.get("name").and_then(Value::as_str).unwrap_or_default().to_string());
            Ok(())
        },
    )
    .await
    .unwrap();
    assert_eq!(count, 3);
    assert_eq!(names, ["n1", "n2", "n3"]);
}

#[tokio::test]
async fn test_for_each_row_stops_at_callback_error() {
    let conn = Canned::new();
    let mut seen = 0;
    let err = gateway::for_each_row(&conn, "SELECT * FROM t", &[], CursorBehavior::Default, |_| {
        seen += 1;
        if seen == 2 {
            return Err(Fault::Config("stop".into()));
        }
        Ok(())
    })
    .await
    .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(seen, 2);
}
