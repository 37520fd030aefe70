//! Tracing utilities for statement and transaction observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site. The `tracing` feature must be declared by the crate that
//! expands the macro.

/// Emit a debug-level tracing event with the SQL text and parameter count.
///
/// ```ignore
/// polydb_trace_sql!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! polydb_trace_sql {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "polydb.sql");
    };
}

/// Emit an info-level tracing event for transaction lifecycle (begin, commit, rollback).
///
/// ```ignore
/// polydb_trace_tx!("begin", "sqlite.rusqlite");
/// polydb_trace_tx!("commit", "postgres.sync");
/// ```
#[macro_export]
macro_rules! polydb_trace_tx {
    ($event:literal, $driver:literal) => {
        #[cfg(feature = "tracing")]
        tracing::info!(event = $event, driver = $driver, "polydb.transaction");
    };
}

/// Emit a warn-level tracing event for a best-effort step that failed and was skipped.
///
/// ```ignore
/// polydb_trace_skip!(&sql, &err);
/// ```
#[macro_export]
macro_rules! polydb_trace_skip {
    ($what:expr, $err:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(what = %$what, error = %$err, "polydb.skipped");
    };
}
