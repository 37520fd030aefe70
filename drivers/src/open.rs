//! Opening native connections from a [`ConnectionDescriptor`]

#![allow(unused_imports)]

use polydb_core::{ConnectionDescriptor, Fault, Result};
use polydb_dialect::DialectTableExt;
use polydb_types::DialectKind;

fn expect_dialect(descriptor: &ConnectionDescriptor, kind: DialectKind) -> Result<()> {
    descriptor.validate()?;
    if descriptor.dialect != kind {
        return Err(Fault::Config(format!(
            "descriptor is for {}, not {kind}",
            descriptor.dialect
        )));
    }
    Ok(())
}

/// libpq connection string; TLS is not wired in, so `encrypt` is refused
#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
fn postgres_config(descriptor: &ConnectionDescriptor) -> Result<String> {
    expect_dialect(descriptor, DialectKind::PostgreSql)?;
    if descriptor.encrypt {
        return Err(Fault::Config(
            "encrypted PostgreSQL connections need a TLS connector".into(),
        ));
    }
    Ok(DialectKind::PostgreSql.table().connection_string(descriptor))
}

/// Open a SQLite database file, or an in-memory database when no path is set
///
/// # Examples
///
/// ```
/// use polydb_core::{ConnectionDescriptor, Value};
/// use polydb_drivers::{Connection, open_sqlite};
///
/// let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
/// assert_eq!(conn.scalar("SELECT 40 + 2", &[]).unwrap(), Value::I64(42));
/// ```
#[cfg(feature = "rusqlite")]
pub fn open_sqlite(descriptor: &ConnectionDescriptor) -> Result<rusqlite::Connection> {
    expect_dialect(descriptor, DialectKind::Sqlite)?;
    let conn = match &descriptor.path {
        Some(path) => rusqlite::Connection::open(path),
        None => rusqlite::Connection::open_in_memory(),
    }
    .map_err(Fault::engine)?;

    if let Some(timeout) = descriptor.timeout_duration() {
        conn.busy_timeout(timeout).map_err(Fault::engine)?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(path = ?descriptor.path, "polydb.open.sqlite");

    Ok(conn)
}

/// Open a blocking PostgreSQL client
#[cfg(feature = "postgres-sync")]
pub fn open_postgres(descriptor: &ConnectionDescriptor) -> Result<postgres::Client> {
    let config = postgres_config(descriptor)?;
    let client = postgres::Client::connect(&config, postgres::NoTls).map_err(Fault::engine)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(host = ?descriptor.host, database = ?descriptor.database, "polydb.open.postgres");

    Ok(client)
}

/// Connect an asynchronous PostgreSQL client
///
/// The connection future is spawned on the current tokio runtime; it ends
/// when the client is dropped.
#[cfg(feature = "tokio-postgres")]
pub async fn connect_tokio_postgres(
    descriptor: &ConnectionDescriptor,
) -> Result<tokio_postgres::Client> {
    let config = postgres_config(descriptor)?;
    let (client, connection) = tokio_postgres::connect(&config, tokio_postgres::NoTls)
        .await
        .map_err(Fault::engine)?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            #[cfg(feature = "tracing")]
            tracing::error!(error = %err, "polydb.connection");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
        }
    });

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_mismatch_is_configuration_error() {
        let descriptor = ConnectionDescriptor::new(DialectKind::PostgreSql)
            .host("localhost")
            .database("app")
            .credentials("app", "secret");
        let err = expect_dialect(&descriptor, DialectKind::Sqlite).unwrap_err();
        assert!(err.is_configuration());
    }

    #[cfg(feature = "rusqlite")]
    #[test]
    fn test_open_sqlite_file() {
        use crate::Connection;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let descriptor = ConnectionDescriptor::sqlite(&path).timeout_secs(2);

        let mut conn = open_sqlite(&descriptor).unwrap();
        Connection::execute_batch(&mut conn, "CREATE TABLE t (id INTEGER)").unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
    #[test]
    fn test_postgres_refuses_encrypt() {
        let mut descriptor = ConnectionDescriptor::new(DialectKind::PostgreSql)
            .host("db")
            .database("app")
            .credentials("app", "secret");
        descriptor.encrypt = true;
        assert!(postgres_config(&descriptor).unwrap_err().is_configuration());
    }
}
