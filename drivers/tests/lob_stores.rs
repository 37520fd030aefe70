use std::collections::VecDeque;
use std::io::Read;

use polydb_core::{Result, Row, Value};
use polydb_drivers::lob::LOB_BUFFER_SIZE;
use polydb_drivers::{
    BufferedLobStore, Connection, LobId, LobStore, NativeLobStore, Param, SideTableLobStore,
    lob_store,
};
use polydb_types::DialectKind;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// =============================================================================
// Recording connection
// =============================================================================

/// Records every statement and answers queries from a script of rows
struct Recorder {
    dialect: DialectKind,
    statements: Vec<(String, Vec<(String, Value)>)>,
    answers: VecDeque<Value>,
    transactions: Vec<&'static str>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::on(DialectKind::PostgreSql, [])
    }
}

impl Recorder {
    fn on(dialect: DialectKind, answers: impl IntoIterator<Item = Value>) -> Self {
        Self {
            dialect,
            statements: Vec::new(),
            answers: answers.into_iter().collect(),
            transactions: Vec::new(),
        }
    }

    fn answering(answers: impl IntoIterator<Item = Value>) -> Self {
        Self::on(DialectKind::PostgreSql, answers)
    }

    fn params(&self, index: usize) -> &[(String, Value)] {
        &self.statements[index].1
    }

    fn record(&mut self, sql: &str, params: &[Param<'_>]) {
        self.statements.push((
            sql.to_string(),
            params
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        ));
    }

    fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

impl Connection for Recorder {
    fn dialect(&self) -> DialectKind {
        self.dialect
    }

    fn execute(&mut self, sql: &str, params: &[Param<'_>]) -> Result<u64> {
        self.record(sql, params);
        Ok(1)
    }

    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        self.record(sql, params);
        Ok(self
            .answers
            .pop_front()
            .map(|value| vec![Row::new().with("value", value)])
            .unwrap_or_default())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.record(sql, &[]);
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.transactions.push("begin");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.transactions.push("commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.transactions.push("rollback");
        Ok(())
    }
}

// =============================================================================
// Native
// =============================================================================

#[test]
fn test_native_create_writes_chunks_in_one_transaction() {
    let mut conn = Recorder::answering([Value::I64(16401)]);
    let data = payload(LOB_BUFFER_SIZE + 100);

    let id = NativeLobStore
        .create(&mut conn, &mut data.as_slice())
        .unwrap();

    assert_eq!(id, LobId(16401));
    assert_eq!(conn.transactions, ["begin", "commit"]);
    assert_eq!(conn.sql()[0], "SELECT lo_create(0)");

    let puts: Vec<_> = conn.statements[1..].iter().collect();
    assert_eq!(puts.len(), 2);
    assert!(puts.iter().all(|(sql, _)| sql == "SELECT lo_put(:oid, :offset, :chunk)"));
    assert_eq!(puts[1].1[1], ("offset".to_string(), Value::I64(LOB_BUFFER_SIZE as i64)));
    match &puts[1].1[2].1 {
        Value::Bytes(chunk) => assert_eq!(chunk.len(), 100),
        other => panic!("unexpected chunk {other:?}"),
    }
}

#[test]
fn test_native_open_reads_until_short_chunk() {
    let data = payload(LOB_BUFFER_SIZE + 10);
    let mut conn = Recorder::answering([
        Value::I64(1),
        Value::Bytes(data[..LOB_BUFFER_SIZE].to_vec()),
        Value::Bytes(data[LOB_BUFFER_SIZE..].to_vec()),
    ]);

    let mut read = Vec::new();
    NativeLobStore
        .open(&mut conn, LobId(7))
        .unwrap()
        .read_to_end(&mut read)
        .unwrap();

    assert_eq!(read, data);
    assert_eq!(
        conn.sql(),
        [
            "SELECT count(*) FROM pg_largeobject_metadata WHERE oid = :oid",
            "SELECT lo_get(:oid, :offset, :length)",
            "SELECT lo_get(:oid, :offset, :length)",
        ]
    );
}

#[test]
fn test_native_open_of_missing_object_fails() {
    let mut conn = Recorder::answering([Value::I64(0)]);
    let err = NativeLobStore.open(&mut conn, LobId(9)).err().unwrap();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_native_delete_unlinks() {
    let mut conn = Recorder::default();
    NativeLobStore.delete(&mut conn, LobId(3)).unwrap();
    assert_eq!(conn.sql(), ["SELECT lo_unlink(:oid)"]);
}

// =============================================================================
// Sequence-keyed side table
// =============================================================================

#[test]
fn test_generic_side_table_keys_from_sequence() {
    let mut conn = Recorder::on(DialectKind::Generic, [Value::I64(41)]);
    let store = lob_store(&conn);

    let id = store.create(&mut conn, &mut &b"hello"[..]).unwrap();

    assert_eq!(id, LobId(41));
    assert_eq!(
        conn.sql(),
        [
            "SELECT NEXT VALUE FOR db_lob_seq",
            "INSERT INTO db_lob (id, data) VALUES (41, @data)",
        ]
    );
    assert_eq!(
        conn.params(1),
        [("data".to_string(), Value::Bytes(b"hello".to_vec()))]
    );
    assert_eq!(conn.transactions, ["begin", "commit", "begin", "commit"]);
}

#[test]
fn test_generic_install_creates_sequence() {
    let mut conn = Recorder::on(DialectKind::Generic, []);
    SideTableLobStore.install(&mut conn).unwrap();

    let sql = conn.sql();
    assert!(sql[0].starts_with("CREATE TABLE db_lob"), "{}", sql[0]);
    assert!(!sql[0].contains("IDENTITY"), "{}", sql[0]);
    assert_eq!(
        sql.last().copied(),
        Some("CREATE SEQUENCE db_lob_seq START WITH 1 INCREMENT BY 1")
    );
}

#[test]
fn test_oracle_buffered_appends_chunks() {
    let mut conn = Recorder::on(DialectKind::Oracle, [Value::Decimal(7.into())]);
    let store = BufferedLobStore::with_buffer_size(4);

    let id = store.create(&mut conn, &mut &b"hello world"[..]).unwrap();

    assert_eq!(id, LobId(7));
    let sql = conn.sql();
    assert_eq!(sql[0], "SELECT db_lob_seq.NEXTVAL FROM dual");
    assert_eq!(sql[1], "INSERT INTO db_lob (id, data) VALUES (7, :data)");
    assert_eq!(
        conn.params(1),
        [("data".to_string(), Value::Bytes(b"hell".to_vec()))]
    );

    let appends: Vec<_> = conn.statements[2..]
        .iter()
        .map(|(sql, params)| {
            assert!(sql.contains("DBMS_LOB.WRITEAPPEND(l, :length, :chunk)"), "{sql}");
            params[1].1.clone()
        })
        .collect();
    assert_eq!(
        appends,
        [Value::Bytes(b"o wo".to_vec()), Value::Bytes(b"rld".to_vec())]
    );
}

#[test]
fn test_oracle_side_table_model_has_no_identity() {
    let table = SideTableLobStore::table(DialectKind::Oracle);
    assert!(!table.primary_key().unwrap().auto_increment);
    let table = SideTableLobStore::table(DialectKind::Sqlite);
    assert!(table.primary_key().unwrap().auto_increment);
}

#[test]
fn test_buffered_open_reads_slices() {
    let mut conn = Recorder::on(
        DialectKind::MsSql,
        [
            Value::I32(10),
            Value::Bytes(b"abcd".to_vec()),
            Value::Bytes(b"efgh".to_vec()),
            Value::Bytes(b"ij".to_vec()),
        ],
    );

    let mut read = Vec::new();
    BufferedLobStore::with_buffer_size(4)
        .open(&mut conn, LobId(3))
        .unwrap()
        .read_to_end(&mut read)
        .unwrap();

    assert_eq!(read, b"abcdefghij");
    assert_eq!(conn.sql()[0], "SELECT DATALENGTH(data) FROM db_lob WHERE id = @id");
    assert_eq!(conn.sql()[1], "SELECT SUBSTRING(data, @offset, @length) FROM db_lob WHERE id = @id");
    assert_eq!(conn.params(3)[1], ("offset".to_string(), Value::I32(9)));
    assert_eq!(conn.params(3)[2], ("length".to_string(), Value::I32(2)));
}

#[test]
fn test_buffered_open_of_missing_object_fails() {
    let mut conn = Recorder::on(DialectKind::MsSql, []);
    let err = BufferedLobStore::default().open(&mut conn, LobId(5)).err().unwrap();
    assert!(err.is_configuration());
}

// =============================================================================
// SQLite side table
// =============================================================================

#[cfg(feature = "rusqlite")]
mod sqlite {
    use super::*;
    use polydb_core::ConnectionDescriptor;
    use polydb_drivers::open_sqlite;

    fn installed() -> rusqlite::Connection {
        let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
        SideTableLobStore.install(&mut conn).unwrap();
        conn
    }

    fn roundtrip(store: &dyn LobStore) {
        let mut conn = installed();
        let data = payload(3 * LOB_BUFFER_SIZE + 17);

        let first = store.create(&mut conn, &mut data.as_slice()).unwrap();
        let second = store.create(&mut conn, &mut &b"tiny"[..]).unwrap();
        assert_ne!(first, second);

        let mut read = Vec::new();
        store
            .open(&mut conn, first)
            .unwrap()
            .read_to_end(&mut read)
            .unwrap();
        assert_eq!(read, data);

        store.delete(&mut conn, first).unwrap();
        assert!(store.open(&mut conn, first).is_err());
        assert!(store.delete(&mut conn, first).unwrap_err().is_configuration());
    }

    #[test]
    fn test_side_table_roundtrip() {
        roundtrip(&SideTableLobStore);
    }

    #[test]
    fn test_buffered_roundtrip() {
        roundtrip(&BufferedLobStore::with_buffer_size(4096));
    }

    #[test]
    fn test_sqlite_uses_side_table() {
        let mut conn = installed();
        let store = lob_store(&conn);
        let id = store.create(&mut conn, &mut &b"hello"[..]).unwrap();

        let mut read = String::new();
        store
            .open(&mut conn, id)
            .unwrap()
            .read_to_string(&mut read)
            .unwrap();
        assert_eq!(read, "hello");
    }

    #[test]
    fn test_empty_payload() {
        let mut conn = installed();
        let id = SideTableLobStore
            .create(&mut conn, &mut &b""[..])
            .unwrap();
        let mut read = Vec::new();
        SideTableLobStore
            .open(&mut conn, id)
            .unwrap()
            .read_to_end(&mut read)
            .unwrap();
        assert!(read.is_empty());
    }
}
