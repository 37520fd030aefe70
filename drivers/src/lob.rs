//! Large-object stores
//!
//! Three interchangeable strategies behind [`LobStore`]:
//!
//! - [`NativeLobStore`] - PostgreSQL server-side large objects (`lo_*`)
//! - [`BufferedLobStore`] - payloads spooled through a temporary file, kept
//!   in the side table
//! - [`SideTableLobStore`] - rows of the `db_lob` table keyed by the engine
//!   issued identity, or by the `db_lob_seq` sequence on engines that cannot
//!   report one
//!
//! [`lob_store`] picks the dialect's strategy. A reader returned by
//! [`LobStore::open`] borrows the connection, so it must be drained or
//! dropped before the connection is used for anything else.

use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use polydb_core::{Column, Fault, Result, Row, Schema, Sequence, Table, Value};
use polydb_dialect::{DdlGenerator, DdlOp, DialectTableExt, LOB_TABLE, LobStrategy, TableOptions};
use polydb_types::{DataType, DialectKind};

use crate::connection::Connection;
use crate::session;

/// Copy buffer and chunk size for large-object transfers
pub const LOB_BUFFER_SIZE: usize = 80 * 1024;

/// Sequence keying the side table where the engine cannot report an identity
pub const LOB_SEQUENCE: &str = "db_lob_seq";

/// Opaque large-object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LobId(pub i64);

impl std::fmt::Display for LobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Create, read and delete large objects
pub trait LobStore {
    /// Create whatever storage the strategy needs; run once per database
    fn install(&self, _conn: &mut dyn Connection) -> Result<()> {
        Ok(())
    }

    /// Store the whole of `source` as a new object
    fn create(&self, conn: &mut dyn Connection, source: &mut dyn Read) -> Result<LobId>;

    /// Sequential reader over an object's bytes
    fn open<'c>(&self, conn: &'c mut dyn Connection, id: LobId) -> Result<Box<dyn Read + 'c>>;

    fn delete(&self, conn: &mut dyn Connection, id: LobId) -> Result<()>;
}

/// Store matching the connection's dialect
#[must_use]
pub fn lob_store<C: Connection + ?Sized>(conn: &C) -> Box<dyn LobStore> {
    match conn.dialect().table().lob {
        LobStrategy::Native => Box::new(NativeLobStore),
        LobStrategy::Buffered => Box::new(BufferedLobStore::default()),
        LobStrategy::SideTable => Box::new(SideTableLobStore),
    }
}

fn missing(id: LobId) -> Fault {
    Fault::Config(format!("large object {id} does not exist"))
}

// =============================================================================
// Side table
// =============================================================================

/// Objects stored as rows of the `db_lob` table
#[derive(Debug, Clone, Copy, Default)]
pub struct SideTableLobStore;

impl SideTableLobStore {
    /// Whether inserts into the side table can report an engine identity
    #[must_use]
    pub fn engine_keyed(kind: DialectKind) -> bool {
        kind == DialectKind::PostgreSql || kind.table().last_identity.is_some()
    }

    /// Model of the side table for a dialect
    #[must_use]
    pub fn table(kind: DialectKind) -> Table {
        let id = Column::new("id", DataType::BigInt).primary_key();
        let id = if Self::engine_keyed(kind) {
            id.auto_increment()
        } else {
            id
        };
        Table::new(LOB_TABLE)
            .column(id)
            .column(Column::new("data", DataType::Blob))
            .with_sequence(LOB_SEQUENCE)
    }

    #[must_use]
    pub fn sequence() -> Sequence {
        Sequence::new(LOB_SEQUENCE)
    }

    fn schema(kind: DialectKind) -> Schema {
        Schema::new("").table(Self::table(kind))
    }

    fn store(conn: &mut dyn Connection, data: Vec<u8>) -> Result<LobId> {
        let mut conn = conn;
        let kind = conn.dialect();
        let mut row = Row::new().with("data", Value::Bytes(data));
        if !Self::engine_keyed(kind) {
            let id = session::next_sequence_value(&mut conn, None, &mut Self::sequence())?;
            row = row.with("id", Value::I64(id));
        }
        let key = session::insert(&mut conn, &mut Self::schema(kind), LOB_TABLE, &row)?;
        key.as_ref()
            .and_then(Value::as_i64)
            .map(LobId)
            .ok_or_else(|| Fault::engine_message("engine did not report the large-object id"))
    }

    fn fetch(conn: &mut dyn Connection, id: LobId) -> Result<Vec<u8>> {
        let mut conn = conn;
        let table = Self::table(conn.dialect());
        let row = session::load_row(&mut conn, &table, &Value::I64(id.0))?
            .ok_or_else(|| missing(id))?;
        match row.get("data") {
            Some(Value::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(Fault::InvalidCast {
                column: "data".into(),
                from: other.kind(),
                to: DataType::Blob,
            }),
        }
    }
}

impl LobStore for SideTableLobStore {
    fn install(&self, conn: &mut dyn Connection) -> Result<()> {
        let mut conn = conn;
        let kind = conn.dialect();
        let ddl = DdlGenerator::new(kind);
        let mut script = ddl.table(DdlOp::Create, &Self::table(kind), TableOptions::ALL)?;
        if !Self::engine_keyed(kind) {
            script.append(ddl.sequence(DdlOp::Create, &Self::sequence())?);
        }
        session::run_script(&mut conn, &script)
    }

    fn create(&self, conn: &mut dyn Connection, source: &mut dyn Read) -> Result<LobId> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        Self::store(conn, data)
    }

    fn open<'c>(&self, conn: &'c mut dyn Connection, id: LobId) -> Result<Box<dyn Read + 'c>> {
        Ok(Box::new(Cursor::new(Self::fetch(conn, id)?)))
    }

    fn delete(&self, conn: &mut dyn Connection, id: LobId) -> Result<()> {
        let mut conn = conn;
        let schema = Self::schema(conn.dialect());
        let affected = session::delete(&mut conn, &schema, LOB_TABLE, &Value::I64(id.0))?;
        if affected == 0 {
            return Err(missing(id));
        }
        Ok(())
    }
}

// =============================================================================
// Buffered
// =============================================================================

/// Side-table objects moved through a seekable temporary file
///
/// Payloads travel in `buffer_size` chunks: `create` spools the source to the
/// file, inserts the first chunk and appends the rest to the row; `open`
/// copies the stored object slice by slice into a fresh file and returns it
/// rewound. The reader holds no connection and the process never buffers
/// more than one chunk. The file is removed when it is dropped, whether the
/// transfer finished or failed.
#[derive(Debug, Clone, Copy)]
pub struct BufferedLobStore {
    buffer_size: usize,
}

impl Default for BufferedLobStore {
    fn default() -> Self {
        Self {
            buffer_size: LOB_BUFFER_SIZE,
        }
    }
}

impl BufferedLobStore {
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Copy `source` into a fresh temporary file, rewound to the start
    fn spool(&self, source: &mut dyn Read) -> Result<(tempfile::NamedTempFile, u64)> {
        let file = tempfile::NamedTempFile::new()?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let length = io::copy(&mut BufReader::with_capacity(self.buffer_size, source), &mut writer)?;
        let mut file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.seek(SeekFrom::Start(0))?;
        Ok((file, length))
    }

    fn append_rest(
        &self,
        conn: &mut dyn Connection,
        id: LobId,
        file: &mut impl Read,
        chunk: &mut [u8],
    ) -> Result<()> {
        let sql = append_sql(conn.dialect());
        loop {
            let read = fill(file, chunk)?;
            if read == 0 {
                return Ok(());
            }
            conn.execute(
                &sql,
                &[
                    ("id", Value::I64(id.0)),
                    ("chunk", Value::Bytes(chunk[..read].to_vec())),
                    ("length", int_param(read)?),
                ],
            )?;
        }
    }
}

impl LobStore for BufferedLobStore {
    fn install(&self, conn: &mut dyn Connection) -> Result<()> {
        SideTableLobStore.install(conn)
    }

    fn create(&self, conn: &mut dyn Connection, source: &mut dyn Read) -> Result<LobId> {
        let (mut file, _length) = self.spool(source)?;
        let mut chunk = vec![0; self.buffer_size];
        let first = fill(&mut file, &mut chunk)?;
        let id = SideTableLobStore::store(conn, chunk[..first].to_vec())?;

        if let Err(err) = self.append_rest(conn, id, &mut file, &mut chunk) {
            // the original error wins over a failed cleanup
            let _ = SideTableLobStore.delete(conn, id);
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = _length, id = id.0, "polydb.lob.create");

        Ok(id)
    }

    fn open<'c>(&self, conn: &'c mut dyn Connection, id: LobId) -> Result<Box<dyn Read + 'c>> {
        let kind = conn.dialect();
        let key = [("id", Value::I64(id.0))];
        let row = conn
            .query(&length_sql(kind), &key)?
            .into_iter()
            .next()
            .ok_or_else(|| missing(id))?;
        let length = match row.iter().next().map(|(_, value)| value) {
            None | Some(Value::Null) => Some(0),
            Some(Value::Decimal(d)) => rust_decimal::prelude::ToPrimitive::to_usize(d),
            Some(other) => other.as_i64().and_then(|n| usize::try_from(n).ok()),
        }
        .ok_or_else(|| Fault::engine_message(format!("large object {id} reported no valid length")))?;

        let mut file = tempfile::NamedTempFile::new()?;
        let slice = slice_sql(kind);
        let mut offset = 0;
        while offset < length {
            let want = (length - offset).min(self.buffer_size);
            let bytes = match conn.scalar(
                &slice,
                &[
                    ("id", Value::I64(id.0)),
                    ("offset", int_param(offset + 1)?),
                    ("length", int_param(want)?),
                ],
            )? {
                Value::Bytes(bytes) => bytes,
                Value::Null => Vec::new(),
                other => {
                    return Err(Fault::InvalidCast {
                        column: "data".into(),
                        from: other.kind(),
                        to: DataType::Blob,
                    });
                }
            };
            if bytes.is_empty() {
                return Err(Fault::engine_message(format!(
                    "large object {id} ended at byte {offset} of {length}"
                )));
            }
            file.write_all(&bytes)?;
            offset += bytes.len();
        }
        file.seek(SeekFrom::Start(0))?;
        Ok(Box::new(file))
    }

    fn delete(&self, conn: &mut dyn Connection, id: LobId) -> Result<()> {
        SideTableLobStore.delete(conn, id)
    }
}

/// Read until `buf` is full or the source ends
fn fill(source: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn int_param(value: usize) -> Result<Value> {
    i32::try_from(value)
        .map(Value::I32)
        .map_err(|_| Fault::Config(format!("large-object offset {value} is out of range")))
}

/// Statement appending `chunk` to the `data` of row `id`
fn append_sql(kind: DialectKind) -> String {
    let p = |name: &str| kind.table().parameter(name);
    let (id, chunk) = (p("id"), p("chunk"));
    match kind {
        DialectKind::MsSql => {
            format!("UPDATE {LOB_TABLE} SET data.WRITE({chunk}, NULL, 0) WHERE id = {id}")
        }
        DialectKind::Oracle => format!(
            "DECLARE l BLOB; BEGIN SELECT data INTO l FROM {LOB_TABLE} WHERE id = {id} FOR UPDATE; \
             DBMS_LOB.WRITEAPPEND(l, {}, {chunk}); END;",
            p("length")
        ),
        // `||` yields text on SQLite
        DialectKind::Sqlite => {
            format!("UPDATE {LOB_TABLE} SET data = CAST(data || {chunk} AS BLOB) WHERE id = {id}")
        }
        DialectKind::Generic | DialectKind::PostgreSql => {
            format!("UPDATE {LOB_TABLE} SET data = data || {chunk} WHERE id = {id}")
        }
    }
}

/// Query returning the byte length of row `id`, no row when it does not exist
fn length_sql(kind: DialectKind) -> String {
    let function = match kind {
        DialectKind::Sqlite => "length",
        DialectKind::MsSql => "DATALENGTH",
        DialectKind::Oracle => "DBMS_LOB.GETLENGTH",
        DialectKind::Generic | DialectKind::PostgreSql => "octet_length",
    };
    format!(
        "SELECT {function}(data) FROM {LOB_TABLE} WHERE id = {}",
        kind.table().parameter("id")
    )
}

/// Query returning `length` bytes of row `id` from the 1-based `offset`
fn slice_sql(kind: DialectKind) -> String {
    let p = |name: &str| kind.table().parameter(name);
    let (id, offset, length) = (p("id"), p("offset"), p("length"));
    let slice = match kind {
        DialectKind::Sqlite => format!("substr(data, {offset}, {length})"),
        DialectKind::MsSql => format!("SUBSTRING(data, {offset}, {length})"),
        DialectKind::Oracle => format!("DBMS_LOB.SUBSTR(data, {length}, {offset})"),
        DialectKind::Generic | DialectKind::PostgreSql => {
            format!("substring(data from {offset} for {length})")
        }
    };
    format!("SELECT {slice} FROM {LOB_TABLE} WHERE id = {id}")
}

// =============================================================================
// Native
// =============================================================================

/// PostgreSQL large objects
///
/// Creation writes the payload in chunks inside one transaction; reading
/// pulls one chunk per round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLobStore;

impl LobStore for NativeLobStore {
    fn create(&self, conn: &mut dyn Connection, source: &mut dyn Read) -> Result<LobId> {
        let mut conn = conn;
        Connection::transaction(&mut conn, |conn| {
            let oid = conn
                .scalar("SELECT lo_create(0)", &[])?
                .as_i64()
                .ok_or_else(|| Fault::engine_message("lo_create returned no oid"))?;

            let mut chunk = vec![0; LOB_BUFFER_SIZE];
            let mut offset = 0i64;
            loop {
                let read = source.read(&mut chunk)?;
                if read == 0 {
                    break;
                }
                conn.execute(
                    "SELECT lo_put(:oid, :offset, :chunk)",
                    &[
                        ("oid", Value::I64(oid)),
                        ("offset", Value::I64(offset)),
                        ("chunk", Value::Bytes(chunk[..read].to_vec())),
                    ],
                )?;
                offset += read as i64;
            }
            Ok(LobId(oid))
        })
    }

    fn open<'c>(&self, conn: &'c mut dyn Connection, id: LobId) -> Result<Box<dyn Read + 'c>> {
        let exists = conn.scalar(
            "SELECT count(*) FROM pg_largeobject_metadata WHERE oid = :oid",
            &[("oid", Value::I64(id.0))],
        )?;
        if exists.as_i64() == Some(0) {
            return Err(missing(id));
        }
        Ok(Box::new(ChunkReader {
            conn,
            id,
            offset: 0,
            chunk: Cursor::new(Vec::new()),
            done: false,
        }))
    }

    fn delete(&self, conn: &mut dyn Connection, id: LobId) -> Result<()> {
        conn.execute("SELECT lo_unlink(:oid)", &[("oid", Value::I64(id.0))])?;
        Ok(())
    }
}

/// Reads a server-side large object one chunk at a time
struct ChunkReader<'c> {
    conn: &'c mut dyn Connection,
    id: LobId,
    offset: i64,
    chunk: Cursor<Vec<u8>>,
    done: bool,
}

impl ChunkReader<'_> {
    fn fetch(&mut self) -> Result<()> {
        let value = self.conn.scalar(
            "SELECT lo_get(:oid, :offset, :length)",
            &[
                ("oid", Value::I64(self.id.0)),
                ("offset", Value::I64(self.offset)),
                ("length", Value::I32(LOB_BUFFER_SIZE as i32)),
            ],
        )?;
        let bytes = match value {
            Value::Bytes(bytes) => bytes,
            Value::Null => Vec::new(),
            other => {
                return Err(Fault::InvalidCast {
                    column: "lo_get".into(),
                    from: other.kind(),
                    to: DataType::Blob,
                });
            }
        };
        self.done = bytes.len() < LOB_BUFFER_SIZE;
        self.offset += bytes.len() as i64;
        self.chunk = Cursor::new(bytes);
        Ok(())
    }
}

impl Read for ChunkReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let read = self.chunk.read(buf)?;
            if read > 0 || self.done || buf.is_empty() {
                return Ok(read);
            }
            self.fetch().map_err(io::Error::other)?;
        }
    }
}
