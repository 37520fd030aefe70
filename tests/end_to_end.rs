//! Whole-stack tests through the facade prelude
//!
//! A schema model is created in SQLite, written to, read back, stored as a
//! large object, then introspected and compared with the model.

use std::io::{Cursor, Read};

use polydb::prelude::*;

fn ledger() -> Schema {
    Schema::new("")
        .table(
            Table::new("accounts")
                .column(Column::new("id", DataType::BigInt).primary_key())
                .column(Column::new("owner", SemanticType::string(60)).not_null())
                .column(Column::new("balance", SemanticType::decimal(12, 2)))
                .column(Column::new("statement", DataType::LargeObject)),
        )
        .table(
            Table::new("entries")
                .column(Column::new("id", DataType::Int).primary_key())
                .column(Column::new("account_id", DataType::BigInt).not_null())
                .column(Column::new("amount", SemanticType::decimal(12, 2)).not_null())
                .foreign_key(ForeignKey::new(
                    "fk_entries_account",
                    ["account_id"],
                    "accounts",
                    ["id"],
                ))
                .with_sequence("entry_numbers"),
        )
        .sequence(Sequence::new("accounts_seq"))
        .sequence(Sequence::new("entry_numbers").current(500).increment(5))
}

fn created() -> (rusqlite::Connection, Schema) {
    let schema = ledger();
    let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
    let script = DdlGenerator::new(DialectKind::Sqlite)
        .schema(DdlOp::Create, &schema)
        .unwrap();
    session::run_script(&mut conn, &script).unwrap();
    (conn, schema)
}

#[test]
fn test_insert_issues_keys_from_counters() {
    let (mut conn, mut schema) = created();

    let account = session::insert(
        &mut conn,
        &mut schema,
        "accounts",
        &Row::new().with("owner", "Grace").with("balance", 10.5f64),
    )
    .unwrap()
    .unwrap();
    assert_eq!(account, Value::I64(1));

    let entry = session::insert(
        &mut conn,
        &mut schema,
        "entries",
        &Row::new().with("account_id", 1i64).with("amount", 4.25f64),
    )
    .unwrap();
    assert_eq!(entry, Some(Value::I32(505)));
    assert_eq!(schema.find_sequence("entry_numbers").unwrap().current, 505);
}

#[test]
fn test_large_object_ids_live_in_columns() {
    let (mut conn, mut schema) = created();
    let store = lob_store(&conn);
    store.install(&mut conn).unwrap();

    let payload = b"statement for march".repeat(5000);
    let id = store
        .create(&mut conn, &mut Cursor::new(payload.clone()))
        .unwrap();

    session::insert(
        &mut conn,
        &mut schema,
        "accounts",
        &Row::new()
            .with("owner", "Linus")
            .with("statement", id.0),
    )
    .unwrap();

    let table = schema.find_table("accounts").unwrap().clone();
    let rows = session::load_rows(&mut conn, &table).unwrap();
    let stored = rows[0].get("statement").and_then(Value::as_i64).unwrap();

    let mut read = Vec::new();
    store
        .open(&mut conn, polydb::lob::LobId(stored))
        .unwrap()
        .read_to_end(&mut read)
        .unwrap();
    assert_eq!(read, payload);
}

#[test]
fn test_introspection_matches_the_model() {
    let (mut conn, schema) = created();
    let infos = Introspector::new(&mut conn).tables().unwrap();
    assert!(reverse::verify(&schema, &infos).is_empty());

    let mut rebuilt = reverse::build_schema("", &infos);
    assert_eq!(reverse::attach_foreign_keys(&mut rebuilt, &infos), 1);
    assert_eq!(rebuilt.find_table("entries").unwrap().foreign_keys[0].references, "accounts");
}

#[test]
fn test_constraint_errors_use_display_names() {
    let (mut conn, mut schema) = created();
    let err = session::insert(
        &mut conn,
        &mut schema,
        "entries",
        &Row::new().with("account_id", 1i64),
    )
    .unwrap_err();

    assert!(err.is_engine());
    assert!(err.to_string().contains("Entries.Amount"), "{err}");
    assert_eq!(schema.find_sequence("entry_numbers").unwrap().current, 500);
}

#[test]
fn test_dropping_twice_is_best_effort() {
    let (mut conn, schema) = created();
    assert_eq!(session::drop_schema(&mut conn, &schema).unwrap(), 0);
    assert!(session::drop_schema(&mut conn, &schema).unwrap() > 0);
}
