//! Tables created by the DDL generator, read back through introspection

use polydb_core::{Column, ConnectionDescriptor, ForeignKey, Index, Schema, Sequence, Table};
use polydb_dialect::{DdlGenerator, DdlOp};
use polydb_drivers::{Connection, open_sqlite, session};
use polydb_introspect::{ConstraintType, Introspector, Mismatch, reverse};
use polydb_types::{DataType, DialectKind, SemanticType};

fn shop() -> Schema {
    Schema::new("")
        .table(
            Table::new("customers")
                .column(Column::new("id", DataType::BigInt).primary_key())
                .column(Column::new("name", SemanticType::string(80)).not_null())
                .column(Column::new("vip", DataType::Bool))
                .column(Column::new("joined", DataType::DateTime)),
        )
        .table(
            Table::new("orders")
                .column(Column::new("id", DataType::Int).primary_key())
                .column(Column::new("customer_id", DataType::BigInt).not_null())
                .column(Column::new("total", SemanticType::decimal(10, 2)))
                .column(Column::new("status", DataType::ShortInt))
                .column(Column::new("note", DataType::Clob))
                .column(Column::new("receipt", DataType::ByteArray))
                .foreign_key(
                    ForeignKey::new("fk_orders_customer", ["customer_id"], "customers", ["id"])
                        .on_delete("CASCADE"),
                )
                .index(Index::new("ix_orders_status", ["status"])),
        )
        .sequence(Sequence::new("customers_seq"))
        .sequence(Sequence::new("order_numbers").current(1000).increment(10))
}

fn created() -> rusqlite::Connection {
    let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
    let script = DdlGenerator::new(DialectKind::Sqlite)
        .schema(DdlOp::Create, &shop())
        .unwrap();
    session::run_script(&mut conn, &script).unwrap();
    conn
}

#[test]
fn test_introspected_tables_match_generated_model() {
    let mut conn = created();
    let infos = Introspector::new(&mut conn).tables().unwrap();

    let names: Vec<_> = infos.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["customers", "orders"]);
    assert!(reverse::verify(&shop(), &infos).is_empty());
}

#[test]
fn test_columns_reclassify_to_original_types() {
    let mut conn = created();
    let infos = Introspector::new(&mut conn).tables().unwrap();
    let mut schema = reverse::build_schema("", &infos);
    assert_eq!(reverse::attach_foreign_keys(&mut schema, &infos), 1);

    let original = shop();
    for table in &original.tables {
        let rebuilt = schema.find_table(&table.name).unwrap();
        for column in &table.columns {
            let found = rebuilt.find_column(&column.name).unwrap();
            assert_eq!(found.data_type(), column.data_type(), "{}.{}", table.name, column.name);
            assert_eq!(found.not_null, column.not_null, "{}.{}", table.name, column.name);
        }
    }

    let orders = schema.find_table("orders").unwrap();
    assert_eq!(orders.primary_key().map(|c| c.name.as_str()), Some("id"));
    let total = orders.find_column("total").unwrap();
    assert_eq!((total.semantic.size, total.semantic.scale), (10, 2));
    assert_eq!(
        schema.find_table("customers").unwrap().find_column("name").unwrap().semantic.size,
        80
    );

    let fk = &orders.foreign_keys[0];
    assert_eq!(fk.columns, ["customer_id"]);
    assert_eq!(fk.references, "customers");
    assert_eq!(fk.references_columns, ["id"]);
    assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));

    assert_eq!(orders.indexes.len(), 1);
    assert_eq!(orders.indexes[0].columns, ["status"]);
}

#[test]
fn test_rebuilt_schema_generates_runnable_ddl() {
    let mut conn = created();
    let infos = Introspector::new(&mut conn).tables().unwrap();
    let mut schema = reverse::build_schema("", &infos);
    reverse::attach_foreign_keys(&mut schema, &infos);

    let mut copy = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
    let script = DdlGenerator::new(DialectKind::Sqlite)
        .schema(DdlOp::Create, &schema)
        .unwrap();
    session::run_script(&mut copy, &script).unwrap();

    let again = Introspector::new(&mut copy).tables().unwrap();
    assert_eq!(again.len(), infos.len());
    assert!(reverse::verify(&schema, &again).is_empty());
}

#[test]
fn test_foreign_key_metadata_is_reported() {
    let mut conn = created();
    let orders = Introspector::new(&mut conn)
        .table("ORDERS")
        .unwrap()
        .unwrap();
    let fk = orders.foreign_keys().next().unwrap();
    match &fk.kind {
        ConstraintType::ForeignKey { references, .. } => assert_eq!(references, "customers"),
        other => panic!("unexpected constraint {other:?}"),
    }
    assert_eq!(orders.primary_key(), ["id"]);
}

#[test]
fn test_counter_rows_become_sequences() {
    let mut conn = created();
    let infos = Introspector::new(&mut conn).sequences().unwrap();
    let mirrors = reverse::sequences(&infos);

    assert_eq!(mirrors.len(), 2);
    let numbers = mirrors.iter().find(|s| s.name == "order_numbers").unwrap();
    assert_eq!(numbers.current, 1000);
}

#[test]
fn test_no_counter_table_means_no_sequences() {
    let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
    Connection::execute_batch(&mut conn, "CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
    assert!(Introspector::new(&mut conn).sequences().unwrap().is_empty());
}

#[test]
fn test_dropped_column_is_a_mismatch() {
    let mut conn = created();
    Connection::execute_batch(&mut conn, "ALTER TABLE orders DROP COLUMN note").unwrap();
    let infos = Introspector::new(&mut conn).tables().unwrap();
    assert_eq!(
        reverse::verify(&shop(), &infos),
        [Mismatch::MissingColumn {
            table: "orders".into(),
            column: "note".into(),
        }]
    );
}
