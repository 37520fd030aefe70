//! Generated DDL and DML executed against in-memory SQLite
#![cfg(feature = "rusqlite")]

use chrono::NaiveDate;
use polydb_core::{Column, ConnectionDescriptor, ForeignKey, Row, Schema, Sequence, Table, Value};
use polydb_dialect::{DdlGenerator, DdlOp};
use polydb_drivers::{Connection, open_sqlite, session};
use polydb_types::{DataType, DialectKind, SemanticType};
use rust_decimal::Decimal;

// =============================================================================
// Helper Functions
// =============================================================================

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
                .column(Column::new("status", DataType::ShortInt).enumeration())
                .foreign_key(ForeignKey::new(
                    "fk_orders_customer",
                    ["customer_id"],
                    "customers",
                    ["id"],
                ))
                .with_sequence("order_numbers"),
        )
        .sequence(Sequence::new("customers_seq"))
        .sequence(Sequence::new("order_numbers").current(1000).increment(10))
}

fn setup() -> (rusqlite::Connection, Schema) {
    let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
    let schema = shop();
    let script = DdlGenerator::new(DialectKind::Sqlite)
        .schema(DdlOp::Create, &schema)
        .unwrap();
    session::run_script(&mut conn, &script).unwrap();
    (conn, schema)
}

fn joined() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

// =============================================================================
// Inserts
// =============================================================================

#[test]
fn test_insert_draws_keys_from_counter_table() {
    let (mut conn, mut schema) = setup();

    let first = session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("name", "Ada").with("vip", true),
    )
    .unwrap();
    let second = session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("name", "Grace"),
    )
    .unwrap();

    assert_eq!(first, Some(Value::I64(1)));
    assert_eq!(second, Some(Value::I64(2)));
    assert_eq!(schema.find_sequence("customers_seq").unwrap().current, 2);
}

#[test]
fn test_insert_honours_sequence_start_and_increment() {
    let (mut conn, mut schema) = setup();
    session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("name", "Ada"),
    )
    .unwrap();

    let row = Row::new()
        .with("customer_id", 1i64)
        .with("total", Value::Decimal(Decimal::new(1950, 2)));
    let first = session::insert(&mut conn, &mut schema, "orders", &row).unwrap();
    let second = session::insert(&mut conn, &mut schema, "orders", &row).unwrap();

    // Int key: counter values come back narrowed to i32
    assert_eq!(first, Some(Value::I32(1010)));
    assert_eq!(second, Some(Value::I32(1020)));
    assert_eq!(schema.find_sequence("order_numbers").unwrap().current, 1020);
}

#[test]
fn test_supplied_key_skips_the_counter() {
    let (mut conn, mut schema) = setup();
    let key = session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("id", 77i64).with("name", "Lin"),
    )
    .unwrap();
    assert_eq!(key, Some(Value::I64(77)));
    assert_eq!(schema.find_sequence("customers_seq").unwrap().current, 0);
    assert_eq!(
        conn.scalar(
            "SELECT seq FROM db_sequence WHERE name = 'customers_seq'",
            &[]
        )
        .unwrap(),
        Value::I64(0)
    );
}

#[test]
fn test_engine_errors_use_display_names() {
    let (mut conn, mut schema) = setup();
    let err = session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("vip", false),
    )
    .unwrap_err();

    assert!(err.is_engine());
    assert!(
        err.to_string().contains("Customers.Name"),
        "unexpected message: {err}"
    );
    // the failed insert rolled back its counter update
    assert_eq!(
        conn.scalar(
            "SELECT seq FROM db_sequence WHERE name = 'customers_seq'",
            &[]
        )
        .unwrap(),
        Value::I64(0)
    );
}

// =============================================================================
// Reads, updates and deletes
// =============================================================================

#[test]
fn test_load_rows_applies_declared_types() {
    let (mut conn, mut schema) = setup();
    session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new()
            .with("name", "Ada")
            .with("vip", true)
            .with("joined", joined()),
    )
    .unwrap();
    session::insert(
        &mut conn,
        &mut schema,
        "orders",
        &Row::new()
            .with("customer_id", 1i64)
            .with("total", Value::Decimal(Decimal::new(25000, 2)))
            .with(
                "status",
                Value::Enum {
                    name: "Shipped".into(),
                    discriminant: 2,
                },
            ),
    )
    .unwrap();

    let customers = session::load_rows(&mut conn, schema.find_table("customers").unwrap()).unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].get("vip"), Some(&Value::Bool(true)));
    assert_eq!(customers[0].get("joined"), Some(&Value::DateTime(joined())));
    assert_eq!(customers[0].get("name"), Some(&Value::from("Ada")));

    let orders = session::load_rows(&mut conn, schema.find_table("orders").unwrap()).unwrap();
    assert_eq!(orders[0].get("id"), Some(&Value::I32(1010)));
    assert_eq!(orders[0].get("total"), Some(&Value::Decimal(Decimal::new(250, 0))));
    assert_eq!(orders[0].get("status"), Some(&Value::I16(2)));
}

#[test]
fn test_update_and_delete_by_key() {
    let (mut conn, mut schema) = setup();
    let key = session::insert(
        &mut conn,
        &mut schema,
        "customers",
        &Row::new().with("name", "Ada"),
    )
    .unwrap()
    .unwrap();

    let changed = session::update(
        &mut conn,
        &schema,
        "customers",
        &Row::new().with("id", key.clone()).with("name", "Ada L."),
    )
    .unwrap();
    assert_eq!(changed, 1);

    let customers = schema.find_table("customers").unwrap();
    let row = session::load_row(&mut conn, customers, &key).unwrap().unwrap();
    assert_eq!(row.get("name"), Some(&Value::from("Ada L.")));

    assert_eq!(session::delete(&mut conn, &schema, "customers", &key).unwrap(), 1);
    assert!(session::load_row(&mut conn, customers, &key).unwrap().is_none());
}

#[test]
fn test_update_without_key_value_is_configuration_error() {
    let (mut conn, schema) = setup();
    let err = session::update(&mut conn, &schema, "customers", &Row::new().with("name", "x"))
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_next_sequence_value_advances_counter() {
    let (mut conn, mut schema) = setup();
    let sequence = schema.find_sequence_mut("order_numbers").unwrap();
    assert_eq!(session::next_sequence_value(&mut conn, None, sequence).unwrap(), 1010);
    assert_eq!(session::next_sequence_value(&mut conn, None, sequence).unwrap(), 1020);
    assert_eq!(sequence.current, 1020);
}

// =============================================================================
// Best-effort drops
// =============================================================================

#[test]
fn test_dropping_missing_objects_logs_and_continues() {
    let (mut conn, schema) = setup();
    assert_eq!(session::drop_schema(&mut conn, &schema).unwrap(), 0);

    // everything is gone now; a second drop skips every statement
    let skipped = session::drop_schema(&mut conn, &schema).unwrap();
    assert!(skipped > 0);
    assert_eq!(
        conn.scalar(
            "SELECT count(*) FROM sqlite_master WHERE name IN ('customers', 'orders')",
            &[]
        )
        .unwrap(),
        Value::I64(0)
    );
}
