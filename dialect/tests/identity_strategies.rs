//! Identity acquisition for inserted rows

use polydb_core::{Column, Row, Sequence, Table};
use polydb_dialect::{
    DdlGenerator, DdlOp, DialectTableExt, DmlGenerator, IdentityStrategy, TableOptions, Values,
};
use polydb_types::{DataType, DialectKind, SemanticType};

fn people() -> Table {
    Table::new("people")
        .column(Column::new("id", DataType::BigInt).primary_key())
        .column(Column::new("name", SemanticType::string(40)))
}

#[test]
fn test_counter_update_immediately_precedes_insert() {
    let plan = DmlGenerator::new(DialectKind::Sqlite)
        .insert(&people(), Values::Parameters)
        .unwrap();

    assert_eq!(plan.strategy, Some(IdentityStrategy::SideTableCounter));
    assert_eq!(
        plan.to_sql(),
        "UPDATE db_sequence SET seq = seq + 1 WHERE name = 'people_seq';\n\
         INSERT INTO people (id, name) VALUES ((SELECT seq FROM db_sequence WHERE name = 'people_seq'), @name);\n\
         SELECT seq FROM db_sequence WHERE name = 'people_seq'"
    );
    assert_eq!(plan.key_column.as_deref(), Some("id"));
}

#[test]
fn test_exactly_one_strategy_per_dialect() {
    for kind in DialectKind::ALL {
        let plan = DmlGenerator::new(kind)
            .insert(&people(), Values::Parameters)
            .unwrap();
        let strategy = kind.table().identity;
        assert_eq!(plan.strategy, Some(strategy), "{kind}");

        let sql = plan.to_sql();
        let inline = sql.contains("NEXTVAL") || sql.contains("nextval(") || plan.statement.contains("NEXT VALUE FOR");
        let pre_post = sql.contains("DECLARE ");
        let counter = sql.contains("db_sequence");

        match strategy {
            IdentityStrategy::InlineSequence => {
                assert!(inline && !pre_post && !counter, "{kind}: {sql}");
                assert!(plan.pre.is_empty(), "{kind}");
            }
            IdentityStrategy::PrePostStatement => {
                assert!(pre_post && !inline && !counter, "{kind}: {sql}");
                assert!(plan.post.is_some(), "{kind}");
            }
            IdentityStrategy::SideTableCounter => {
                assert!(counter && !inline && !pre_post, "{kind}: {sql}");
            }
        }
    }
}

#[test]
fn test_key_column_order_is_stable() {
    for kind in DialectKind::ALL {
        let dml = DmlGenerator::new(kind);
        let first = dml.insert(&people(), Values::Parameters).unwrap();
        let second = dml.insert(&people(), Values::Parameters).unwrap();
        assert_eq!(first, second);
        assert!(first.statement.contains("(id, name)"), "{kind}");
    }
}

#[test]
fn test_sqlite_counter_plan_executes() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let table = people();
    let sequence = Sequence::new("people_seq").current(100);

    let ddl = DdlGenerator::new(DialectKind::Sqlite);
    let mut script = ddl.table(DdlOp::Create, &table, TableOptions::ALL).unwrap();
    script.append(ddl.sequence(DdlOp::Create, &sequence).unwrap());
    for statement in script {
        conn.execute_batch(&statement).unwrap();
    }

    let dml = DmlGenerator::new(DialectKind::Sqlite).sequences(std::slice::from_ref(&sequence));
    let plan = dml.insert(&table, Values::Parameters).unwrap();

    let mut keys = Vec::new();
    for name in ["Ada", "Grace"] {
        for pre in &plan.pre {
            conn.execute(pre, []).unwrap();
        }
        conn.execute(&plan.statement, rusqlite::named_params! { "@name": name })
            .unwrap();
        let key: i64 = conn
            .query_row(plan.post.as_deref().unwrap(), [], |row| row.get(0))
            .unwrap();
        keys.push(key);
    }
    assert_eq!(keys, [101, 102]);

    let stored: String = conn
        .query_row("SELECT name FROM people WHERE id = 102", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, "Grace");
}

#[test]
fn test_literal_rows_inline_values() {
    let row = Row::new().with("name", "Lin");
    let plan = DmlGenerator::new(DialectKind::MsSql)
        .insert(&people(), Values::Literals(&row))
        .unwrap();
    assert_eq!(plan.statement, "INSERT INTO people (id, name) VALUES (@id, N'Lin')");
    assert!(plan.parameters.is_empty());
}
