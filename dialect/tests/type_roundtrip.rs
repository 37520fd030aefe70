//! Native type text formatted by each dialect parses back to the same family

use polydb_dialect::DialectTableExt;
use polydb_types::{DataType, DialectKind, SemanticType, parse_native_type};

fn representative(data_type: DataType) -> SemanticType {
    match data_type {
        DataType::String => SemanticType::string(40),
        DataType::ByteArray => SemanticType::sized(DataType::ByteArray, 16),
        DataType::Decimal => SemanticType::decimal(10, 2),
        other => SemanticType::new(other),
    }
}

#[test]
fn test_every_type_keeps_its_family() {
    for kind in DialectKind::ALL {
        let dialect = kind.table();
        for data_type in DataType::ALL {
            let semantic = representative(data_type);
            let text = dialect.format_type(semantic).unwrap();
            let parsed = parse_native_type(&text, None, None, None);
            assert_eq!(
                parsed.data_type.family(),
                data_type.family(),
                "{kind}: {data_type} -> {text} -> {}",
                parsed.data_type
            );
        }
    }
}

#[test]
fn test_decimal_roundtrips_exactly() {
    let text = DialectKind::Generic
        .table()
        .format_type(SemanticType::decimal(10, 2))
        .unwrap();
    assert_eq!(text, "DECIMAL(10,2)");
    assert_eq!(
        parse_native_type(&text, None, None, None),
        SemanticType::decimal(10, 2)
    );
}

#[test]
fn test_sized_strings_roundtrip_exactly() {
    for kind in DialectKind::ALL {
        let text = kind.table().format_type(SemanticType::string(40)).unwrap();
        assert_eq!(
            parse_native_type(&text, None, None, None),
            SemanticType::string(40),
            "{kind}: {text}"
        );
    }
}

#[test]
fn test_known_collapses() {
    let mssql = DialectKind::MsSql.table();
    let text = mssql.format_type(SemanticType::string(0)).unwrap();
    assert_eq!(text, "NVARCHAR(MAX)");
    assert_eq!(
        parse_native_type(&text, None, None, None).data_type,
        DataType::Clob
    );

    let pg = DialectKind::PostgreSql.table();
    let text = pg.format_type(DataType::TinyInt.into()).unwrap();
    assert_eq!(
        parse_native_type(&text, None, None, None).data_type,
        DataType::ShortInt
    );

    let oracle = DialectKind::Oracle.table();
    let text = oracle.format_type(DataType::Bool.into()).unwrap();
    assert_eq!(text, "NUMBER(1)");
    assert_eq!(
        parse_native_type(&text, None, None, None).data_type,
        DataType::Bool
    );
}
