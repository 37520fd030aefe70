//! Reverse mapping of native column type text into the semantic type model
//!
//! The classifier is dialect-agnostic: the same table is applied whether the
//! text came from `information_schema.columns`, Oracle's `all_tab_cols` or
//! SQLite's `PRAGMA table_info`. It is total: unrecognized text is a `String`.

use crate::{DataType, SemanticType};

/// Column description as reported by an engine's metadata views
///
/// # Examples
///
/// ```
/// use polydb_types::{ColumnInfo, DataType};
///
/// let info = ColumnInfo::new("price", "NUMERIC(10,2)");
/// let t = info.semantic_type();
/// assert_eq!((t.data_type, t.size, t.scale), (DataType::Decimal, 10, 2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnInfo {
    pub name: String,
    /// Native type text, e.g. `character varying` or `NUMBER`
    pub native_type: String,
    /// Numeric precision reported by the engine, if any
    pub precision: Option<u32>,
    /// Numeric scale reported by the engine, if any
    pub scale: Option<u32>,
    /// Character/byte length reported by the engine; `-1` means unbounded
    pub length: Option<i64>,
    pub not_null: bool,
    /// Default expression text exactly as the engine reports it
    pub default_text: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            ..Default::default()
        }
    }

    /// Set metadata length
    #[must_use]
    pub fn length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    /// Set metadata precision and scale
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Mark the column NOT NULL
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set the reported default expression
    #[must_use]
    pub fn default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = Some(text.into());
        self
    }

    /// Classify the native type into `(type, size, scale)`
    #[must_use]
    pub fn semantic_type(&self) -> SemanticType {
        parse_native_type(&self.native_type, self.length, self.precision, self.scale)
    }
}

/// Native type name split from its parenthesized arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTypeText {
    /// Uppercased name with the `(...)` suffix removed
    pub name: String,
    /// First argument (length or precision), 0 when absent or unparseable
    pub size: u32,
    /// Second argument (scale), 0 when absent or unparseable
    pub scale: u32,
    /// First argument was `MAX` or `-1`
    pub unbounded: bool,
    /// A parenthesized suffix was present
    pub has_arguments: bool,
}

impl NativeTypeText {
    /// Split `VARCHAR(40)` into `VARCHAR` and its arguments
    ///
    /// Text following the closing parenthesis is kept, so
    /// `timestamp(6) with time zone` becomes `TIMESTAMP WITH TIME ZONE`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let upper = text.trim().to_ascii_uppercase();
        let (Some(open), Some(close)) = (upper.find('('), upper.rfind(')')) else {
            return Self {
                name: collapse_spaces(&upper),
                size: 0,
                scale: 0,
                unbounded: false,
                has_arguments: false,
            };
        };
        if close < open {
            return Self {
                name: collapse_spaces(&upper),
                size: 0,
                scale: 0,
                unbounded: false,
                has_arguments: false,
            };
        }

        let name = format!("{} {}", &upper[..open], &upper[close + 1..]);
        let mut args = upper[open + 1..close].split(',').map(str::trim);
        let first = args.next().unwrap_or_default();
        let second = args.next().unwrap_or_default();

        Self {
            name: collapse_spaces(&name),
            size: parse_number(first),
            scale: parse_number(second),
            unbounded: first == "MAX" || first == "-1",
            has_arguments: true,
        }
    }
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading integer of `text`; anything unparseable (including empty) is 0
fn parse_number(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

const BINARY_NAMES: &[&str] = &[
    "BLOB",
    "LONGBLOB",
    "MEDIUMBLOB",
    "RAW",
    "LONG RAW",
    "VARBINARY",
    "BINARY",
    "BYTEA",
    "IMAGE",
];

const CLOB_NAMES: &[&str] = &["CLOB", "NCLOB", "TEXT", "NTEXT", "LONGTEXT", "MEDIUMTEXT"];

/// Classify native type text into a semantic type
///
/// `length`, `precision` and `scale` are the values reported by engine
/// metadata. When neither a length nor a precision was reported, the
/// parenthesized suffix of `text` is used instead.
///
/// # Examples
///
/// ```
/// use polydb_types::{DataType, parse_native_type};
///
/// let t = parse_native_type("VARCHAR(40)", None, None, None);
/// assert_eq!((t.data_type, t.size), (DataType::String, 40));
///
/// // Metadata wins over the textual suffix
/// let t = parse_native_type("NUMBER", None, Some(10), Some(0));
/// assert_eq!(t.data_type, DataType::Int);
///
/// // Unknown text is a string
/// assert_eq!(parse_native_type("GEOGRAPHY", None, None, None).data_type, DataType::String);
/// ```
#[must_use]
pub fn parse_native_type(
    text: &str,
    length: Option<i64>,
    precision: Option<u32>,
    scale: Option<u32>,
) -> SemanticType {
    let parsed = NativeTypeText::parse(text);

    let supplied = length.is_some_and(|l| l != 0) || precision.is_some_and(|p| p != 0);
    let (length, precision, scale, unbounded, explicit_precision) = if supplied {
        let unbounded = length == Some(-1) || parsed.unbounded;
        let len = length.filter(|l| *l > 0).map_or(0, |l| l as u32);
        let prec = precision.unwrap_or(0);
        (len, prec, scale.unwrap_or(0), unbounded, precision.is_some_and(|p| p != 0))
    } else {
        (
            parsed.size,
            parsed.size,
            scale.filter(|s| *s != 0).unwrap_or(parsed.scale),
            parsed.unbounded || length == Some(-1),
            parsed.has_arguments && parsed.size != 0,
        )
    };

    let name = parsed.name.as_str();
    let is = |candidates: &[&str]| candidates.contains(&name);

    if is(BINARY_NAMES) {
        return SemanticType::sized(DataType::ByteArray, if unbounded { 0 } else { length });
    }
    if is(CLOB_NAMES) || (unbounded && name.contains("CHAR")) {
        return SemanticType::new(DataType::Clob);
    }
    if name.contains("INTERVAL") {
        return SemanticType::new(DataType::TimeSpan);
    }
    if name.contains("DATE") || name.contains("TIMESTAMP") {
        return SemanticType::new(DataType::DateTime);
    }
    if name.contains("TIME") {
        return SemanticType::new(DataType::TimeSpan);
    }
    if name == "NUMBER" && explicit_precision && scale == 0 {
        return SemanticType::new(match precision {
            1 => DataType::Bool,
            2..=3 => DataType::TinyInt,
            4..=5 => DataType::ShortInt,
            6..=10 => DataType::Int,
            11..=19 => DataType::BigInt,
            _ => return SemanticType::decimal(precision, 0),
        });
    }
    if is(&["NUMBER", "DECIMAL", "NUMERIC", "MONEY", "SMALLMONEY"]) {
        return SemanticType::decimal(precision, scale);
    }
    if is(&["REAL", "FLOAT4", "BINARY_FLOAT"]) {
        return SemanticType::new(DataType::Float);
    }
    if name.contains("DOUBLE") || name.contains("FLOAT") {
        return SemanticType::new(DataType::Double);
    }
    if is(&["BIGINT", "INT8", "BIGSERIAL"]) {
        return SemanticType::new(DataType::BigInt);
    }
    if is(&["SMALLINT", "INT2", "SMALLSERIAL"]) {
        return SemanticType::new(DataType::ShortInt);
    }
    if is(&["TINYINT"]) {
        return SemanticType::new(DataType::TinyInt);
    }
    if is(&["INT", "INTEGER", "INT4", "MEDIUMINT", "SERIAL"]) {
        return SemanticType::new(DataType::Int);
    }
    if is(&["BIT", "BOOL", "BOOLEAN"]) {
        return SemanticType::new(DataType::Bool);
    }
    if is(&["OID", "LO"]) {
        return SemanticType::new(DataType::LargeObject);
    }

    SemanticType::string(length)
}
