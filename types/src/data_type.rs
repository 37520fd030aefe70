//! Engine-agnostic semantic type model
//!
//! A column's logical type is a [`DataType`] plus an optional size and scale,
//! bundled as [`SemanticType`]. Dialects translate it into native type text;
//! the reverse mapper in [`crate::native`] translates native text back.

/// Logical column type, independent of any engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataType {
    /// Bounded character data
    String,
    /// Unbounded character data
    Clob,
    /// Date and time of day
    DateTime,
    /// Bounded binary data
    ByteArray,
    /// Unbounded binary data stored inline
    Blob,
    /// 64-bit signed integer
    BigInt,
    /// 32-bit signed integer
    Int,
    /// 16-bit signed integer
    ShortInt,
    /// 8-bit integer
    TinyInt,
    /// Single precision floating point
    Float,
    /// Double precision floating point
    Double,
    /// Exact numeric with precision and scale
    Decimal,
    /// Elapsed time
    TimeSpan,
    /// Boolean flag
    Bool,
    /// Identifier of a large object held by the large-object gateway
    LargeObject,
    /// Application object serialized to bytes
    ByteSerializable,
}

impl DataType {
    /// All logical types, in declaration order
    pub const ALL: [DataType; 16] = [
        DataType::String,
        DataType::Clob,
        DataType::DateTime,
        DataType::ByteArray,
        DataType::Blob,
        DataType::BigInt,
        DataType::Int,
        DataType::ShortInt,
        DataType::TinyInt,
        DataType::Float,
        DataType::Double,
        DataType::Decimal,
        DataType::TimeSpan,
        DataType::Bool,
        DataType::LargeObject,
        DataType::ByteSerializable,
    ];

    /// Returns `true` if size and scale carry meaning for this type
    #[inline]
    #[must_use]
    pub const fn is_sized(&self) -> bool {
        matches!(self, DataType::String | DataType::ByteArray | DataType::Decimal)
    }

    /// Returns `true` for the integer types (including large-object identifiers)
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::BigInt
                | DataType::Int
                | DataType::ShortInt
                | DataType::TinyInt
                | DataType::LargeObject
        )
    }

    /// Returns `true` for payloads that go through the large-object gateway
    #[inline]
    #[must_use]
    pub const fn is_large_object(&self) -> bool {
        matches!(self, DataType::Blob | DataType::LargeObject)
    }

    /// Storage family of this type
    #[must_use]
    pub const fn family(&self) -> TypeFamily {
        match self {
            DataType::String | DataType::Clob => TypeFamily::Text,
            DataType::ByteArray | DataType::Blob | DataType::ByteSerializable => {
                TypeFamily::Binary
            }
            DataType::BigInt
            | DataType::Int
            | DataType::ShortInt
            | DataType::TinyInt
            | DataType::LargeObject => TypeFamily::Integer,
            DataType::Float | DataType::Double | DataType::Decimal => TypeFamily::Numeric,
            DataType::DateTime => TypeFamily::Temporal,
            DataType::TimeSpan => TypeFamily::Interval,
            DataType::Bool => TypeFamily::Boolean,
        }
    }

    /// Runtime value kind a column of this type reads back as
    #[must_use]
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            DataType::String | DataType::Clob => ValueKind::Text,
            DataType::DateTime => ValueKind::DateTime,
            DataType::ByteArray | DataType::Blob | DataType::ByteSerializable => ValueKind::Bytes,
            DataType::BigInt | DataType::LargeObject => ValueKind::I64,
            DataType::Int => ValueKind::I32,
            DataType::ShortInt => ValueKind::I16,
            DataType::TinyInt => ValueKind::I8,
            DataType::Float => ValueKind::F32,
            DataType::Double => ValueKind::F64,
            DataType::Decimal => ValueKind::Decimal,
            DataType::TimeSpan => ValueKind::TimeSpan,
            DataType::Bool => ValueKind::Bool,
        }
    }

    /// Name used in diagnostics and serialized schemas
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "String",
            DataType::Clob => "Clob",
            DataType::DateTime => "DateTime",
            DataType::ByteArray => "ByteArray",
            DataType::Blob => "Blob",
            DataType::BigInt => "BigInt",
            DataType::Int => "Int",
            DataType::ShortInt => "ShortInt",
            DataType::TinyInt => "TinyInt",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::Decimal => "Decimal",
            DataType::TimeSpan => "TimeSpan",
            DataType::Bool => "Bool",
            DataType::LargeObject => "LargeObject",
            DataType::ByteSerializable => "ByteSerializable",
        }
    }

    /// Parse the name produced by [`DataType::as_str`] (case-insensitive)
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        DataType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of logical types that share a native storage form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeFamily {
    Text,
    Binary,
    Integer,
    Numeric,
    Temporal,
    Interval,
    Boolean,
}

/// Runtime type tag of a value, native or semantic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Decimal,
    Text,
    Bytes,
    DateTime,
    TimeSpan,
    Enum,
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// Logical type with size and scale
///
/// Size and scale are meaningful only for `String`, `ByteArray` and `Decimal`;
/// zero means "unspecified, use the native default".
///
/// # Examples
///
/// ```
/// use polydb_types::{DataType, SemanticType};
///
/// let price = SemanticType::decimal(10, 2);
/// assert_eq!(price.data_type, DataType::Decimal);
/// assert_eq!((price.size, price.scale), (10, 2));
///
/// // Size is dropped for types that do not carry one
/// assert_eq!(SemanticType::sized(DataType::Int, 10).size, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemanticType {
    pub data_type: DataType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub size: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scale: u32,
}

impl SemanticType {
    /// Unsized semantic type
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            size: 0,
            scale: 0,
        }
    }

    /// Sized semantic type; size is ignored for types without one
    #[must_use]
    pub const fn sized(data_type: DataType, size: u32) -> Self {
        Self::with_scale(data_type, size, 0)
    }

    /// Semantic type with size and scale; both are ignored for unsized types
    #[must_use]
    pub const fn with_scale(data_type: DataType, size: u32, scale: u32) -> Self {
        if data_type.is_sized() {
            Self {
                data_type,
                size,
                scale,
            }
        } else {
            Self::new(data_type)
        }
    }

    /// `String` of the given length
    #[must_use]
    pub const fn string(size: u32) -> Self {
        Self::sized(DataType::String, size)
    }

    /// `Decimal` with precision and scale
    #[must_use]
    pub const fn decimal(precision: u32, scale: u32) -> Self {
        Self::with_scale(DataType::Decimal, precision, scale)
    }
}

impl From<DataType> for SemanticType {
    fn from(data_type: DataType) -> Self {
        SemanticType::new(data_type)
    }
}

impl core::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match (self.size, self.scale) {
            (0, _) => write!(f, "{}", self.data_type),
            (size, 0) => write!(f, "{}({})", self.data_type, size),
            (size, scale) => write!(f, "{}({},{})", self.data_type, size, scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_types() {
        let sized: Vec<_> = DataType::ALL.into_iter().filter(DataType::is_sized).collect();
        assert_eq!(
            sized,
            vec![DataType::String, DataType::ByteArray, DataType::Decimal]
        );
    }

    #[test]
    fn test_unsized_type_drops_size() {
        let t = SemanticType::with_scale(DataType::Double, 10, 2);
        assert_eq!((t.size, t.scale), (0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(SemanticType::decimal(10, 2).to_string(), "Decimal(10,2)");
        assert_eq!(SemanticType::string(40).to_string(), "String(40)");
        assert_eq!(SemanticType::new(DataType::Bool).to_string(), "Bool");
    }

    #[test]
    fn test_parse_names() {
        for t in DataType::ALL {
            assert_eq!(DataType::parse(t.as_str()), Some(t));
        }
        assert_eq!(DataType::parse("bigint"), Some(DataType::BigInt));
        assert_eq!(DataType::parse("uuid"), None);
    }

    #[test]
    fn test_value_kinds_follow_width() {
        assert_eq!(DataType::TinyInt.value_kind(), ValueKind::I8);
        assert_eq!(DataType::LargeObject.value_kind(), ValueKind::I64);
        assert_eq!(DataType::Clob.value_kind(), ValueKind::Text);
        assert_eq!(DataType::ByteSerializable.value_kind(), ValueKind::Bytes);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let t = SemanticType::decimal(12, 4);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<SemanticType>(&json).unwrap(), t);
    }
}
