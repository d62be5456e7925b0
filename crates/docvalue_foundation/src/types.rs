//! Type tags and their canonical ordering classes.

use std::fmt;

/// Closed set of value kinds.
///
/// Discriminants are the BSON element type codes, so a tag converts to the
/// signed byte written by the spill codec without a lookup table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum TypeTag {
    /// Sorts below every other value.
    MinKey = -1,
    /// Absent value; never materialized inside composites.
    Missing = 0,
    /// Binary floating point.
    Double = 1,
    /// UTF-8 string.
    String = 2,
    /// Nested document.
    Document = 3,
    /// Array of values.
    Array = 4,
    /// Binary blob with a subtype byte.
    BinData = 5,
    /// Legacy undefined.
    Undefined = 6,
    /// 12-byte object identifier.
    ObjectId = 7,
    /// Boolean.
    Bool = 8,
    /// UTC date in milliseconds.
    Date = 9,
    /// Null.
    Null = 10,
    /// Regular expression.
    Regex = 11,
    /// Legacy database pointer.
    DbRef = 12,
    /// JavaScript code.
    Code = 13,
    /// Legacy symbol.
    Symbol = 14,
    /// Legacy JavaScript code with scope.
    CodeWithScope = 15,
    /// 32-bit integer.
    Int = 16,
    /// Internal replication timestamp.
    Timestamp = 17,
    /// 64-bit integer.
    Long = 18,
    /// 128-bit decimal.
    Decimal = 19,
    /// Sorts above every other value.
    MaxKey = 127,
}

impl TypeTag {
    /// Every tag, in BSON code order.
    pub const ALL: [TypeTag; 22] = [
        Self::MinKey,
        Self::Missing,
        Self::Double,
        Self::String,
        Self::Document,
        Self::Array,
        Self::BinData,
        Self::Undefined,
        Self::ObjectId,
        Self::Bool,
        Self::Date,
        Self::Null,
        Self::Regex,
        Self::DbRef,
        Self::Code,
        Self::Symbol,
        Self::CodeWithScope,
        Self::Int,
        Self::Timestamp,
        Self::Long,
        Self::Decimal,
        Self::MaxKey,
    ];

    /// Returns the BSON type code.
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Looks up a tag by its BSON type code.
    #[must_use]
    pub fn from_code(code: i8) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.code() == code)
    }

    /// Returns true for the four numeric kinds.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Double | Self::Decimal)
    }

    /// Returns the ordering class used for cross-type comparison.
    ///
    /// All numeric tags share one class, as do strings and symbols, and
    /// missing and undefined. The relative order of classes is the BSON
    /// canonical type order.
    #[must_use]
    pub const fn canonical_order(self) -> i8 {
        match self {
            Self::MinKey => -1,
            Self::Missing | Self::Undefined => 0,
            Self::Null => 5,
            Self::Int | Self::Long | Self::Double | Self::Decimal => 10,
            Self::String | Self::Symbol => 15,
            Self::Document => 20,
            Self::Array => 25,
            Self::BinData => 30,
            Self::ObjectId => 35,
            Self::Bool => 40,
            Self::Date => 45,
            Self::Timestamp => 47,
            Self::Regex => 50,
            Self::DbRef => 55,
            Self::Code => 60,
            Self::CodeWithScope => 65,
            Self::MaxKey => 127,
        }
    }

    /// Returns the type able to hold both numeric operands without loss,
    /// or `None` if either operand is not numeric.
    #[must_use]
    pub const fn widest_numeric(left: Self, right: Self) -> Option<Self> {
        match (left, right) {
            (Self::Decimal, r) if r.is_numeric() => Some(Self::Decimal),
            (l, Self::Decimal) if l.is_numeric() => Some(Self::Decimal),
            (Self::Double, r) if r.is_numeric() => Some(Self::Double),
            (l, Self::Double) if l.is_numeric() => Some(Self::Double),
            (Self::Long, Self::Int | Self::Long) | (Self::Int, Self::Long) => Some(Self::Long),
            (Self::Int, Self::Int) => Some(Self::Int),
            _ => None,
        }
    }

    /// Returns the type's name as used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MinKey => "minKey",
            Self::Missing => "missing",
            Self::Double => "double",
            Self::String => "string",
            Self::Document => "object",
            Self::Array => "array",
            Self::BinData => "binData",
            Self::Undefined => "undefined",
            Self::ObjectId => "objectId",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Null => "null",
            Self::Regex => "regex",
            Self::DbRef => "dbPointer",
            Self::Code => "javascript",
            Self::Symbol => "symbol",
            Self::CodeWithScope => "javascriptWithScope",
            Self::Int => "int",
            Self::Timestamp => "timestamp",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::MaxKey => "maxKey",
        }
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
