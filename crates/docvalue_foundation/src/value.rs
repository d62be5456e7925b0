//! Core value type for document data.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cell::{BinData, RegexCell, StrCell};
use crate::decimal::Decimal128;
use crate::document::{Array, CodeWithScope, DbRef, Document};
use crate::error::Result;
use crate::scalar::{Date, ObjectId, Timestamp};
use crate::types::TypeTag;

/// Immutable document value.
///
/// Values are cheap to clone: scalars and short strings are copied inline,
/// everything else is shared behind an atomic reference count. Nothing is
/// mutated after construction, so values can be read from many threads.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Containers drop it instead of storing a slot.
    #[default]
    Missing,
    /// Sorts below everything.
    MinKey,
    /// Sorts above everything.
    MaxKey,
    /// Null.
    Null,
    /// Legacy undefined.
    Undefined,
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// Binary floating point.
    Double(f64),
    /// 128-bit decimal.
    Decimal(Arc<Decimal128>),
    /// Boolean.
    Bool(bool),
    /// UTC date.
    Date(Date),
    /// Object identifier.
    ObjectId(ObjectId),
    /// Replication timestamp.
    Timestamp(Timestamp),
    /// UTF-8 string.
    String(StrCell),
    /// Nested document.
    Document(Document),
    /// Array.
    Array(Array),
    /// Binary blob.
    BinData(BinData),
    /// Regular expression.
    Regex(RegexCell),
    /// Legacy symbol.
    Symbol(StrCell),
    /// JavaScript code.
    Code(StrCell),
    /// Legacy code with scope.
    CodeWithScope(Arc<CodeWithScope>),
    /// Legacy database pointer.
    DbRef(Arc<DbRef>),
}

impl Value {
    /// Builds an array value.
    ///
    /// # Errors
    ///
    /// Fails with a depth error if the array would nest too deeply.
    pub fn array(values: Vec<Value>) -> Result<Self> {
        Array::new(values).map(Self::Array)
    }

    /// Builds a symbol.
    #[must_use]
    pub fn symbol(text: &str) -> Self {
        Self::Symbol(StrCell::new(text))
    }

    /// Builds a code value.
    #[must_use]
    pub fn code(text: &str) -> Self {
        Self::Code(StrCell::new(text))
    }

    /// Builds a binary value.
    #[must_use]
    pub fn binary(subtype: u8, bytes: &[u8]) -> Self {
        Self::BinData(BinData::new(subtype, bytes))
    }

    /// Builds a regular expression.
    ///
    /// # Errors
    ///
    /// Fails if the pattern or flags contain NUL.
    pub fn regex(pattern: &str, flags: &str) -> Result<Self> {
        RegexCell::new(pattern, flags).map(Self::Regex)
    }

    /// Builds a code-with-scope value.
    ///
    /// # Errors
    ///
    /// Fails if the scope is already at the depth limit.
    pub fn code_with_scope(code: &str, scope: Document) -> Result<Self> {
        CodeWithScope::new(code, scope).map(|cws| Self::CodeWithScope(Arc::new(cws)))
    }

    /// Builds a database pointer.
    ///
    /// # Errors
    ///
    /// Fails if the namespace contains NUL.
    pub fn db_ref(ns: &str, oid: ObjectId) -> Result<Self> {
        DbRef::new(ns, oid).map(|dbref| Self::DbRef(Arc::new(dbref)))
    }

    /// Returns an `Int` when the value fits in 32 bits, otherwise a `Long`.
    #[must_use]
    pub fn create_int_or_long(value: i64) -> Self {
        i32::try_from(value).map_or(Self::Long(value), Self::Int)
    }

    /// Returns the type tag.
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        match self {
            Self::Missing => TypeTag::Missing,
            Self::MinKey => TypeTag::MinKey,
            Self::MaxKey => TypeTag::MaxKey,
            Self::Null => TypeTag::Null,
            Self::Undefined => TypeTag::Undefined,
            Self::Int(_) => TypeTag::Int,
            Self::Long(_) => TypeTag::Long,
            Self::Double(_) => TypeTag::Double,
            Self::Decimal(_) => TypeTag::Decimal,
            Self::Bool(_) => TypeTag::Bool,
            Self::Date(_) => TypeTag::Date,
            Self::ObjectId(_) => TypeTag::ObjectId,
            Self::Timestamp(_) => TypeTag::Timestamp,
            Self::String(_) => TypeTag::String,
            Self::Document(_) => TypeTag::Document,
            Self::Array(_) => TypeTag::Array,
            Self::BinData(_) => TypeTag::BinData,
            Self::Regex(_) => TypeTag::Regex,
            Self::Symbol(_) => TypeTag::Symbol,
            Self::Code(_) => TypeTag::Code,
            Self::CodeWithScope(_) => TypeTag::CodeWithScope,
            Self::DbRef(_) => TypeTag::DbRef,
        }
    }

    /// Returns true for the missing value.
    #[must_use]
    pub const fn missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns true for missing, null, and undefined.
    #[must_use]
    pub const fn nullish(&self) -> bool {
        matches!(self, Self::Missing | Self::Null | Self::Undefined)
    }

    /// Returns true for the four numeric kinds.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.type_tag().is_numeric()
    }

    /// Attempts to extract a 32-bit integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a 64-bit integer.
    #[must_use]
    pub const fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a double.
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a decimal.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal128> {
        match self {
            Self::Decimal(d) => Some(**d),
            _ => None,
        }
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract a date.
    #[must_use]
    pub const fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Attempts to extract an object id.
    #[must_use]
    pub const fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Self::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    /// Attempts to extract a timestamp.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Attempts to extract string text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to extract symbol text.
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to extract code text.
    #[must_use]
    pub fn as_code(&self) -> Option<&str> {
        match self {
            Self::Code(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to extract a document.
    #[must_use]
    pub const fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(d) => Some(d),
            _ => None,
        }
    }

    /// Attempts to extract an array.
    #[must_use]
    pub const fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Attempts to extract binary data.
    #[must_use]
    pub const fn as_binary(&self) -> Option<&BinData> {
        match self {
            Self::BinData(b) => Some(b),
            _ => None,
        }
    }

    /// Attempts to extract a regular expression.
    #[must_use]
    pub const fn as_regex(&self) -> Option<&RegexCell> {
        match self {
            Self::Regex(re) => Some(re),
            _ => None,
        }
    }

    /// Attempts to extract code with scope.
    #[must_use]
    pub fn as_code_with_scope(&self) -> Option<&CodeWithScope> {
        match self {
            Self::CodeWithScope(cws) => Some(&**cws),
            _ => None,
        }
    }

    /// Attempts to extract a database pointer.
    #[must_use]
    pub fn as_db_ref(&self) -> Option<&DbRef> {
        match self {
            Self::DbRef(dbref) => Some(&**dbref),
            _ => None,
        }
    }

    /// Widens any numeric to `f64`. Longs beyond 2^53 and decimals round.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_double(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(f64::from(*n)),
            Self::Long(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            Self::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Widens any numeric to a decimal. Integers convert exactly, doubles
    /// keep 34 significant digits.
    #[must_use]
    pub fn get_decimal(&self) -> Option<Decimal128> {
        match self {
            Self::Int(n) => Some(Decimal128::from_i32(*n)),
            Self::Long(n) => Some(Decimal128::from_i64(*n)),
            Self::Double(n) => Some(Decimal128::from_f64_digits(*n, 34)),
            Self::Decimal(d) => Some(**d),
            _ => None,
        }
    }

    /// Returns the array element at `index`, or `Missing`.
    #[must_use]
    pub fn index(&self, index: usize) -> Value {
        match self {
            Self::Array(a) => a.get(index).cloned().unwrap_or_default(),
            _ => Self::Missing,
        }
    }

    /// Returns the document field `name`, or `Missing`.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        match self {
            Self::Document(d) => d.get(name).cloned().unwrap_or_default(),
            _ => Self::Missing,
        }
    }

    /// Nesting depth: zero for scalars, one more than the deepest child for
    /// containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Document(d) => d.depth(),
            Self::Array(a) => a.depth(),
            Self::CodeWithScope(cws) => cws.depth(),
            _ => 0,
        }
    }

    /// Approximate memory held by this value, including the handle itself.
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.heap_size()
    }

    /// Heap bytes reachable from this handle.
    #[must_use]
    pub fn heap_size(&self) -> usize {
        match self {
            Self::String(s) | Self::Symbol(s) | Self::Code(s) => s.cell().heap_size(),
            Self::BinData(b) => b.cell().heap_size(),
            Self::Regex(re) => re.cell().heap_size(),
            Self::Decimal(_) => std::mem::size_of::<Decimal128>(),
            Self::Document(d) => d.approximate_size(),
            Self::Array(a) => a.approximate_size(),
            Self::CodeWithScope(cws) => cws.approximate_size(),
            Self::DbRef(dbref) => dbref.approximate_size(),
            Self::Missing
            | Self::MinKey
            | Self::MaxKey
            | Self::Null
            | Self::Undefined
            | Self::Int(_)
            | Self::Long(_)
            | Self::Double(_)
            | Self::Bool(_)
            | Self::Date(_)
            | Self::ObjectId(_)
            | Self::Timestamp(_) => 0,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "MISSING"),
            Self::MinKey => write!(f, "MinKey"),
            Self::MaxKey => write!(f, "MaxKey"),
            Self::Null => write!(f, "null"),
            Self::Undefined => write!(f, "undefined"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d:?}"),
            Self::ObjectId(oid) => write!(f, "{oid}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::String(s) => write!(f, "\"{}\"", s.as_str()),
            Self::Document(d) => write!(f, "{d:?}"),
            Self::Array(a) => write!(f, "{a:?}"),
            Self::BinData(b) => write!(f, "{b:?}"),
            Self::Regex(re) => write!(f, "{re:?}"),
            Self::Symbol(s) => write!(f, "Symbol(\"{}\")", s.as_str()),
            Self::Code(s) => write!(f, "Code(\"{}\")", s.as_str()),
            Self::CodeWithScope(cws) => write!(f, "{cws:?}"),
            Self::DbRef(dbref) => write!(f, "{dbref:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<Decimal128> for Value {
    fn from(d: Decimal128) -> Self {
        Self::Decimal(Arc::new(d))
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Date(dt.into())
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Self::ObjectId(oid)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(StrCell::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(StrCell::new(&s))
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Self::Document(d)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}
