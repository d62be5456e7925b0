//! Total ordering of values, consistent with BSON element ordering.
//!
//! Values first order by canonical class (see [`TypeTag::canonical_order`]),
//! so numbers of every width interleave by magnitude and strings sort next to
//! symbols. Within a class each kind has its own payload rule.
//!
//! [`TypeTag::canonical_order`]: crate::types::TypeTag::canonical_order

use std::cmp::Ordering;
use std::fmt;

use crate::collator::StringComparator;
use crate::decimal::Decimal128;
use crate::document::Document;
use crate::value::Value;

/// 2^63 as a double; the first double above every `i64`.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

impl Value {
    /// Three-way comparison.
    ///
    /// When `collator` is given it orders strings and symbols; everything
    /// else (including field names and code) compares bytewise.
    #[must_use]
    pub fn compare(&self, other: &Value, collator: Option<&dyn StringComparator>) -> Ordering {
        let left_tag = self.type_tag();
        let right_tag = other.type_tag();
        if left_tag != right_tag {
            match left_tag.canonical_order().cmp(&right_tag.canonical_order()) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }

        match (self, other) {
            (
                Self::Missing | Self::Undefined | Self::Null | Self::MinKey | Self::MaxKey,
                _,
            ) => Ordering::Equal,
            _ if left_tag.is_numeric() => compare_numbers(self, other),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::ObjectId(a), Self::ObjectId(b)) => a.bytes().cmp(b.bytes()),
            (Self::String(a) | Self::Symbol(a), Self::String(b) | Self::Symbol(b)) => {
                match collator {
                    Some(collator) => collator.compare(a.as_str(), b.as_str()),
                    None => a.as_bytes().cmp(b.as_bytes()),
                }
            }
            (Self::Code(a), Self::Code(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Self::Document(a), Self::Document(b)) => compare_documents(a, b, collator),
            (Self::Array(a), Self::Array(b)) => {
                for (l, r) in a.iter().zip(b.iter()) {
                    match l.compare(r, collator) {
                        Ordering::Equal => {}
                        unequal => return unequal,
                    }
                }
                a.len().cmp(&b.len())
            }
            (Self::DbRef(a), Self::DbRef(b)) => a
                .ns()
                .len()
                .cmp(&b.ns().len())
                .then_with(|| a.ns().as_bytes().cmp(b.ns().as_bytes()))
                .then_with(|| a.oid().bytes().cmp(b.oid().bytes())),
            (Self::BinData(a), Self::BinData(b)) => a
                .bytes()
                .len()
                .cmp(&b.bytes().len())
                .then_with(|| a.subtype().cmp(&b.subtype()))
                .then_with(|| a.bytes().cmp(b.bytes())),
            (Self::Regex(a), Self::Regex(b)) => a.raw().cmp(b.raw()),
            (Self::CodeWithScope(a), Self::CodeWithScope(b)) => a
                .code()
                .as_bytes()
                .cmp(b.code().as_bytes())
                .then_with(|| compare_documents(a.scope(), b.scope(), None)),
            _ => unreachable!("values of one ordering class share a payload kind"),
        }
    }
}

/// Field-by-field: value class, then name, then value; a prefix sorts first.
fn compare_documents(
    left: &Document,
    right: &Document,
    collator: Option<&dyn StringComparator>,
) -> Ordering {
    for ((l_name, l_value), (r_name, r_value)) in left.iter().zip(right.iter()) {
        let ord = l_value
            .type_tag()
            .canonical_order()
            .cmp(&r_value.type_tag().canonical_order())
            .then_with(|| l_name.as_bytes().cmp(r_name.as_bytes()))
            .then_with(|| l_value.compare(r_value, collator));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

fn compare_numbers(left: &Value, right: &Value) -> Ordering {
    use Value::{Decimal, Double, Int, Long};
    match (left, right) {
        (Int(a), Int(b)) => a.cmp(b),
        (Int(a), Long(b)) => i64::from(*a).cmp(b),
        (Long(a), Int(b)) => a.cmp(&i64::from(*b)),
        (Long(a), Long(b)) => a.cmp(b),
        (Int(a), Double(b)) => compare_doubles(f64::from(*a), *b),
        (Double(a), Int(b)) => compare_doubles(*a, f64::from(*b)),
        (Double(a), Double(b)) => compare_doubles(*a, *b),
        (Long(a), Double(b)) => compare_long_to_double(*a, *b),
        (Double(a), Long(b)) => compare_long_to_double(*b, *a).reverse(),
        (Decimal(a), Decimal(b)) => a.compare(b),
        (Decimal(a), Int(b)) => a.compare(&Decimal128::from_i32(*b)),
        (Decimal(a), Long(b)) => a.compare(&Decimal128::from_i64(*b)),
        (Decimal(a), Double(b)) => a.compare(&Decimal128::from_f64_digits(*b, 34)),
        (Int(_) | Long(_) | Double(_), Decimal(_)) => compare_numbers(right, left).reverse(),
        _ => unreachable!("compare_numbers called with a non-numeric operand"),
    }
}

/// IEEE comparison except that NaN equals NaN and sorts below all numbers.
fn compare_doubles(left: f64, right: f64) -> Ordering {
    match left.partial_cmp(&right) {
        Some(ord) => ord,
        None => match (left.is_nan(), right.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            _ => Ordering::Greater,
        },
    }
}

/// Exact comparison: no cast of the long to a double.
#[allow(clippy::cast_possible_truncation)]
fn compare_long_to_double(long: i64, double: f64) -> Ordering {
    if double.is_nan() {
        return Ordering::Greater;
    }
    if double >= TWO_POW_63 {
        return Ordering::Less;
    }
    if double < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = double.trunc();
    long.cmp(&(whole as i64)).then_with(|| {
        let fraction = double - whole;
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, None) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other, None)
    }
}

/// Comparison and hashing bundle for one string collation.
///
/// Containers keyed by values under a collation (hash tables, sorters) should
/// use one comparator for both operations so equal values land in one bucket.
#[derive(Clone, Copy, Default)]
pub struct ValueComparator<'a> {
    collator: Option<&'a dyn StringComparator>,
}

impl<'a> ValueComparator<'a> {
    /// Creates a comparator; `None` compares strings bytewise.
    #[must_use]
    pub const fn new(collator: Option<&'a dyn StringComparator>) -> Self {
        Self { collator }
    }

    /// Returns the collator, if any.
    #[must_use]
    pub const fn collator(&self) -> Option<&'a dyn StringComparator> {
        self.collator
    }

    /// Three-way comparison.
    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        left.compare(right, self.collator)
    }

    /// Equality under this comparator.
    #[must_use]
    pub fn equal(&self, left: &Value, right: &Value) -> bool {
        self.compare(left, right) == Ordering::Equal
    }

    /// Hash consistent with [`compare`](Self::compare).
    #[must_use]
    pub fn hash(&self, value: &Value) -> u64 {
        let mut seed = 0;
        value.hash_combine(&mut seed, self.collator);
        seed
    }

    /// Stable sort; equal values keep their relative order.
    pub fn sort(&self, values: &mut [Value]) {
        values.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Debug for ValueComparator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueComparator")
            .field("collated", &self.collator.is_some())
            .finish()
    }
}
