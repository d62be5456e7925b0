//! Hashing consistent with [`Value::compare`]: values that compare equal
//! hash equal, under the same collator.

use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use xxhash_rust::xxh64::xxh64;

use crate::collator::StringComparator;
use crate::compare::ValueComparator;
use crate::decimal::Decimal128;
use crate::document::Document;
use crate::value::Value;

/// 64-bit golden ratio, the additive constant of the mixing step.
const GOLDEN_RATIO: u64 = 0x9e37_79b9_7f4a_7c15;

/// Largest double as a decimal. Decimals above it have no double image and
/// hash through their normalized bits instead.
static DOUBLE_MAX: LazyLock<Decimal128> =
    LazyLock::new(|| Decimal128::from_f64_digits(f64::MAX, 34));

/// Mixes `value` into `seed`.
pub fn mix(seed: &mut u64, value: u64) {
    *seed ^= value
        .wrapping_add(GOLDEN_RATIO)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Hashes a byte run.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

fn mix_double(seed: &mut u64, value: f64) {
    let canonical = if value.is_nan() {
        f64::NAN
    } else if value == 0.0 {
        0.0
    } else {
        value
    };
    mix(seed, canonical.to_bits());
}

fn beyond_double_range(decimal: &Decimal128) -> bool {
    !decimal.is_nan()
        && !decimal.is_infinite()
        && decimal.abs().compare(&DOUBLE_MAX).is_gt()
}

fn hash_document(doc: &Document, seed: &mut u64, collator: Option<&dyn StringComparator>) {
    for (name, value) in doc.iter() {
        mix(seed, hash_bytes(name.as_bytes()));
        value.hash_combine(seed, collator);
    }
}

impl Value {
    /// Mixes this value into `seed`.
    ///
    /// Numbers hash through their double image so every width agrees;
    /// strings and symbols hash through the collator's key when one is given.
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn hash_combine(&self, seed: &mut u64, collator: Option<&dyn StringComparator>) {
        mix(seed, i64::from(self.type_tag().canonical_order()) as u64);

        match self {
            Self::Missing | Self::Undefined | Self::Null | Self::MinKey | Self::MaxKey => {}
            Self::Bool(b) => mix(seed, u64::from(*b)),
            Self::Date(date) => mix(seed, date.millis() as u64),
            Self::Timestamp(ts) => mix(seed, ts.as_u64()),
            Self::Decimal(decimal) if beyond_double_range(decimal) => {
                let normalized = decimal.normalize();
                mix(seed, normalized.low());
                mix(seed, normalized.high());
            }
            Self::Int(n) => mix_double(seed, f64::from(*n)),
            Self::Long(n) => mix_double(seed, *n as f64),
            Self::Double(n) => mix_double(seed, *n),
            Self::Decimal(decimal) => mix_double(seed, decimal.to_f64()),
            Self::ObjectId(oid) => mix(seed, hash_bytes(oid.bytes())),
            Self::String(text) | Self::Symbol(text) => match collator {
                Some(collator) => collator.hash_combine(seed, text.as_str()),
                None => mix(seed, hash_bytes(text.as_bytes())),
            },
            Self::Code(text) => mix(seed, hash_bytes(text.as_bytes())),
            Self::Document(doc) => hash_document(doc, seed, collator),
            Self::Array(array) => {
                for value in array {
                    value.hash_combine(seed, collator);
                }
            }
            Self::DbRef(dbref) => {
                mix(seed, hash_bytes(dbref.ns().as_bytes()));
                mix(seed, hash_bytes(dbref.oid().bytes()));
            }
            Self::BinData(bin) => {
                mix(seed, hash_bytes(bin.bytes()));
                mix(seed, u64::from(bin.subtype()));
            }
            Self::Regex(re) => mix(seed, hash_bytes(re.raw())),
            Self::CodeWithScope(cws) => {
                mix(seed, hash_bytes(cws.code().as_bytes()));
                hash_document(cws.scope(), seed, None);
            }
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(ValueComparator::default().hash(self));
    }
}
