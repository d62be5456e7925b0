//! Integration tests for canonical ordering
//!
//! Tests cross-kind ordering, numeric equivalence, composite comparison,
//! collation, and sorting.

use std::cmp::Ordering;

use docvalue_foundation::{
    Date, Decimal128, Document, ObjectId, StringComparator, Timestamp, Value, ValueComparator,
};

fn dec(text: &str) -> Value {
    Value::from(text.parse::<Decimal128>().unwrap())
}

fn doc<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Document(Document::from_fields(fields).unwrap())
}

/// Orders strings ignoring ASCII case.
struct CaseInsensitive;

impl StringComparator for CaseInsensitive {
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.to_ascii_lowercase().cmp(&right.to_ascii_lowercase())
    }

    fn comparison_key(&self, text: &str) -> Vec<u8> {
        text.to_ascii_lowercase().into_bytes()
    }
}

// =============================================================================
// Cross-Kind Order
// =============================================================================

#[test]
fn kinds_follow_canonical_order() {
    let ascending = [
        Value::MinKey,
        Value::Null,
        Value::Int(5),
        Value::from("a"),
        doc([]),
        Value::array(vec![]).unwrap(),
        Value::binary(0, b""),
        Value::ObjectId(ObjectId::from_bytes([0; 12])),
        Value::Bool(false),
        Value::Date(Date::from_millis(0)),
        Value::Timestamp(Timestamp::new(0, 0)),
        Value::regex("a", "").unwrap(),
        Value::db_ref("a.b", ObjectId::from_bytes([0; 12])).unwrap(),
        Value::code("x"),
        Value::code_with_scope("x", Document::new()).unwrap(),
        Value::MaxKey,
    ];
    for pair in ascending.windows(2) {
        assert_eq!(
            pair[0].compare(&pair[1], None),
            Ordering::Less,
            "{:?} < {:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn missing_and_undefined_share_a_class() {
    assert_eq!(Value::Missing.compare(&Value::Undefined, None), Ordering::Equal);
    assert_eq!(Value::Undefined.compare(&Value::Null, None), Ordering::Less);
    assert_eq!(Value::MinKey.compare(&Value::Missing, None), Ordering::Less);
}

#[test]
fn string_and_symbol_share_a_class() {
    assert_eq!(Value::from("abc").compare(&Value::symbol("abc"), None), Ordering::Equal);
    assert_eq!(Value::symbol("abd").compare(&Value::from("abc"), None), Ordering::Greater);
}

#[test]
fn dates_and_timestamps_do_not_mix() {
    let date = Value::Date(Date::from_millis(i64::MAX));
    let ts = Value::Timestamp(Timestamp::new(0, 0));
    assert_eq!(date.compare(&ts, None), Ordering::Less);
}

#[test]
fn negative_dates_sort_before_positive() {
    let before = Value::Date(Date::from_millis(-1));
    let after = Value::Date(Date::from_millis(1));
    assert!(before < after);
}

// =============================================================================
// Numbers
// =============================================================================

#[test]
fn numeric_representations_are_equivalent() {
    let ones = [Value::Int(1), Value::Long(1), Value::Double(1.0), dec("1"), dec("1.000")];
    for a in &ones {
        for b in &ones {
            assert_eq!(a.compare(b, None), Ordering::Equal, "{a:?} == {b:?}");
        }
    }
}

#[test]
fn long_versus_double_is_exact() {
    let big = Value::Long(i64::MAX);
    let rounded = Value::Double(9_223_372_036_854_775_808.0);
    assert_eq!(big.compare(&rounded, None), Ordering::Less);

    let near = Value::Long((1 << 53) + 1);
    assert_eq!(near.compare(&Value::Double(9_007_199_254_740_992.0), None), Ordering::Greater);
}

#[test]
fn nan_sorts_below_all_numbers() {
    let nan = Value::Double(f64::NAN);
    assert_eq!(nan.compare(&Value::Double(f64::NEG_INFINITY), None), Ordering::Less);
    assert_eq!(nan.compare(&dec("NaN"), None), Ordering::Equal);
    assert_eq!(nan.compare(&nan, None), Ordering::Equal);
    assert_eq!(Value::Int(i32::MIN).compare(&nan, None), Ordering::Greater);
}

#[test]
fn zeros_are_equal() {
    assert_eq!(Value::Double(-0.0).compare(&Value::Int(0), None), Ordering::Equal);
    assert_eq!(dec("-0E+10").compare(&Value::Long(0), None), Ordering::Equal);
}

#[test]
fn decimal_versus_double() {
    assert_eq!(dec("0.1").compare(&Value::Double(0.1), None), Ordering::Less);
    assert_eq!(dec("1.5").compare(&Value::Double(1.5), None), Ordering::Equal);
    assert_eq!(dec("1E+400").compare(&Value::Double(f64::MAX), None), Ordering::Greater);
    assert_eq!(dec("Infinity").compare(&Value::Double(f64::INFINITY), None), Ordering::Equal);
}

// =============================================================================
// Composites
// =============================================================================

#[test]
fn documents_compare_field_by_field() {
    let a = doc([("a", Value::Int(1)), ("b", Value::Int(2))]);
    let b = doc([("a", Value::Int(1)), ("b", Value::Int(3))]);
    assert!(a < b);

    let shorter = doc([("a", Value::Int(1))]);
    assert!(shorter < a);

    // Value class wins over the field name.
    let by_class = doc([("z", Value::Int(1))]);
    let by_name = doc([("a", Value::from("x"))]);
    assert!(by_class < by_name);
}

#[test]
fn documents_compare_numbers_across_representations() {
    let a = doc([("n", Value::Int(2))]);
    let b = doc([("n", Value::Double(2.0))]);
    assert_eq!(a, b);
}

#[test]
fn arrays_compare_elementwise_then_by_length() {
    let a = Value::array(vec![Value::Int(1), Value::Int(2)]).unwrap();
    let b = Value::array(vec![Value::Int(1), Value::Int(3)]).unwrap();
    let c = Value::array(vec![Value::Int(1)]).unwrap();
    assert!(a < b);
    assert!(c < a);
}

#[test]
fn binary_compares_length_first() {
    let short = Value::binary(9, &[0xff]);
    let long = Value::binary(0, &[0x00, 0x00]);
    assert!(short < long);
    let low_subtype = Value::binary(0, &[0xff]);
    assert!(low_subtype < short);
}

#[test]
fn regex_compares_pattern_then_flags() {
    let a = Value::regex("a", "i").unwrap();
    let b = Value::regex("a", "m").unwrap();
    let c = Value::regex("ab", "").unwrap();
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn code_with_scope_compares_code_then_scope() {
    let scope_a = Document::from_fields([("x", Value::Int(1))]).unwrap();
    let scope_b = Document::from_fields([("x", Value::Int(2))]).unwrap();
    let a = Value::code_with_scope("f", scope_a.clone()).unwrap();
    let b = Value::code_with_scope("f", scope_b).unwrap();
    let c = Value::code_with_scope("g", scope_a).unwrap();
    assert!(a < b);
    assert!(b < c);
}

// =============================================================================
// Collation
// =============================================================================

#[test]
fn collator_applies_to_strings_and_symbols() {
    let cmp = ValueComparator::new(Some(&CaseInsensitive));
    assert!(cmp.equal(&Value::from("ABC"), &Value::from("abc")));
    assert!(cmp.equal(&Value::symbol("ABC"), &Value::from("abc")));
    assert!(!ValueComparator::default().equal(&Value::from("ABC"), &Value::from("abc")));
}

#[test]
fn collator_reaches_nested_strings() {
    let cmp = ValueComparator::new(Some(&CaseInsensitive));
    let a = doc([("k", Value::array(vec![Value::from("X")]).unwrap())]);
    let b = doc([("k", Value::array(vec![Value::from("x")]).unwrap())]);
    assert!(cmp.equal(&a, &b));
}

#[test]
fn collator_does_not_apply_to_field_names() {
    let cmp = ValueComparator::new(Some(&CaseInsensitive));
    let a = doc([("K", Value::Int(1))]);
    let b = doc([("k", Value::Int(1))]);
    assert!(!cmp.equal(&a, &b));
}

// =============================================================================
// Sorting
// =============================================================================

#[test]
fn mixed_array_sorts_stably() {
    let mut values = vec![Value::Int(3), Value::from("2"), Value::Double(1.5), dec("1.5")];
    ValueComparator::default().sort(&mut values);
    assert!(matches!(values[0], Value::Double(d) if d == 1.5));
    assert!(matches!(values[1], Value::Decimal(_)));
    assert!(matches!(values[2], Value::Int(3)));
    assert_eq!(values[3].as_str(), Some("2"));
}

#[test]
fn ord_matches_compare() {
    let mut values = vec![Value::MaxKey, Value::Null, Value::from("s"), Value::Int(-1)];
    values.sort();
    assert_eq!(values, [Value::Null, Value::Int(-1), Value::from("s"), Value::MaxKey]);
}
