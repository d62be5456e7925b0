//! Integration tests for Value construction and access
//!
//! Tests constructors, accessors, composite sharing, depth, and display.

use docvalue_foundation::{
    Array, BinData, Date, Decimal128, Document, INLINE_CAPACITY, MAX_DEPTH, ObjectId, Timestamp,
    TypeTag, Value,
};

fn nested_array(depth: usize) -> Value {
    let mut v = Value::Int(1);
    for _ in 0..depth {
        v = Value::array(vec![v]).unwrap();
    }
    v
}

// =============================================================================
// Scalar Construction
// =============================================================================

#[test]
fn value_default_is_missing() {
    let v = Value::default();
    assert!(v.missing());
    assert!(v.nullish());
    assert_eq!(v.type_tag(), TypeTag::Missing);
}

#[test]
fn value_null_and_undefined_are_nullish() {
    assert!(Value::Null.nullish());
    assert!(Value::Undefined.nullish());
    assert!(!Value::Null.missing());
    assert!(!Value::Int(0).nullish());
}

#[test]
fn value_numbers() {
    assert_eq!(Value::from(7).as_int(), Some(7));
    assert_eq!(Value::from(7i64).as_long(), Some(7));
    assert_eq!(Value::from(2.5).as_double(), Some(2.5));
    assert_eq!(Value::Int(7).as_long(), None);
    for v in [Value::Int(1), Value::Long(1), Value::Double(1.0), Value::from(Decimal128::from_i32(1))] {
        assert!(v.is_numeric());
    }
    assert!(!Value::from("1").is_numeric());
}

#[test]
fn create_int_or_long_picks_the_narrowest() {
    assert_eq!(Value::create_int_or_long(5).type_tag(), TypeTag::Int);
    assert_eq!(
        Value::create_int_or_long(i64::from(i32::MAX) + 1).type_tag(),
        TypeTag::Long
    );
    assert_eq!(
        Value::create_int_or_long(i64::from(i32::MIN)).type_tag(),
        TypeTag::Int
    );
}

#[test]
fn get_double_and_get_decimal_widen() {
    assert_eq!(Value::Int(3).get_double(), Some(3.0));
    assert_eq!(Value::Long(-4).get_double(), Some(-4.0));
    assert_eq!(Value::from("3").get_double(), None);
    let d = Value::Double(0.1).get_decimal().unwrap();
    assert_eq!(d.to_string(), "0.1000000000000000055511151231257827");
}

#[test]
fn value_strings_inline_and_shared() {
    let short = "a".repeat(INLINE_CAPACITY);
    let long = "b".repeat(INLINE_CAPACITY + 1);
    let s = Value::from(short.as_str());
    let l = Value::from(long.clone());
    assert_eq!(s.as_str(), Some(short.as_str()));
    assert_eq!(l.as_str(), Some(long.as_str()));
    assert_eq!(s.heap_size(), 0);
    assert!(l.heap_size() > long.len());
}

#[test]
fn string_kinds_are_distinct() {
    let s = Value::from("x");
    let sym = Value::symbol("x");
    let code = Value::code("x");
    assert_eq!(s.type_tag(), TypeTag::String);
    assert_eq!(sym.as_symbol(), Some("x"));
    assert_eq!(code.as_code(), Some("x"));
    assert_eq!(sym.as_str(), None);
}

#[test]
fn strings_may_contain_nul() {
    let v = Value::from("a\0b");
    assert_eq!(v.as_str().map(str::len), Some(3));
}

#[test]
fn binary_keeps_subtype() {
    let v = Value::binary(BinData::UUID, &[1, 2, 3]);
    let bin = v.as_binary().unwrap();
    assert_eq!(bin.subtype(), 4);
    assert_eq!(bin.bytes(), &[1, 2, 3]);
}

#[test]
fn regex_rejects_nul() {
    assert!(Value::regex("a\0", "").is_err());
    assert!(Value::regex("a", "i\0").is_err());
    let re = Value::regex("^ab", "i").unwrap();
    let cell = re.as_regex().unwrap();
    assert_eq!(cell.pattern(), "^ab");
    assert_eq!(cell.flags(), "i");
}

#[test]
fn timestamp_parts() {
    let ts = Timestamp::new(100, 7);
    assert_eq!(ts.secs(), 100);
    assert_eq!(ts.increment(), 7);
    assert_eq!(ts.as_u64(), (100u64 << 32) | 7);
    assert_eq!(Value::from(ts).as_timestamp(), Some(ts));
}

#[test]
fn object_id_creation_date() {
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&1_000u32.to_be_bytes());
    let oid = ObjectId::from_bytes(bytes);
    assert_eq!(oid.creation_date(), Date::from_millis(1_000_000));
    assert_eq!(oid.to_string(), "000003e8".to_string() + &"0".repeat(16));
}

#[test]
fn db_ref_and_code_with_scope() {
    let oid = ObjectId::from_bytes([9; 12]);
    let dbref = Value::db_ref("db.coll", oid).unwrap();
    assert_eq!(dbref.as_db_ref().map(|r| r.ns()), Some("db.coll"));
    assert!(Value::db_ref("db\0coll", oid).is_err());

    let scope = Document::from_fields([("x", Value::Int(1))]).unwrap();
    let cws = Value::code_with_scope("return x", scope).unwrap();
    let inner = cws.as_code_with_scope().unwrap();
    assert_eq!(inner.code(), "return x");
    assert_eq!(inner.scope().get("x"), Some(&Value::Int(1)));
    assert_eq!(cws.depth(), 2);
}

// =============================================================================
// Composites
// =============================================================================

#[test]
fn document_lookup_and_order() {
    let doc = Document::from_fields([
        ("b", Value::Int(1)),
        ("a", Value::from("x")),
        ("gone", Value::Missing),
    ])
    .unwrap();
    assert_eq!(doc.len(), 2);
    let names: Vec<&str> = doc.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["b", "a"]);

    let v = Value::Document(doc);
    assert_eq!(v.field("a"), Value::from("x"));
    assert!(v.field("gone").missing());
    assert!(v.field("zzz").missing());
    assert!(Value::Int(1).field("a").missing());
}

#[test]
fn document_rejects_nul_in_names() {
    assert!(Document::from_fields([("a\0b", Value::Int(1))]).is_err());
}

#[test]
fn array_drops_missing_slots() {
    let v = Value::array(vec![Value::Int(1), Value::Missing, Value::Int(2)]).unwrap();
    let array = v.as_array().unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(v.index(1), Value::Int(2));
    assert!(v.index(2).missing());
}

#[test]
fn clones_share_composites() {
    let doc = Document::from_fields([("a", Value::from("x".repeat(100)))]).unwrap();
    let copy = doc.clone();
    assert!(doc.ptr_eq(&copy));

    let array = Array::new(vec![Value::Int(1)]).unwrap();
    assert!(array.ptr_eq(&array.clone()));
}

#[test]
fn values_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<Document>();
}

#[test]
fn values_can_be_read_across_threads() {
    let v = Value::array((0..100).map(Value::Int).collect()).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let v = v.clone();
            s.spawn(move || assert_eq!(v.as_array().map(Array::len), Some(100)));
        }
    });
}

// =============================================================================
// Depth
// =============================================================================

#[test]
fn scalar_depth_is_zero() {
    assert_eq!(Value::Int(1).depth(), 0);
    assert_eq!(Value::array(vec![]).unwrap().depth(), 1);
    assert_eq!(nested_array(3).depth(), 3);
}

#[test]
fn nesting_at_the_limit_is_accepted() {
    assert_eq!(nested_array(MAX_DEPTH).depth(), MAX_DEPTH);
}

#[test]
fn nesting_past_the_limit_is_rejected() {
    let at_limit = nested_array(MAX_DEPTH);
    let err = Value::array(vec![at_limit.clone()]).unwrap_err();
    assert_eq!(err.code(), 15);
    assert!(Document::from_fields([("a", at_limit)]).is_err());
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn debug_output() {
    let doc = Document::from_fields([
        ("a", Value::Int(1)),
        ("b", Value::array(vec![Value::from("x"), Value::Null]).unwrap()),
    ])
    .unwrap();
    assert_eq!(format!("{:?}", Value::Document(doc)), "{a: 1, b: [\"x\", null]}");
    assert_eq!(Value::symbol("s").to_string(), "Symbol(\"s\")");
    assert_eq!(Value::Missing.to_string(), "MISSING");
    assert_eq!(Value::from(Timestamp::new(1, 2)).to_string(), "Timestamp(1, 2)");
}
