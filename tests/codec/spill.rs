//! Integration tests for the spill codec
//!
//! Tests exact round trips across every value kind, nesting at the depth
//! limit, streams of many values, and corrupt input.

use bson::doc;
use docvalue_codec::{SorterSerializable, SpillConfig, SpillReader, SpillWriter, document_from_bson};
use docvalue_foundation::{
    Date, Decimal128, Document, ErrorKind, MAX_DEPTH, ObjectId, Timestamp, TypeTag, Value,
};

fn encode(value: &Value) -> Vec<u8> {
    let mut writer = SpillWriter::new();
    value.serialize_for_sorter(&mut writer).unwrap();
    writer.into_bytes().to_vec()
}

fn decode(bytes: &[u8]) -> Value {
    let mut reader = SpillReader::new(bytes);
    let value = Value::deserialize_for_sorter(&mut reader, &SpillConfig::default()).unwrap();
    assert!(reader.is_empty(), "trailing bytes after {value:?}");
    value
}

fn assert_exact_round_trip(value: &Value) {
    let bytes = encode(value);
    let back = decode(&bytes);
    assert_eq!(back.type_tag(), value.type_tag(), "{value:?}");
    assert_eq!(back.compare(value, None), std::cmp::Ordering::Equal, "{value:?}");
    assert_eq!(encode(&back), bytes, "{value:?}");
}

/// Single-field documents named `d`, `levels` deep, around an int.
fn forged_documents(levels: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    for _ in 0..levels {
        bytes.extend_from_slice(&[3, 1, 0, 0, 0, b'd', 0]);
    }
    bytes.extend_from_slice(&[16, 1, 0, 0, 0]);
    bytes
}

/// Code `f` whose scope holds `s`, a chain of `scope_levels` documents.
fn forged_code_with_scope(scope_levels: usize) -> Vec<u8> {
    let mut bytes = vec![15, 1, 0, 0, 0, b'f', 1, 0, 0, 0, b's', 0];
    bytes.extend(forged_documents(scope_levels));
    bytes
}

fn decode_with_default(bytes: &[u8]) -> docvalue_foundation::Result<Value> {
    Value::deserialize_for_sorter(&mut SpillReader::new(bytes), &SpillConfig::default())
}

fn sample_values() -> Vec<Value> {
    let scope = Document::from_fields([("x", Value::Int(1))]).unwrap();
    vec![
        Value::Missing,
        Value::MinKey,
        Value::MaxKey,
        Value::Null,
        Value::Undefined,
        Value::Int(-7),
        Value::Long(i64::MIN),
        Value::Double(1.25),
        Value::Double(f64::NAN),
        Value::from("1.50".parse::<Decimal128>().unwrap()),
        Value::from("-0E+3".parse::<Decimal128>().unwrap()),
        Value::Bool(true),
        Value::Date(Date::from_millis(-86_400_000)),
        Value::Timestamp(Timestamp::new(u32::MAX, 1)),
        Value::ObjectId(ObjectId::from_bytes([0xfe; 12])),
        Value::from(""),
        Value::from("a string that is too long to be stored inline"),
        Value::symbol("sym"),
        Value::code("function() {}"),
        Value::binary(0x80, &[0, 1, 2, 0]),
        Value::regex("^x+$", "ims").unwrap(),
        Value::regex("", "").unwrap(),
        Value::db_ref("db.coll", ObjectId::from_bytes([3; 12])).unwrap(),
        Value::db_ref("", ObjectId::from_bytes([4; 12])).unwrap(),
        Value::code_with_scope("return x", scope).unwrap(),
        Value::array(vec![]).unwrap(),
        Value::Document(Document::new()),
    ]
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn every_kind_round_trips_exactly() {
    for value in sample_values() {
        assert_exact_round_trip(&value);
    }
}

#[test]
fn composites_round_trip_exactly() {
    let values = sample_values();
    let array = Value::array(values.clone()).unwrap();
    assert_exact_round_trip(&array);

    let fields: Vec<(String, Value)> = values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("f{i}"), v))
        .collect();
    assert_exact_round_trip(&Value::Document(Document::from_fields(fields).unwrap()));
}

#[test]
fn decimal_cohort_is_preserved() {
    let value = Value::from("1.50".parse::<Decimal128>().unwrap());
    let back = decode(&encode(&value));
    assert_eq!(back.as_decimal().unwrap().to_string(), "1.50");
}

#[test]
fn parsed_bson_round_trips() {
    let source = doc! {
        "name": "widget",
        "tags": ["a", "b"],
        "dims": { "w": 1.5, "h": 2i64 },
    };
    let value = Value::Document(document_from_bson(&source).unwrap());
    assert_exact_round_trip(&value);
}

#[test]
fn documents_serialize_without_a_tag() {
    let doc = Document::from_fields([("a", Value::Int(1))]).unwrap();
    let mut writer = SpillWriter::new();
    doc.serialize_for_sorter(&mut writer).unwrap();
    assert_eq!(writer.as_bytes(), [1, 0, 0, 0, b'a', 0, 16, 1, 0, 0, 0]);

    let mut reader = SpillReader::new(writer.as_bytes());
    let back = Document::deserialize_for_sorter(&mut reader, &SpillConfig::default()).unwrap();
    assert_eq!(back.get("a"), Some(&Value::Int(1)));
}

// =============================================================================
// Depth
// =============================================================================

#[test]
fn arrays_at_the_depth_limit_round_trip() {
    let mut value = Value::Int(1);
    for _ in 0..MAX_DEPTH {
        value = Value::array(vec![value]).unwrap();
    }
    assert_exact_round_trip(&value);
}

#[test]
fn documents_at_the_depth_limit_round_trip() {
    let mut value = Value::from("leaf");
    for _ in 0..MAX_DEPTH {
        value = Value::Document(Document::from_fields([("d", value)]).unwrap());
    }
    assert_eq!(value.depth(), MAX_DEPTH);
    assert_exact_round_trip(&value);
}

#[test]
fn code_with_scope_counts_toward_depth() {
    let mut scope = Document::new();
    for _ in 1..MAX_DEPTH - 1 {
        scope = Document::from_fields([("s", Value::Document(scope))]).unwrap();
    }
    let value = Value::code_with_scope("f", scope).unwrap();
    assert_eq!(value.depth(), MAX_DEPTH);
    assert_exact_round_trip(&value);

    let config = SpillConfig::default().with_max_depth(MAX_DEPTH - 1);
    let bytes = encode(&value);
    let err = Value::deserialize_for_sorter(&mut SpillReader::new(&bytes), &config).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DepthExceeded { .. }));
}

#[test]
fn forged_stream_past_the_limit_is_rejected() {
    // MAX_DEPTH + 1 single-element arrays around an int.
    let mut bytes = Vec::new();
    for _ in 0..=MAX_DEPTH {
        bytes.extend_from_slice(&[4, 1, 0, 0, 0]);
    }
    bytes.extend_from_slice(&[16, 0, 0, 0, 0]);
    let err = Value::deserialize_for_sorter(&mut SpillReader::new(&bytes), &SpillConfig::default())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DepthExceeded { limit } if limit == MAX_DEPTH));
    assert_eq!(err.code(), 15);
}

#[test]
fn forged_documents_at_and_past_the_limit() {
    let value = decode_with_default(&forged_documents(MAX_DEPTH)).unwrap();
    assert_eq!(value.depth(), MAX_DEPTH);

    let err = decode_with_default(&forged_documents(MAX_DEPTH + 1)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DepthExceeded { limit } if limit == MAX_DEPTH));
    let path = err.context.and_then(|c| c.path).unwrap();
    assert_eq!(path, vec!["d"; MAX_DEPTH].join("."));
}

#[test]
fn forged_code_with_scope_at_and_past_the_limit() {
    let value = decode_with_default(&forged_code_with_scope(MAX_DEPTH - 2)).unwrap();
    assert_eq!(value.type_tag(), TypeTag::CodeWithScope);
    assert_eq!(value.depth(), MAX_DEPTH);

    let err = decode_with_default(&forged_code_with_scope(MAX_DEPTH - 1)).unwrap_err();
    assert_eq!(err.code(), 15);
}

#[test]
fn depth_errors_name_array_positions() {
    // {a: [null, <201 levels>]}
    let mut bytes = vec![3, 1, 0, 0, 0, b'a', 0, 4, 2, 0, 0, 0, 10];
    for _ in 0..MAX_DEPTH - 1 {
        bytes.extend_from_slice(&[4, 1, 0, 0, 0]);
    }
    bytes.extend_from_slice(&[16, 1, 0, 0, 0]);
    let err = decode_with_default(&bytes).unwrap_err();
    let path = err.context.and_then(|c| c.path).unwrap();
    assert!(path.starts_with("a.1.0.0"), "{path}");
    assert_eq!(path.split('.').count(), MAX_DEPTH);
}

#[test]
fn deepest_values_decode_on_a_small_stack() {
    let bytes = forged_documents(MAX_DEPTH);
    let depth = std::thread::Builder::new()
        .stack_size(512 * 1024)
        .spawn(move || decode_with_default(&bytes).map(|value| value.depth()))
        .unwrap()
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(depth, MAX_DEPTH);
}

// =============================================================================
// Streams
// =============================================================================

#[test]
fn many_values_share_one_stream() {
    let values = sample_values();
    let mut writer = SpillWriter::new();
    for v in &values {
        v.serialize_for_sorter(&mut writer).unwrap();
    }
    let bytes = writer.into_bytes();

    let mut reader = SpillReader::new(&bytes);
    let config = SpillConfig::default();
    for expected in &values {
        let got = Value::deserialize_for_sorter(&mut reader, &config).unwrap();
        assert_eq!(got.type_tag(), expected.type_tag());
    }
    assert!(reader.is_empty());
}

#[test]
fn missing_decodes_as_missing() {
    let value = decode(&encode(&Value::Missing));
    assert_eq!(value.type_tag(), TypeTag::Missing);
}

// =============================================================================
// Corrupt Input
// =============================================================================

#[test]
fn every_truncation_is_an_error() {
    let value = Value::array(sample_values()).unwrap();
    let bytes = encode(&value);
    for cut in 0..bytes.len() {
        let result =
            Value::deserialize_for_sorter(&mut SpillReader::new(&bytes[..cut]), &SpillConfig::default());
        assert!(result.is_err(), "prefix of {cut} bytes decoded");
    }
}

#[test]
fn corrupt_streams_report_offsets() {
    // Array of two: an int, then an unknown tag.
    let bytes = [4, 2, 0, 0, 0, 16, 1, 0, 0, 0, 99];
    let err = Value::deserialize_for_sorter(&mut SpillReader::new(&bytes), &SpillConfig::default())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SpillUnknownTag(99)));
    assert_eq!(err.context.and_then(|c| c.offset), Some(10));
}
