//! Integration tests for Error types
//!
//! Tests error construction, display, context, and stable codes.

use docvalue_foundation::{
    CoercionTarget, Decimal128, Error, ErrorContext, ErrorKind, MAX_DEPTH, TypeTag, Value,
};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_cannot_coerce() {
    let err = Error::cannot_coerce(TypeTag::Array, CoercionTarget::String);
    assert!(matches!(err.kind, ErrorKind::CannotCoerce { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("array"));
    assert!(msg.contains("String"));
}

#[test]
fn error_depth_exceeded() {
    let err = Error::depth_exceeded(MAX_DEPTH);
    assert!(matches!(err.kind, ErrorKind::DepthExceeded { limit: 200 }));
    assert!(format!("{err}").contains("200"));
}

#[test]
fn error_spill_truncated() {
    let err = Error::spill_truncated(8, 3);
    let msg = format!("{err}");
    assert!(msg.contains('8'));
    assert!(msg.contains('3'));
}

#[test]
fn error_invalid_decimal() {
    let err = "1.2.3".parse::<Decimal128>().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDecimal(_)));
    assert!(format!("{err}").contains("1.2.3"));
    assert!("".parse::<Decimal128>().is_err());
    assert!("1e".parse::<Decimal128>().is_err());
}

#[test]
fn error_out_of_range_names_the_value() {
    let err = Value::Double(1e10).coerce_to_int().unwrap_err();
    assert!(format!("{err}").contains("10000000000"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn error_with_context() {
    let err = Error::new(ErrorKind::SpillInvalidUtf8)
        .with_context(ErrorContext::new().with_path("a.b").with_offset(12));
    let ctx = err.context.as_ref().unwrap();
    assert_eq!(ctx.path.as_deref(), Some("a.b"));
    assert_eq!(ctx.offset, Some(12));
    assert_eq!(ctx.to_string(), "at a.b (offset 12)");
}

// =============================================================================
// Stable Codes
// =============================================================================

#[test]
fn error_codes_are_stable() {
    let cases = [
        (ErrorKind::IntOutOfRange("x".into()), 31108),
        (ErrorKind::LongOutOfRange("x".into()), 31109),
        (ErrorKind::DateFormat { millis: 0 }, 18537),
        (ErrorKind::DepthExceeded { limit: 1 }, 15),
        (ErrorKind::InvalidDecimal("x".into()), 9),
        (ErrorKind::InteriorNul { what: "name" }, 16411),
        (ErrorKind::SpillUnknownTag(99), 17261),
        (ErrorKind::SpillMissingTerminator, 17261),
        (ErrorKind::Document("x".into()), 22),
    ];
    for (kind, code) in cases {
        assert_eq!(kind.code(), code, "{kind:?}");
    }
}

#[test]
fn coercion_codes_follow_the_target() {
    let targets = [
        (CoercionTarget::Int, 16003),
        (CoercionTarget::Long, 16004),
        (CoercionTarget::Double, 16005),
        (CoercionTarget::Date, 16006),
        (CoercionTarget::String, 16007),
        (CoercionTarget::Decimal, 16008),
        (CoercionTarget::Timestamp, 16378),
    ];
    for (target, code) in targets {
        assert_eq!(Error::cannot_coerce(TypeTag::Null, target).code(), code);
    }
}
