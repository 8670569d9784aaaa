//! Type casting
//!
//! Coercion policy for `type:` directives:
//! - float to integer truncates toward zero; NaN, infinities and out-of-range values fail
//! - integer to a narrower integer fails when out of range, never wraps
//! - float32 rounds to the nearest representable value
//! - bool is `value != 0`; bool to numeric is 0 or 1
//! - strings, bytes, sequences, structs and null never cast

use contracts::{FieldValue, Number, SampleError};

use crate::types::TargetType;

/// Numeric view of a scalar source value
#[derive(Debug, Clone, Copy)]
enum Scalar {
    Integer(i128),
    Float(f64),
}

fn scalar_of(path: &str, target: TargetType, value: &FieldValue) -> Result<Scalar, SampleError> {
    match value {
        FieldValue::Int(v) => Ok(Scalar::Integer(i128::from(*v))),
        FieldValue::UInt(v) => Ok(Scalar::Integer(i128::from(*v))),
        FieldValue::Bool(b) => Ok(Scalar::Integer(i128::from(*b))),
        FieldValue::Float(f) => Ok(Scalar::Float(*f)),
        other => Err(SampleError::cast(
            path,
            target.name(),
            format!("{} value is not numeric", other.type_name()),
        )),
    }
}

/// Cast a natively-typed scalar to `target`
///
/// # Errors
/// `SampleError::Cast` for non-scalar sources and values the target cannot hold.
pub fn cast_scalar(
    path: &str,
    value: &FieldValue,
    target: TargetType,
) -> Result<FieldValue, SampleError> {
    let fail = |reason: String| SampleError::cast(path, target.name(), reason);
    let scalar = scalar_of(path, target, value)?;

    match target {
        TargetType::Float64 => Ok(FieldValue::Float(match scalar {
            Scalar::Integer(i) => i as f64,
            Scalar::Float(f) => f,
        })),
        TargetType::Float32 => {
            let wide = match scalar {
                Scalar::Integer(i) => i as f64,
                Scalar::Float(f) => f,
            };
            let narrow = wide as f32;
            if wide.is_finite() && !narrow.is_finite() {
                return Err(fail(format!("{wide} is out of float32 range")));
            }
            Ok(FieldValue::Float(f64::from(narrow)))
        }
        TargetType::Bool => match scalar {
            Scalar::Integer(i) => Ok(FieldValue::Bool(i != 0)),
            Scalar::Float(f) if f.is_nan() => Err(fail("NaN has no truth value".to_string())),
            Scalar::Float(f) => Ok(FieldValue::Bool(f != 0.0)),
        },
        _ => {
            let integer = match scalar {
                Scalar::Integer(i) => i,
                Scalar::Float(f) => truncate(f)
                    .ok_or_else(|| fail(format!("{f} is not an integer-range value")))?,
            };
            narrow_integer(integer, target)
                .ok_or_else(|| fail(format!("{integer} is out of range")))
        }
    }
}

fn truncate(f: f64) -> Option<i128> {
    let t = f.trunc();
    (t.is_finite() && t.abs() < 2f64.powi(127)).then_some(t as i128)
}

fn narrow_integer(value: i128, target: TargetType) -> Option<FieldValue> {
    let signed = |v: Option<i64>| v.map(FieldValue::Int);
    let unsigned = |v: Option<u64>| v.map(FieldValue::UInt);
    match target {
        TargetType::Int8 => signed(i8::try_from(value).ok().map(i64::from)),
        TargetType::Int16 => signed(i16::try_from(value).ok().map(i64::from)),
        TargetType::Int32 => signed(i32::try_from(value).ok().map(i64::from)),
        TargetType::Int64 => signed(i64::try_from(value).ok()),
        TargetType::UInt8 => unsigned(u8::try_from(value).ok().map(u64::from)),
        TargetType::UInt16 => unsigned(u16::try_from(value).ok().map(u64::from)),
        TargetType::UInt32 => unsigned(u32::try_from(value).ok().map(u64::from)),
        TargetType::UInt64 => unsigned(u64::try_from(value).ok()),
        TargetType::Float32 | TargetType::Float64 | TargetType::Bool => None,
    }
}

/// Decode a little-endian fixed-width value
///
/// # Errors
/// `SampleError::Cast` when `data` is not exactly `target.size_bytes()` long.
pub fn decode_le(path: &str, data: &[u8], target: TargetType) -> Result<FieldValue, SampleError> {
    let wrong_width = || {
        SampleError::cast(
            path,
            target.name(),
            format!(
                "expected {} bytes, got {}",
                target.size_bytes(),
                data.len()
            ),
        )
    };

    macro_rules! le {
        ($ty:ty) => {
            <$ty>::from_le_bytes(data.try_into().map_err(|_| wrong_width())?)
        };
    }

    Ok(match target {
        TargetType::Int8 => FieldValue::Int(i64::from(le!(i8))),
        TargetType::Int16 => FieldValue::Int(i64::from(le!(i16))),
        TargetType::Int32 => FieldValue::Int(i64::from(le!(i32))),
        TargetType::Int64 => FieldValue::Int(le!(i64)),
        TargetType::UInt8 => FieldValue::UInt(u64::from(le!(u8))),
        TargetType::UInt16 => FieldValue::UInt(u64::from(le!(u16))),
        TargetType::UInt32 => FieldValue::UInt(u64::from(le!(u32))),
        TargetType::UInt64 => FieldValue::UInt(le!(u64)),
        TargetType::Float32 => FieldValue::Float(f64::from(le!(f32))),
        TargetType::Float64 => FieldValue::Float(le!(f64)),
        TargetType::Bool => FieldValue::Bool(le!(u8) != 0),
    })
}

/// Bind an extracted value to an evaluator variable
///
/// Unsigned values above `i64::MAX` are bound as floats.
///
/// # Errors
/// `SampleError::Cast` for values with no numeric meaning.
pub fn to_number(path: &str, value: &FieldValue) -> Result<Number, SampleError> {
    match value {
        FieldValue::Int(v) => Ok(Number::Int(*v)),
        FieldValue::UInt(v) => Ok(i64::try_from(*v)
            .map(Number::Int)
            .unwrap_or(Number::Float(*v as f64))),
        FieldValue::Float(f) => Ok(Number::Float(*f)),
        FieldValue::Bool(b) => Ok(Number::Int(i64::from(*b))),
        other => Err(SampleError::cast(
            path,
            "number",
            format!(
                "{} value cannot be used in an expression; add a type directive",
                other.type_name()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::SampleErrorKind;

    #[test]
    fn test_float_to_int_truncates_toward_zero() {
        assert_eq!(
            cast_scalar("v", &FieldValue::Float(2.9), TargetType::Int32).unwrap(),
            FieldValue::Int(2)
        );
        assert_eq!(
            cast_scalar("v", &FieldValue::Float(-2.9), TargetType::Int32).unwrap(),
            FieldValue::Int(-2)
        );
    }

    #[test]
    fn test_non_finite_float_to_int_fails() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = cast_scalar("v", &FieldValue::Float(f), TargetType::Int64).unwrap_err();
            assert_eq!(err.kind(), SampleErrorKind::Cast);
        }
    }

    #[test]
    fn test_narrowing_out_of_range_fails() {
        assert!(cast_scalar("v", &FieldValue::Int(300), TargetType::UInt8).is_err());
        assert!(cast_scalar("v", &FieldValue::Int(-1), TargetType::UInt64).is_err());
        assert!(cast_scalar("v", &FieldValue::Float(1e20), TargetType::Int64).is_err());
        assert!(cast_scalar("v", &FieldValue::UInt(u64::MAX), TargetType::Int64).is_err());
        assert_eq!(
            cast_scalar("v", &FieldValue::Int(255), TargetType::UInt8).unwrap(),
            FieldValue::UInt(255)
        );
    }

    #[test]
    fn test_float32_rounds() {
        let v = cast_scalar("v", &FieldValue::Float(0.1), TargetType::Float32).unwrap();
        assert_eq!(v, FieldValue::Float(f64::from(0.1f32)));
        assert!(cast_scalar("v", &FieldValue::Float(1e300), TargetType::Float32).is_err());
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(
            cast_scalar("v", &FieldValue::Int(5), TargetType::Bool).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            cast_scalar("v", &FieldValue::Float(0.0), TargetType::Bool).unwrap(),
            FieldValue::Bool(false)
        );
        assert_eq!(
            cast_scalar("v", &FieldValue::Bool(true), TargetType::Float64).unwrap(),
            FieldValue::Float(1.0)
        );
    }

    #[test]
    fn test_non_scalars_never_cast() {
        let sources = [
            FieldValue::Null,
            FieldValue::from("12"),
            FieldValue::Bytes(Bytes::from_static(&[1])),
            FieldValue::from(vec![FieldValue::Int(1)]),
            FieldValue::structure([("x", FieldValue::Int(1))]),
        ];
        for source in &sources {
            let err = cast_scalar("v", source, TargetType::Float64).unwrap_err();
            assert_eq!(err.kind(), SampleErrorKind::Cast);
        }
    }

    #[test]
    fn test_decode_le_float64_round_trip() {
        let value = 1234.5678_f64;
        let decoded = decode_le("data", &value.to_le_bytes(), TargetType::Float64).unwrap();
        assert_eq!(decoded, FieldValue::Float(value));
    }

    #[test]
    fn test_decode_le_integers() {
        assert_eq!(
            decode_le("d", &[0x34, 0x12], TargetType::UInt16).unwrap(),
            FieldValue::UInt(0x1234)
        );
        assert_eq!(
            decode_le("d", &[0xff, 0xff, 0xff, 0xff], TargetType::Int32).unwrap(),
            FieldValue::Int(-1)
        );
        assert_eq!(
            decode_le("d", &[0x02], TargetType::Bool).unwrap(),
            FieldValue::Bool(true)
        );
    }

    #[test]
    fn test_decode_le_wrong_width() {
        let err = decode_le("d", &[0, 0, 0], TargetType::UInt32).unwrap_err();
        assert_eq!(err.kind(), SampleErrorKind::Cast);
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number("v", &FieldValue::UInt(7)).unwrap(), Number::Int(7));
        assert_eq!(
            to_number("v", &FieldValue::UInt(u64::MAX)).unwrap(),
            Number::Float(u64::MAX as f64)
        );
        assert_eq!(to_number("v", &FieldValue::Bool(true)).unwrap(), Number::Int(1));
        let err = to_number("v", &FieldValue::Bytes(Bytes::from_static(&[1, 2]))).unwrap_err();
        assert_eq!(err.kind(), SampleErrorKind::Cast);
    }
}
