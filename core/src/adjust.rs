//! Value adjusters.
//!
//! An adjuster transforms a raw value before its condition is tested. Any
//! `Fn(Value) -> Result<Value, BoxError>` qualifies; a failure surfaces as
//! [`Error::InvalidAdjusting`](crate::Error::InvalidAdjusting) during
//! parsing. The functions here are stock coercions.
//!
//! # Example
//!
//! ```
//! use optargs_core::{adjust, Value};
//!
//! assert_eq!(adjust::to_float(Value::from("1")).unwrap(), Value::from(1.0));
//! assert!(adjust::to_float(Value::from("one")).is_err());
//! ```

use std::sync::Arc;

use crate::{BoxError, Value};

/// Shared adjuster, as stored in a schema. Built by
/// [`OptionSpec::adjuster`](crate::OptionSpec::adjuster).
pub type Adjuster = Arc<dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync>;

/// Coerces `Int`, `Float`, and numeric strings to `Float`.
pub fn to_float(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Float(n) => Ok(Value::Float(n)),
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("invalid value for Float: {s:?}").into()),
        other => Err(format!("can't convert {} into Float", other.kind()).into()),
    }
}

// -2^63 and 2^63, both exact as f64.
const I64_LOWER: f64 = i64::MIN as f64;
const I64_UPPER: f64 = -(i64::MIN as f64);

/// Coerces `Int`, integral `Float`s within `i64` range, and integer strings
/// to `Int`.
pub fn to_int(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Float(n) if n.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(&n) => {
            Ok(Value::Int(n as i64))
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("invalid value for Int: {s:?}").into()),
        other => Err(format!("can't convert {other} into Int").into()),
    }
}

/// Renders scalars as `Str`; strings pass through unchanged.
pub fn to_str(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Str(s) => Ok(Value::Str(s)),
        Value::Bool(b) => Ok(Value::Str(b.to_string())),
        Value::Int(n) => Ok(Value::Str(n.to_string())),
        Value::Float(n) => Ok(Value::Str(n.to_string())),
        other => Err(format!("can't convert {} into Str", other.kind()).into()),
    }
}

/// Coerces booleans, `0`/`1`, and `true/false/yes/no/1/0` strings to `Bool`.
pub fn to_bool(value: Value) -> Result<Value, BoxError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("invalid value for Bool: {s:?}").into()),
        },
        other => Err(format!("can't convert {other} into Bool").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(Value::from(" 2.5 ")).unwrap(), Value::Float(2.5));
        assert_eq!(to_float(Value::from(3)).unwrap(), Value::Float(3.0));
        let err = to_float(Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "can't convert Null into Float");
    }

    #[test]
    fn test_to_int_rejects_fractions() {
        assert_eq!(to_int(Value::from(4.0)).unwrap(), Value::Int(4));
        assert!(to_int(Value::from(4.5)).is_err());
        assert_eq!(to_int(Value::from("-12")).unwrap(), Value::Int(-12));
    }

    #[test]
    fn test_to_int_rejects_out_of_range_floats() {
        assert!(to_int(Value::Float(1e20)).is_err());
        assert!(to_int(Value::Float(-1e300)).is_err());
        assert!(to_int(Value::Float(9_223_372_036_854_775_808.0)).is_err());
        assert!(to_int(Value::Float(f64::INFINITY)).is_err());
        assert_eq!(
            to_int(Value::Float(-9_223_372_036_854_775_808.0)).unwrap(),
            Value::Int(i64::MIN)
        );
        let err = to_int(Value::Float(1e20)).unwrap_err();
        assert_eq!(err.to_string(), "can't convert 1e20 into Int");
    }

    #[test]
    fn test_to_str_and_to_bool() {
        assert_eq!(to_str(Value::from(7)).unwrap(), Value::from("7"));
        assert!(to_str(Value::from(vec![1])).is_err());
        assert_eq!(to_bool(Value::from("Yes")).unwrap(), Value::Bool(true));
        assert_eq!(to_bool(Value::from(0)).unwrap(), Value::Bool(false));
        assert!(to_bool(Value::from("maybe")).is_err());
    }
}
