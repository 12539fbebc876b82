//! Tag-to-tag conversion matrix shared by the accessors and the schema engine.
//!
//! A missing entry and an entry that rejects the particular input look the
//! same to callers: both come back as `None`.
use std::borrow::Cow;

use serde_json::{Number, Value};

use crate::tag::TypeTag;

type Conversion = fn(&Value) -> Option<Value>;

const MATRIX: &[(TypeTag, TypeTag, Conversion)] = &[
    (TypeTag::Integer, TypeTag::Float, integer_to_float),
    (TypeTag::Float, TypeTag::Integer, float_to_integer),
    (TypeTag::Integer, TypeTag::String, number_to_string),
    (TypeTag::Float, TypeTag::String, number_to_string),
    (TypeTag::String, TypeTag::Integer, string_to_integer),
    (TypeTag::String, TypeTag::Float, string_to_float),
    (TypeTag::Boolean, TypeTag::Integer, boolean_to_integer),
    (TypeTag::Integer, TypeTag::Boolean, integer_to_boolean),
    (TypeTag::Boolean, TypeTag::String, boolean_to_string),
    (TypeTag::String, TypeTag::Boolean, string_to_boolean),
];

const TRUTHY: [&str; 4] = ["true", "1", "yes", "y"];
const FALSY: [&str; 4] = ["false", "0", "no", "n"];

pub fn conversion(from: TypeTag, to: TypeTag) -> Option<Conversion> {
    MATRIX
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, conv)| *conv)
}

/// Converts `value` to `to`. A value already carrying the tag is borrowed
/// as-is; containers never convert into anything else.
pub fn coerce(value: &Value, to: TypeTag) -> Option<Cow<'_, Value>> {
    let from = TypeTag::of(value);
    if from == to {
        return Some(Cow::Borrowed(value));
    }
    let conv = conversion(from, to)?;
    conv(value).map(Cow::Owned)
}

pub fn can_coerce(value: &Value, to: TypeTag) -> bool {
    coerce(value, to).is_some()
}

fn integer_to_float(value: &Value) -> Option<Value> {
    value.as_f64().and_then(Number::from_f64).map(Value::Number)
}

fn float_to_integer(value: &Value) -> Option<Value> {
    let f = value.as_f64()?.trunc();
    if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(Value::from(f as i64))
}

fn number_to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::String(n.to_string())),
        _ => None,
    }
}

fn string_to_integer(value: &Value) -> Option<Value> {
    value.as_str()?.trim().parse::<i64>().ok().map(Value::from)
}

fn string_to_float(value: &Value) -> Option<Value> {
    let f = value.as_str()?.trim().parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}

fn boolean_to_integer(value: &Value) -> Option<Value> {
    value.as_bool().map(|b| Value::from(i64::from(b)))
}

fn integer_to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Bool(n.as_i64().map_or(true, |i| i != 0))),
        _ => None,
    }
}

fn boolean_to_string(value: &Value) -> Option<Value> {
    value.as_bool().map(|b| Value::String(b.to_string()))
}

fn string_to_boolean(value: &Value) -> Option<Value> {
    let s = value.as_str()?.trim().to_ascii_lowercase();
    if TRUTHY.contains(&s.as_str()) {
        Some(Value::Bool(true))
    } else if FALSY.contains(&s.as_str()) {
        Some(Value::Bool(false))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn owned(value: Value, to: TypeTag) -> Option<Value> {
        coerce(&value, to).map(Cow::into_owned)
    }

    #[test]
    fn identity_borrows() {
        let v = json!({"a": 1});
        assert!(matches!(coerce(&v, TypeTag::Mapping), Some(Cow::Borrowed(_))));
        let n = json!(3);
        assert!(matches!(coerce(&n, TypeTag::Integer), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn numbers_widen_and_narrow() {
        assert_eq!(owned(json!(2), TypeTag::Float), Some(json!(2.0)));
        assert_eq!(owned(json!(2.9), TypeTag::Integer), Some(json!(2)));
        assert_eq!(owned(json!(-2.9), TypeTag::Integer), Some(json!(-2)));
        assert_eq!(owned(json!(1e300), TypeTag::Integer), None);
        assert_eq!(owned(json!(u64::MAX), TypeTag::Integer), None);
    }

    #[test]
    fn strings_parse_or_fail() {
        assert_eq!(owned(json!("5"), TypeTag::Integer), Some(json!(5)));
        assert_eq!(owned(json!(" 42 "), TypeTag::Integer), Some(json!(42)));
        assert_eq!(owned(json!("5.5"), TypeTag::Integer), None);
        assert_eq!(owned(json!("5.5"), TypeTag::Float), Some(json!(5.5)));
        assert_eq!(owned(json!("18446744073709551615"), TypeTag::Integer), None);
        assert_eq!(owned(json!("abc"), TypeTag::Float), None);
        assert_eq!(owned(json!("NaN"), TypeTag::Float), None);
    }

    #[test]
    fn numbers_render_as_json() {
        assert_eq!(owned(json!(1), TypeTag::String), Some(json!("1")));
        assert_eq!(owned(json!(2.0), TypeTag::String), Some(json!("2.0")));
    }

    #[test]
    fn booleans_round_the_matrix() {
        assert_eq!(owned(json!(true), TypeTag::Integer), Some(json!(1)));
        assert_eq!(owned(json!(0), TypeTag::Boolean), Some(json!(false)));
        assert_eq!(owned(json!(-3), TypeTag::Boolean), Some(json!(true)));
        assert_eq!(owned(json!(false), TypeTag::String), Some(json!("false")));
        assert_eq!(owned(json!("Yes"), TypeTag::Boolean), Some(json!(true)));
        assert_eq!(owned(json!("n"), TypeTag::Boolean), Some(json!(false)));
        assert_eq!(owned(json!("maybe"), TypeTag::Boolean), None);
        assert_eq!(owned(json!(true), TypeTag::Float), None);
    }

    #[test]
    fn containers_only_match_themselves() {
        assert_eq!(owned(json!([1]), TypeTag::Mapping), None);
        assert_eq!(owned(json!({"a": 1}), TypeTag::Sequence), None);
        assert_eq!(owned(json!([1]), TypeTag::String), None);
        assert_eq!(owned(json!("[1]"), TypeTag::Sequence), None);
        assert_eq!(owned(json!(null), TypeTag::String), None);
        for tag in TypeTag::ALL {
            if tag.is_container() {
                continue;
            }
            assert!(conversion(TypeTag::Mapping, tag).is_none());
            assert!(conversion(TypeTag::Sequence, tag).is_none());
        }
    }
}
