//! Recursive evaluation of a [`Schema`] against a value.
//!
//! Checks run in a fixed order per node: null handling, type (after any
//! coercion), enum, min, max, pattern, then children. Object fields are
//! visited in declaration order and unknown keys only after every declared
//! field passed, so the reported failure is always the first one a reader
//! scanning the schema top to bottom would hit.
use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Bound, Kind, Rule, Schema, ValidationError};
use crate::coerce::coerce;
use crate::path::{Path, Segment};
use crate::tag::TypeTag;

type Trail = Vec<Segment>;

impl Schema {
    pub(super) fn check<'v>(&self, value: &'v Value) -> Result<Cow<'v, Value>, ValidationError> {
        let mut trail = Trail::new();
        self.run(value, &mut trail)
    }

    fn run<'v>(&self, value: &'v Value, trail: &mut Trail) -> Result<Cow<'v, Value>, ValidationError> {
        if value.is_null() && self.rules.nullable {
            return Ok(match &self.rules.default {
                Some(default) => Cow::Owned(Value::clone(default)),
                None => Cow::Borrowed(value),
            });
        }
        if let Kind::Literal(example) = &self.kind {
            match_literal(example, value, trail)?;
            return Ok(Cow::Borrowed(value));
        }

        let value = self.admit(value, trail)?;
        self.check_enum(&value, trail)?;
        if let Some(bound) = self.rules.min {
            check_bound(&value, bound, Side::Min, trail)?;
        }
        if let Some(bound) = self.rules.max {
            check_bound(&value, bound, Side::Max, trail)?;
        }
        if let (Kind::String { pattern: Some(re) }, Some(text)) = (&self.kind, value.as_str()) {
            if !re.is_match(text) {
                return Err(fail(trail, Rule::Pattern, format!("expected {text:?} to match /{re}/")));
            }
        }

        let rebuilt = match (&self.kind, &*value) {
            (Kind::Object { shape, additional }, Value::Object(map)) => {
                check_object(shape, *additional, map, trail)?
            }
            (Kind::Array { element }, Value::Array(items)) => check_array(element, items, trail)?,
            _ => None,
        };
        Ok(match rebuilt {
            Some(replacement) => Cow::Owned(replacement),
            None => value,
        })
    }

    /// Type check, coercing first when asked to. Integers always widen into
    /// float nodes.
    fn admit<'v>(&self, value: &'v Value, trail: &Trail) -> Result<Cow<'v, Value>, ValidationError> {
        let Some(expected) = self.kind.tag() else {
            return Ok(Cow::Borrowed(value));
        };
        let found = TypeTag::of(value);
        if found == expected {
            return Ok(Cow::Borrowed(value));
        }
        let widens = expected == TypeTag::Float && found == TypeTag::Integer;
        if self.rules.coerce || widens {
            if let Some(converted) = coerce(value, expected) {
                return Ok(converted);
            }
        }
        Err(fail(trail, Rule::Type, format!("expected {expected}, found {found}")))
    }

    fn check_enum(&self, value: &Value, trail: &Trail) -> Result<(), ValidationError> {
        let Some(allowed) = &self.rules.allowed else {
            return Ok(());
        };
        if allowed.iter().any(|candidate| same(candidate, value)) {
            return Ok(());
        }
        let listed = allowed.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
        Err(fail(trail, Rule::Enum, format!("expected one of [{listed}], found {value}")))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BOUNDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy)]
enum Side {
    Min,
    Max,
}

/// Length for strings (in characters) and arrays, magnitude for numbers.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn check_bound(value: &Value, bound: Bound, side: Side, trail: &Trail) -> Result<(), ValidationError> {
    let Some(measured) = measure(value) else {
        return Ok(());
    };
    let Bound { limit, inclusive } = bound;
    let (ok, rule, relation) = match (side, inclusive) {
        (Side::Min, true) => (measured >= limit, Rule::Min, "greater than or equal to"),
        (Side::Min, false) => (measured > limit, Rule::Min, "greater than"),
        (Side::Max, true) => (measured <= limit, Rule::Max, "less than or equal to"),
        (Side::Max, false) => (measured < limit, Rule::Max, "less than"),
    };
    if ok {
        return Ok(());
    }
    Err(fail(trail, rule, format!("expected {measured} to be {relation} {limit}")))
}

// ————————————————————————————————————————————————————————————————————————————
// CONTAINERS
// ————————————————————————————————————————————————————————————————————————————

/// `Some` only when a field was coerced or defaulted and the mapping has to
/// be rebuilt.
fn check_object(
    shape: &IndexMap<String, Schema>,
    additional: bool,
    map: &Map<String, Value>,
    trail: &mut Trail,
) -> Result<Option<Value>, ValidationError> {
    let mut patches = Vec::new();
    for (key, field) in shape {
        match map.get(key) {
            Some(child) => {
                let checked = nested(trail, Segment::Key(key.clone()), |trail| field.run(child, trail))?;
                if let Cow::Owned(replacement) = checked {
                    patches.push((key.clone(), replacement));
                }
            }
            None if field.rules.optional => {
                if let Some(default) = &field.rules.default {
                    patches.push((key.clone(), Value::clone(default)));
                }
            }
            None => {
                return Err(nested(trail, Segment::Key(key.clone()), |trail| {
                    fail(trail, Rule::Required, format!("missing required field `{key}`"))
                }));
            }
        }
    }
    if !additional {
        if let Some(extra) = map.keys().find(|key| !shape.contains_key(*key)) {
            return Err(nested(trail, Segment::Key(extra.clone()), |trail| {
                fail(trail, Rule::AdditionalProperties, format!("unexpected key `{extra}`"))
            }));
        }
    }
    if patches.is_empty() {
        return Ok(None);
    }
    let mut rebuilt = map.clone();
    for (key, value) in patches {
        rebuilt.insert(key, value);
    }
    Ok(Some(Value::Object(rebuilt)))
}

fn check_array(element: &Schema, items: &[Value], trail: &mut Trail) -> Result<Option<Value>, ValidationError> {
    let mut rebuilt: Option<Vec<Value>> = None;
    for (i, item) in items.iter().enumerate() {
        let checked = nested(trail, Segment::Index(i), |trail| element.run(item, trail))?;
        match checked {
            Cow::Owned(replacement) => {
                rebuilt.get_or_insert_with(|| items[..i].to_vec()).push(replacement);
            }
            Cow::Borrowed(original) => {
                if let Some(out) = &mut rebuilt {
                    out.push(original.clone());
                }
            }
        }
    }
    Ok(rebuilt.map(Value::Array))
}

// ————————————————————————————————————————————————————————————————————————————
// LITERALS
// ————————————————————————————————————————————————————————————————————————————

fn match_literal(example: &Value, value: &Value, trail: &mut Trail) -> Result<(), ValidationError> {
    match (example, value) {
        (Value::Object(want), Value::Object(got)) => {
            for (key, expected) in want {
                let segment = Segment::Key(key.clone());
                match got.get(key) {
                    Some(actual) => nested(trail, segment, |trail| match_literal(expected, actual, trail))?,
                    None => {
                        return Err(nested(trail, segment, |trail| {
                            fail(trail, Rule::Required, format!("missing required field `{key}`"))
                        }));
                    }
                }
            }
            match got.keys().find(|key| !want.contains_key(*key)) {
                Some(extra) => Err(nested(trail, Segment::Key(extra.clone()), |trail| {
                    fail(trail, Rule::AdditionalProperties, format!("unexpected key `{extra}`"))
                })),
                None => Ok(()),
            }
        }
        (Value::Array(want), Value::Array(got)) => {
            if want.len() != got.len() {
                let message = format!("expected {} elements, found {}", want.len(), got.len());
                return Err(fail(trail, Rule::Literal, message));
            }
            for (i, (expected, actual)) in want.iter().zip(got).enumerate() {
                nested(trail, Segment::Index(i), |trail| match_literal(expected, actual, trail))?;
            }
            Ok(())
        }
        _ => {
            let (want, got) = (TypeTag::of(example), TypeTag::of(value));
            if want.is_container() || got.is_container() {
                return Err(fail(trail, Rule::Type, format!("expected {want}, found {got}")));
            }
            if same(example, value) {
                Ok(())
            } else {
                Err(fail(trail, Rule::Literal, format!("expected {example}, found {value}")))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Equality with `1 == 1.0`.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn nested<T>(trail: &mut Trail, segment: Segment, f: impl FnOnce(&mut Trail) -> T) -> T {
    trail.push(segment);
    let out = f(trail);
    trail.pop();
    out
}

fn fail(trail: &Trail, rule: Rule, message: String) -> ValidationError {
    let path = Path::from_segments(trail.clone()).to_string();
    tracing::debug!(%path, %rule, %message, "validation failed");
    ValidationError::new(path, rule, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_across_representations() {
        assert!(same(&json!(1), &json!(1.0)));
        assert!(same(&json!(2.5), &json!(2.5)));
        assert!(!same(&json!(1), &json!(1.5)));
        assert!(!same(&json!("1"), &json!(1)));
    }

    #[test]
    fn untouched_values_are_borrowed() {
        let data = json!({"a": [1, 2], "b": "x"});
        let schema = Schema::object([
            ("a", Schema::array(Schema::integer())),
            ("b", Schema::string()),
        ]);
        assert!(matches!(schema.check(&data), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn only_coerced_elements_force_a_rebuild() {
        let data = json!([1, "2", 3]);
        let out = Schema::array(Schema::integer().coerce()).check(&data).unwrap();
        assert!(matches!(out, Cow::Owned(_)));
        assert_eq!(*out, json!([1, 2, 3]));
    }

    #[test]
    fn nested_trail_unwinds_after_failure() {
        let mut trail = vec![Segment::Key("a".into())];
        let result = nested(&mut trail, Segment::Index(3), |trail| {
            Err::<(), _>(fail(trail, Rule::Type, "boom".into()))
        });
        assert_eq!(result.unwrap_err().path(), "a[3]");
        assert_eq!(trail, vec![Segment::Key("a".into())]);
    }

    #[test]
    fn measures_ignore_unsized_kinds() {
        assert_eq!(measure(&json!("héllo")), Some(5.0));
        assert_eq!(measure(&json!([1, 2])), Some(2.0));
        assert_eq!(measure(&json!(true)), None);
        assert_eq!(measure(&json!({"a": 1})), None);
    }

    #[test]
    fn bound_messages() {
        let trail = Trail::new();
        let inclusive = Bound { limit: 5.0, inclusive: true };
        let err = check_bound(&json!(4), inclusive, Side::Min, &trail).unwrap_err();
        assert_eq!(err.message(), "expected 4 to be greater than or equal to 5");
        let strict = Bound { limit: 2.0, inclusive: false };
        let err = check_bound(&json!([1, 2]), strict, Side::Max, &trail).unwrap_err();
        assert_eq!(err.message(), "expected 2 to be less than 2");
    }
}
